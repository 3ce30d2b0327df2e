use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::error::SourceError;
use crate::models::{Record, RecordLayout};

/// Forward-only reader over one CSV relation. The header row is consumed
/// at open time; every subsequent row becomes a [`Record`]. Each relation
/// is read exactly once, in a single pass.
pub struct CsvSource {
    reader: Reader<File>,
    path: PathBuf,
    header: Vec<String>,
    layout: RecordLayout,
}

impl CsvSource {
    pub fn open(path: &Path, layout: RecordLayout) -> Result<Self, SourceError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| SourceError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;
        let header = reader
            .headers()
            .map_err(|e| SourceError::Read {
                path: path.to_path_buf(),
                source: e,
            })?
            .iter()
            .map(str::to_owned)
            .collect();
        Ok(Self {
            reader,
            path: path.to_path_buf(),
            header,
            layout,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Next data row, or `None` at end of input. Rows narrower than the
    /// layout abort the job.
    pub fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        let mut row = StringRecord::new();
        let more = self
            .reader
            .read_record(&mut row)
            .map_err(|e| SourceError::Read {
                path: self.path.clone(),
                source: e,
            })?;
        if !more {
            return Ok(None);
        }
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let fields: Vec<String> = row.iter().map(str::to_owned).collect();
        Record::new(fields, self.layout)
            .map(Some)
            .map_err(|e| SourceError::MalformedRow {
                path: self.path.clone(),
                line,
                source: e,
            })
    }
}
