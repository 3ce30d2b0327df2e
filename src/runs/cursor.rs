use std::fs::File;

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::error::StorageError;
use crate::models::{Record, RecordLayout};
use crate::normalize::normalize_key;

struct Current {
    key: String,
    record: Record,
}

/// Forward-only scan over one sorted run, header skipped. Holds the
/// current unread record and its normalized key; once exhausted it never
/// yields again. The underlying file handle is released when the cursor
/// drops, on every exit path.
pub struct RunCursor {
    reader: Reader<File>,
    layout: RecordLayout,
    current: Option<Current>,
}

impl RunCursor {
    pub(crate) fn from_file(file: File, layout: RecordLayout) -> Result<Self, StorageError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let mut cursor = Self {
            reader,
            layout,
            current: None,
        };
        cursor.current = cursor.read_next()?;
        Ok(cursor)
    }

    /// Normalized key of the current record. Exhausted cursors return the
    /// empty string — a sentinel, not a valid data key; callers must check
    /// [`Self::is_exhausted`] first, since a data key may itself normalize
    /// to "".
    pub fn key(&self) -> &str {
        self.current.as_ref().map(|c| c.key.as_str()).unwrap_or("")
    }

    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }

    /// Yields the current record and moves to the next one, or `None`
    /// once the run is exhausted.
    pub fn advance(&mut self) -> Result<Option<Record>, StorageError> {
        let prev = self.current.take();
        if prev.is_some() {
            self.current = self.read_next()?;
        }
        Ok(prev.map(|c| c.record))
    }

    fn read_next(&mut self) -> Result<Option<Current>, StorageError> {
        let mut row = StringRecord::new();
        let more = self
            .reader
            .read_record(&mut row)
            .map_err(StorageError::Read)?;
        if !more {
            return Ok(None);
        }
        let fields: Vec<String> = row.iter().map(str::to_owned).collect();
        let record = Record::new(fields, self.layout).map_err(StorageError::MalformedRow)?;
        let key = normalize_key(record.join_key());
        Ok(Some(Current { key, record }))
    }
}
