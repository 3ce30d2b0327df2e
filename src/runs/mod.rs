//! Sorted on-disk runs produced by the external-sort phase.

mod cursor;
mod generator;

pub use cursor::RunCursor;
pub use generator::generate_runs;

use std::io::BufWriter;
use std::path::Path;

use csv::WriterBuilder;
use tempfile::{Builder, NamedTempFile};

use crate::error::StorageError;
use crate::models::{Record, RecordLayout};

/// One sorted partition of a relation, backed by a uniquely named
/// temporary file holding a header row plus the records in key order.
///
/// The backing file is removed when the `Run` drops, so a job that fails
/// partway still releases its scratch space.
pub struct Run {
    file: NamedTempFile,
    layout: RecordLayout,
    rows: usize,
}

impl Run {
    /// Persists `rows`, already sorted by normalized key, under `header`.
    pub(crate) fn create(
        tmp_dir: &Path,
        header: &[String],
        layout: RecordLayout,
        rows: &[Record],
    ) -> Result<Self, StorageError> {
        let file = Builder::new()
            .prefix("join-run-")
            .suffix(".csv")
            .tempfile_in(tmp_dir)
            .map_err(StorageError::Create)?;
        let mut w = WriterBuilder::new()
            .from_writer(BufWriter::with_capacity(512 * 1024, file.as_file()));
        w.write_record(header).map_err(StorageError::Write)?;
        for rec in rows {
            w.write_record(rec.fields()).map_err(StorageError::Write)?;
        }
        w.flush().map_err(StorageError::Flush)?;
        drop(w);
        Ok(Self {
            file,
            layout,
            rows: rows.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Independent sequential read handle over the run contents. Each run
    /// is read exactly once by exactly one cursor.
    pub fn open_cursor(&self) -> Result<RunCursor, StorageError> {
        let file = self.file.reopen().map_err(StorageError::Reopen)?;
        RunCursor::from_file(file, self.layout)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sorted_run;
    use super::*;

    #[test]
    fn run_file_is_deleted_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RecordLayout::keyed(0);
        let run = sorted_run(dir.path(), &["Name"], layout, &[&["MIT"], &["Stanford"]]);
        let path = run.path().to_path_buf();
        assert!(path.exists());
        drop(run);
        assert!(!path.exists());
    }

    #[test]
    fn cursor_reopens_independently_of_the_writer_handle() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RecordLayout::keyed(0);
        let run = sorted_run(dir.path(), &["Name"], layout, &[&["b"], &["a"]]);
        assert_eq!(run.len(), 2);

        let mut cursor = run.open_cursor().unwrap();
        assert_eq!(cursor.key(), "a");
        cursor.advance().unwrap();
        assert_eq!(cursor.key(), "b");
    }
}
