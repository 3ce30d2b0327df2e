use std::path::Path;

use log::debug;

use crate::error::JoinError;
use crate::models::{Record, RecordLayout};
use crate::normalize::normalize_key;
use crate::runs::Run;
use crate::source::CsvSource;

/// Consumes the source, emitting one sorted run per full buffer and a
/// final run for any non-empty partial tail. An empty relation yields no
/// runs; a non-empty relation smaller than `run_size` yields exactly one.
///
/// Each buffer is sorted with a stable sort on the normalized key, so
/// rows with equal keys keep their input order within a run.
pub fn generate_runs(
    source: &mut CsvSource,
    run_size: usize,
    tmp_dir: &Path,
) -> Result<Vec<Run>, JoinError> {
    let header: Vec<String> = source.header().to_vec();
    let layout = source.layout();
    let mut runs = Vec::new();
    let mut buf: Vec<(String, Record)> = Vec::with_capacity(run_size.min(1024));

    while let Some(record) = source.next_record()? {
        let key = normalize_key(record.join_key());
        buf.push((key, record));
        if buf.len() >= run_size {
            runs.push(flush_run(&mut buf, tmp_dir, &header, layout)?);
        }
    }
    if !buf.is_empty() {
        runs.push(flush_run(&mut buf, tmp_dir, &header, layout)?);
    }
    Ok(runs)
}

fn flush_run(
    buf: &mut Vec<(String, Record)>,
    tmp_dir: &Path,
    header: &[String],
    layout: RecordLayout,
) -> Result<Run, JoinError> {
    buf.sort_by(|a, b| a.0.cmp(&b.0));
    let records: Vec<Record> = buf.drain(..).map(|(_, rec)| rec).collect();
    let run = Run::create(tmp_dir, header, layout, &records)?;
    debug!("flushed run {:?} ({} records)", run.path(), run.len());
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;

    fn source_with(dir: &Path, body: &str, layout: RecordLayout) -> (PathBuf, CsvSource) {
        let path = dir.join("input.csv");
        fs::write(&path, body).unwrap();
        let src = CsvSource::open(&path, layout).unwrap();
        (path, src)
    }

    fn drain_keys(run: &Run) -> Vec<(String, Vec<String>)> {
        let mut cursor = run.open_cursor().unwrap();
        let mut out = Vec::new();
        while !cursor.is_exhausted() {
            let key = cursor.key().to_owned();
            let record = cursor.advance().unwrap().unwrap();
            out.push((key, record.fields().to_vec()));
        }
        out
    }

    #[test]
    fn empty_relation_yields_zero_runs() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut src) = source_with(dir.path(), "Name\n", RecordLayout::keyed(0));
        let runs = generate_runs(&mut src, 3, dir.path()).unwrap();
        assert!(runs.is_empty());
    }

    #[test]
    fn relation_below_limit_yields_one_run() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut src) = source_with(dir.path(), "Name\nb\na\n", RecordLayout::keyed(0));
        let runs = generate_runs(&mut src, 50, dir.path()).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 2);
    }

    #[test]
    fn records_survive_partitioning_exactly_once_and_runs_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let body = "Name\ndelta\nalpha\ngolf\nbravo\nfoxtrot\ncharlie\necho\n";
        let (_, mut src) = source_with(dir.path(), body, RecordLayout::keyed(0));

        let runs = generate_runs(&mut src, 3, dir.path()).unwrap();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs.iter().map(Run::len).collect::<Vec<_>>(), [3, 3, 1]);

        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        for run in &runs {
            let rows = drain_keys(run);
            let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
            let mut sorted = keys.clone();
            sorted.sort();
            assert_eq!(keys, sorted, "run not sorted: {:?}", keys);
            for (key, _) in rows {
                *seen.entry(key).or_default() += 1;
            }
        }
        let expected = [
            "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf",
        ];
        assert_eq!(seen.len(), expected.len());
        for key in expected {
            assert_eq!(seen.get(key), Some(&1), "missing or duplicated {}", key);
        }
    }

    #[test]
    fn equal_keys_keep_input_order_within_a_run() {
        let dir = tempfile::tempdir().unwrap();
        let body = "Name,Seq\nzz,0\nMIT,1\nmit,2\nM I T,3\n";
        let (_, mut src) = source_with(dir.path(), body, RecordLayout::keyed(0));

        let runs = generate_runs(&mut src, 50, dir.path()).unwrap();
        assert_eq!(runs.len(), 1);
        let rows = drain_keys(&runs[0]);
        let mit_seqs: Vec<&str> = rows
            .iter()
            .filter(|(k, _)| k == "mit")
            .map(|(_, fields)| fields[1].as_str())
            .collect();
        assert_eq!(mit_seqs, ["1", "2", "3"]);
    }

    #[test]
    fn malformed_row_aborts_generation() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut src) = source_with(dir.path(), "A,B\nx,1\nonly\n", RecordLayout::keyed(1));
        let err = generate_runs(&mut src, 50, dir.path());
        assert!(matches!(err, Err(JoinError::Source(_))));
    }
}
