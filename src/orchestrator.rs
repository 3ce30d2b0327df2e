//! Job coordination: run generation for both relations, merge-join
//! construction, result emission, summary reporting, and scratch cleanup.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::info;

use crate::config::JobConfig;
use crate::export::{export_summary_csv, CsvSink};
use crate::merge::{FilterPredicate, MergeJoin, MergeStats};
use crate::metrics::memory_snapshot;
use crate::runs::{generate_runs, Run};
use crate::source::CsvSource;

/// Final accounting for one join job.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub left_rows: usize,
    pub right_rows: usize,
    pub left_runs: usize,
    pub right_runs: usize,
    pub stats: MergeStats,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
    pub duration_secs: f64,
}

/// Runs the whole job: external sort of both relations into temporary
/// runs, the fuzzy merge-join over them, and output emission.
///
/// Temporary runs are scoped to this call; they are deleted when it
/// returns, on success and on every error path alike.
pub fn run_job(cfg: &JobConfig) -> Result<JobSummary> {
    let started_utc = Utc::now();
    let clock = Instant::now();
    let tmp_dir = cfg
        .sort
        .tmp_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);

    let mut left_source = CsvSource::open(&cfg.left.path, cfg.left_layout())
        .with_context(|| format!("opening left relation {:?}", cfg.left.path))?;
    let mut right_source = CsvSource::open(&cfg.right.path, cfg.right_layout())
        .with_context(|| format!("opening right relation {:?}", cfg.right.path))?;

    let left_header = left_source.header().to_vec();
    let Some(filter_column) = right_source.header().get(cfg.filter.column).cloned() else {
        bail!(
            "filter column {} not present in right header {:?}",
            cfg.filter.column,
            right_source.header()
        );
    };

    let left_runs = generate_runs(&mut left_source, cfg.sort.run_size, &tmp_dir)
        .context("generating left runs")?;
    let left_rows: usize = left_runs.iter().map(Run::len).sum();
    info!(
        "left relation {:?}: {} records across {} runs",
        cfg.left.path,
        left_rows,
        left_runs.len()
    );

    let right_runs = generate_runs(&mut right_source, cfg.sort.run_size, &tmp_dir)
        .context("generating right runs")?;
    let right_rows: usize = right_runs.iter().map(Run::len).sum();
    info!(
        "right relation {:?}: {} records across {} runs",
        cfg.right.path,
        right_rows,
        right_runs.len()
    );

    let mem = memory_snapshot();
    info!(
        "run generation complete; host memory used {} MB, available {} MB",
        mem.used_mb, mem.avail_mb
    );

    let mut sink = CsvSink::create(&cfg.output.path, &left_header, &filter_column)
        .with_context(|| format!("creating output {:?}", cfg.output.path))?;

    let engine = MergeJoin::new(
        &left_runs,
        &right_runs,
        cfg.matching.threshold,
        FilterPredicate::new(&cfg.filter.expected),
    )
    .context("opening run cursors")?;
    let stats = engine
        .for_each(|left, right| sink.write_pair(left, right))
        .context("merging runs")?;
    sink.flush().context("flushing output")?;

    let ended_utc = Utc::now();
    let summary = JobSummary {
        left_rows,
        right_rows,
        left_runs: left_runs.len(),
        right_runs: right_runs.len(),
        stats,
        started_utc,
        ended_utc,
        duration_secs: clock.elapsed().as_secs_f64(),
    };
    info!(
        "join complete: {} match groups, {} pairs written, {} filtered out in {:.2}s",
        stats.match_groups, stats.pairs_emitted, stats.pairs_filtered, summary.duration_secs
    );

    if let Some(path) = &cfg.output.summary_path {
        export_summary_csv(path, &summary)
            .with_context(|| format!("writing summary {:?}", path))?;
    }

    Ok(summary)
    // left_runs and right_runs drop here, deleting their temp files; the
    // same drops run on every early return above.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        FilterConfig, MatchConfig, OutputConfig, RelationConfig, SortConfig,
    };
    use std::fs;
    use std::path::Path;

    fn config_for(dir: &Path) -> JobConfig {
        JobConfig {
            left: RelationConfig {
                path: dir.join("Student.csv"),
                key_column: 3,
            },
            right: RelationConfig {
                path: dir.join("University.csv"),
                key_column: 0,
            },
            filter: FilterConfig {
                column: 1,
                expected: "Canada".into(),
            },
            sort: SortConfig {
                run_size: 50_000,
                tmp_dir: Some(dir.join("tmp")),
            },
            matching: MatchConfig { threshold: 0.90 },
            output: OutputConfig {
                path: dir.join("Result.csv"),
                summary_path: None,
            },
        }
    }

    fn write_inputs(dir: &Path) {
        fs::create_dir_all(dir.join("tmp")).unwrap();
        fs::write(
            dir.join("Student.csv"),
            "StudentID,Name,Major,University\n1,Jane Doe,CS,MIT\n2,Bob,EE,mit\n",
        )
        .unwrap();
        fs::write(
            dir.join("University.csv"),
            "UniversityName,Country\nMIT,Canada\nStanford,USA\n",
        )
        .unwrap();
    }

    fn scratch_is_empty(dir: &Path) -> bool {
        fs::read_dir(dir.join("tmp")).unwrap().next().is_none()
    }

    #[test]
    fn end_to_end_joins_both_students_to_mit() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let cfg = config_for(dir.path());

        let summary = run_job(&cfg).unwrap();
        assert_eq!(summary.left_rows, 2);
        assert_eq!(summary.right_rows, 2);
        assert_eq!(summary.left_runs, 1);
        assert_eq!(summary.right_runs, 1);
        assert_eq!(summary.stats.match_groups, 1);
        assert_eq!(summary.stats.pairs_emitted, 2);

        let body = fs::read_to_string(dir.path().join("Result.csv")).unwrap();
        assert_eq!(
            body,
            "StudentID,Name,Major,University,Country\n\
             1,Jane Doe,CS,MIT,Canada\n\
             2,Bob,EE,mit,Canada\n"
        );
        assert!(scratch_is_empty(dir.path()), "temp runs not cleaned up");
    }

    #[test]
    fn summary_csv_is_written_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let mut cfg = config_for(dir.path());
        cfg.output.summary_path = Some(dir.path().join("summary.csv"));

        run_job(&cfg).unwrap();
        let body = fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        assert!(body.starts_with("Key,Value\n"));
        assert!(body.contains("Match groups,1\n"));
        assert!(body.contains("Pairs written,2\n"));
    }

    #[test]
    fn sink_failure_still_cleans_up_runs() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let mut cfg = config_for(dir.path());
        // a directory that does not exist makes output creation fail
        cfg.output.path = dir.path().join("no_such_dir").join("Result.csv");

        assert!(run_job(&cfg).is_err());
        assert!(scratch_is_empty(dir.path()), "temp runs not cleaned up");
    }

    #[test]
    fn missing_left_relation_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let mut cfg = config_for(dir.path());
        cfg.left.path = dir.path().join("absent.csv");

        assert!(run_job(&cfg).is_err());
        assert!(!cfg.output.path.exists());
    }

    #[test]
    fn disjoint_relations_terminate_with_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tmp")).unwrap();
        fs::write(
            dir.path().join("Student.csv"),
            "StudentID,Name,Major,University\n1,A,CS,aaa\n2,B,EE,abb\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("University.csv"),
            "UniversityName,Country\nzzz,Canada\n",
        )
        .unwrap();
        let cfg = config_for(dir.path());

        let summary = run_job(&cfg).unwrap();
        assert_eq!(summary.stats.pairs_emitted, 0);
        let body = fs::read_to_string(dir.path().join("Result.csv")).unwrap();
        assert_eq!(body, "StudentID,Name,Major,University,Country\n");
        assert!(scratch_is_empty(dir.path()));
    }
}
