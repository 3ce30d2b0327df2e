//! CSV writers for join results and run summaries.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::SinkError;
use crate::models::Record;
use crate::orchestrator::JobSummary;

/// Streaming writer for join results: the full left row plus the right
/// relation's filter column value, under a header naming the left columns
/// and the filter column.
pub struct CsvSink {
    writer: Writer<BufWriter<File>>,
}

impl CsvSink {
    pub fn create(
        path: &Path,
        left_header: &[String],
        filter_column: &str,
    ) -> Result<Self, SinkError> {
        let file = File::create(path).map_err(|e| SinkError::Create {
            path: path.to_path_buf(),
            source: e,
        })?;
        let buf_writer = BufWriter::with_capacity(512 * 1024, file);
        let mut writer = WriterBuilder::new().from_writer(buf_writer);

        let mut header: Vec<&str> = left_header.iter().map(String::as_str).collect();
        header.push(filter_column);
        writer.write_record(&header).map_err(SinkError::Write)?;
        Ok(Self { writer })
    }

    pub fn write_pair(&mut self, left: &Record, right: &Record) -> Result<(), SinkError> {
        let mut row: Vec<&str> = left.fields().iter().map(String::as_str).collect();
        row.push(right.filter_field().unwrap_or(""));
        self.writer.write_record(&row).map_err(SinkError::Write)
    }

    pub fn flush(mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .map_err(|e| SinkError::Write(csv::Error::from(e)))
    }
}

/// Two-column Key/Value report describing a completed join.
pub fn export_summary_csv(path: &Path, summary: &JobSummary) -> Result<(), SinkError> {
    let file = File::create(path).map_err(|e| SinkError::Create {
        path: path.to_path_buf(),
        source: e,
    })?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    let mut w = WriterBuilder::new().from_writer(buf_writer);
    w.write_record(["Key", "Value"]).map_err(SinkError::Write)?;

    let mut write_kv = |k: &str, v: String| -> Result<(), SinkError> {
        w.write_record([k, v.as_str()]).map_err(SinkError::Write)
    };
    write_kv("Left rows", summary.left_rows.to_string())?;
    write_kv("Left runs", summary.left_runs.to_string())?;
    write_kv("Right rows", summary.right_rows.to_string())?;
    write_kv("Right runs", summary.right_runs.to_string())?;
    write_kv("Match groups", summary.stats.match_groups.to_string())?;
    write_kv("Pairs written", summary.stats.pairs_emitted.to_string())?;
    write_kv("Pairs filtered", summary.stats.pairs_filtered.to_string())?;
    write_kv("Advanced left", summary.stats.advanced_left.to_string())?;
    write_kv("Advanced right", summary.stats.advanced_right.to_string())?;
    write_kv(
        "Started (UTC)",
        summary.started_utc.format("%Y-%m-%d %H:%M:%S").to_string(),
    )?;
    write_kv(
        "Ended (UTC)",
        summary.ended_utc.format("%Y-%m-%d %H:%M:%S").to_string(),
    )?;
    write_kv("Duration", fmt_duration(summary.duration_secs))?;

    w.flush()
        .map_err(|e| SinkError::Write(csv::Error::from(e)))?;
    Ok(())
}

// Human-readable HH:MM:SS (hours may exceed 23)
fn fmt_duration(secs: f64) -> String {
    let total = secs.floor() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}
