//! Rendering of stats and export of analysis reports

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::stats::{Stats, TimelineBucket};

/// Errors that can occur while writing output
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No analysis available to export")]
    NothingToExport,
}

/// Downloadable record of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    pub timestamp: DateTime<Utc>,
    pub analysis: String,
    pub logs_analyzed: usize,
    pub stats: Stats,
}

impl ExportReport {
    /// File name derived from the report timestamp
    pub fn file_name(&self) -> String {
        format!("security-report-{}.json", self.timestamp.format("%Y%m%d-%H%M%S"))
    }

    /// Write the report as pretty JSON into `dir`, returning the file path
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        log::info!("Exported analysis report to {:?}", path);
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Console,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Console,
        }
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    generated_at: String,
    stats: &'a Stats,
    timeline: &'a [TimelineBucket],
}

/// Writes stats summaries to stdout or a file
pub struct OutputHandler {
    format: OutputFormat,
    writer: Option<Box<dyn Write + Send>>,
}

impl OutputHandler {
    /// Create a new output handler; `None` writes to stdout
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> Result<Self, ExportError> {
        let writer: Option<Box<dyn Write + Send>> = match file_path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                Some(Box::new(BufWriter::new(file)))
            }
            None => None,
        };

        Ok(OutputHandler { format, writer })
    }

    /// Handler writing into an arbitrary sink
    pub fn with_writer(format: OutputFormat, writer: Box<dyn Write + Send>) -> Self {
        OutputHandler {
            format,
            writer: Some(writer),
        }
    }

    /// Write stats and timeline in the configured format
    pub fn write_summary(&mut self, stats: &Stats, timeline: &[TimelineBucket]) -> Result<(), ExportError> {
        let output = match self.format {
            OutputFormat::Json => {
                let summary = Summary {
                    generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                    stats,
                    timeline,
                };
                format!("{}\n", serde_json::to_string_pretty(&summary)?)
            }
            OutputFormat::Console => render_console(stats, timeline),
        };
        self.write_output(&output)
    }

    /// Write free text such as an analysis report
    pub fn write_text(&mut self, text: &str) -> Result<(), ExportError> {
        if text.ends_with('\n') {
            self.write_output(text)
        } else {
            self.write_output(&format!("{}\n", text))
        }
    }

    fn write_output(&mut self, data: &str) -> Result<(), ExportError> {
        match &mut self.writer {
            Some(writer) => {
                writer.write_all(data.as_bytes())?;
                writer.flush()?;
            }
            None => {
                let mut stdout = io::stdout();
                stdout.write_all(data.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    /// Flush any buffered output
    pub fn flush(&mut self) -> Result<(), ExportError> {
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

fn render_console(stats: &Stats, timeline: &[TimelineBucket]) -> String {
    let mut out = format!(
        "Total events: {}\nFailed events: {}\nUnique IPs: {}\nHigh/Critical: {}\n",
        stats.total, stats.failed, stats.unique_ips, stats.critical
    );

    if !timeline.is_empty() {
        out.push_str("\nTimeline (time  total  failed)\n");
        for bucket in timeline {
            out.push_str(&format!(
                "  {}  {:>5}  {:>6}\n",
                bucket.time_label, bucket.total_count, bucket.failed_count
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn sample_stats() -> Stats {
        Stats { total: 12, failed: 5, unique_ips: 3, critical: 2 }
    }

    fn sample_timeline() -> Vec<TimelineBucket> {
        vec![TimelineBucket { time_label: "10:00".to_string(), total_count: 12, failed_count: 4 }]
    }

    #[test]
    fn test_export_report_written_with_timestamped_name() {
        let dir = tempdir().unwrap();
        let report = ExportReport {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 14, 3, 9).unwrap(),
            analysis: "## Findings\nBrute force from 45.33.22.11".to_string(),
            logs_analyzed: 12,
            stats: sample_stats(),
        };

        let path = report.write_to_dir(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "security-report-20240501-140309.json");

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["logs_analyzed"], 12);
        assert_eq!(written["stats"]["uniqueIps"], 3);
        assert_eq!(written["analysis"], "## Findings\nBrute force from 45.33.22.11");

        let parsed: ExportReport = serde_json::from_value(written).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_console_summary() {
        let buffer = SharedBuffer::default();
        let mut handler = OutputHandler::with_writer(OutputFormat::Console, Box::new(buffer.clone()));
        handler.write_summary(&sample_stats(), &sample_timeline()).unwrap();

        let text = buffer.contents();
        assert!(text.contains("Failed events: 5"));
        assert!(text.contains("Unique IPs: 3"));
        assert!(text.contains("10:00"));
    }

    #[test]
    fn test_json_summary() {
        let buffer = SharedBuffer::default();
        let mut handler = OutputHandler::with_writer(OutputFormat::Json, Box::new(buffer.clone()));
        handler.write_summary(&sample_stats(), &sample_timeline()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&buffer.contents()).unwrap();
        assert_eq!(value["stats"]["total"], 12);
        assert_eq!(value["timeline"][0]["timeLabel"], "10:00");
        assert_eq!(value["timeline"][0]["failedCount"], 4);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("console"), OutputFormat::Console);
        assert_eq!(OutputFormat::from_str("other"), OutputFormat::Console);
    }
}
