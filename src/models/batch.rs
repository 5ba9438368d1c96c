use super::LogRecord;
use serde::Serialize;

/// An ordered set of log records
///
/// A batch is built once by ingestion or generation and then only read.
/// Loading new data replaces the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LogBatch {
    records: Vec<LogRecord>,
}

impl LogBatch {
    pub fn new(records: Vec<LogRecord>) -> Self {
        LogBatch { records }
    }

    pub fn empty() -> Self {
        LogBatch::default()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogRecord> {
        self.records.iter()
    }

    /// Serialize the batch as a pretty JSON array
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records)
    }
}

impl From<Vec<LogRecord>> for LogBatch {
    fn from(records: Vec<LogRecord>) -> Self {
        LogBatch::new(records)
    }
}

impl<'a> IntoIterator for &'a LogBatch {
    type Item = &'a LogRecord;
    type IntoIter = std::slice::Iter<'a, LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
