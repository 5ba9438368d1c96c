pub mod batch;
pub mod record;

pub use batch::LogBatch;
pub use record::{EventId, LogRecord, EVENT_LOGON_FAILED, EVENT_LOGON_SUCCESS, RAW_LOG_ACTION, UNKNOWN_IP};
