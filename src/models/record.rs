use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Address used when a source record carries no IP
pub const UNKNOWN_IP: &str = "Unknown";

/// Action code given to records that could not be mapped to a known shape
pub const RAW_LOG_ACTION: &str = "RAW_LOG";

/// Windows event id for a failed logon
pub const EVENT_LOGON_FAILED: i64 = 4625;

/// Windows event id for a successful logon
pub const EVENT_LOGON_SUCCESS: i64 = 4624;

/// Event identifier as found in the source, numeric or free-form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Numeric(i64),
    Text(String),
}

impl EventId {
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            EventId::Numeric(n) => Some(*n),
            EventId::Text(_) => None,
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Numeric(n) => write!(f, "{}", n),
            EventId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EventId {
    fn from(n: i64) -> Self {
        EventId::Numeric(n)
    }
}

/// One normalized security event
///
/// Records are immutable once built: fields are only reachable through
/// accessors, and the `with_*` methods consume the record to produce a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<EventId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    ip: String,
    action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl LogRecord {
    /// Create a record with only the required fields set
    pub fn new(timestamp: DateTime<Utc>, ip: impl Into<String>, action: impl Into<String>) -> Self {
        LogRecord {
            timestamp,
            event_id: None,
            user: None,
            ip: ip.into(),
            action: action.into(),
            status_code: None,
            user_agent: None,
            severity: None,
            message: None,
        }
    }

    /// A free-text line with synthesized required fields
    pub fn raw(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        LogRecord::new(timestamp, UNKNOWN_IP, RAW_LOG_ACTION).with_message(message)
    }

    pub fn with_event_id(mut self, event_id: impl Into<EventId>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn event_id(&self) -> Option<&EventId> {
        self.event_id.as_ref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn severity(&self) -> Option<&str> {
        self.severity.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
