//! Normalized log entry model.
//!
//! A [`LogEntry`] is the uniform representation of one log line regardless
//! of which backend produced it. The entry keeps the backend's raw
//! key/value pairs verbatim; the common fields (message, timestamp, level)
//! are derived on access from whichever keys the backend happened to use.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Canonical raw keys written by the built-in collectors.
pub mod keys {
    /// Message text of the entry.
    pub const MESSAGE: &str = "MESSAGE";
    /// Capture or emission timestamp, RFC 3339.
    pub const TIMESTAMP: &str = "TIMESTAMP";
    /// Severity label (e.g. "INFO", "ERROR").
    pub const LEVEL: &str = "LEVEL";
}

/// Key spellings recognized when normalizing records from foreign backends,
/// tried in order. Covers journald exports and ASL-style dictionaries.
const MESSAGE_KEYS: &[&str] = &[keys::MESSAGE, "Message", "message", "MSG"];
const TIMESTAMP_KEYS: &[&str] = &[
    keys::TIMESTAMP,
    "Time",
    "timestamp",
    "SYSLOG_TIMESTAMP",
    "__REALTIME_TIMESTAMP",
];
const LEVEL_KEYS: &[&str] = &[keys::LEVEL, "Level", "level", "PRIORITY"];

/// A single normalized log line.
///
/// Construction never fails: an entry whose raw mapping holds no recognized
/// keys is still valid and simply exposes empty derived fields. Entries are
/// immutable after construction.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use periscope::logs::{keys, LogEntry};
///
/// let mut raw = BTreeMap::new();
/// raw.insert(keys::MESSAGE.to_string(), "connection refused".to_string());
/// raw.insert(keys::LEVEL.to_string(), "ERROR".to_string());
///
/// let entry = LogEntry::new(raw);
/// assert_eq!(entry.message(), "connection refused");
/// assert_eq!(entry.level(), Some(tracing::Level::ERROR));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntry {
    raw: BTreeMap<String, String>,
}

impl LogEntry {
    /// Wrap a raw key/value mapping produced by a log backend.
    pub fn new(raw: BTreeMap<String, String>) -> Self {
        Self { raw }
    }

    /// Build an entry for a single captured text line.
    ///
    /// The raw mapping holds the message text and the capture timestamp,
    /// which is the minimum the console collector records per line.
    pub fn from_line(message: &str, captured_at: DateTime<Utc>) -> Self {
        let mut raw = BTreeMap::new();
        raw.insert(keys::MESSAGE.to_string(), message.to_string());
        raw.insert(keys::TIMESTAMP.to_string(), captured_at.to_rfc3339());
        Self { raw }
    }

    /// The backend's raw key/value pairs, untouched.
    pub fn raw(&self) -> &BTreeMap<String, String> {
        &self.raw
    }

    /// True when the raw mapping holds no pairs at all.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Message text, or the empty string when no message key is present.
    pub fn message(&self) -> &str {
        self.first_of(MESSAGE_KEYS).map(String::as_str).unwrap_or("")
    }

    /// Timestamp derived from the raw mapping.
    ///
    /// RFC 3339 values are preferred; all-digit values are interpreted as
    /// epoch microseconds (journald's `__REALTIME_TIMESTAMP`).
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.first_of(TIMESTAMP_KEYS).and_then(|value| parse_timestamp(value))
    }

    /// Severity derived from the raw mapping.
    ///
    /// Recognizes named levels and syslog numeric priorities.
    pub fn level(&self) -> Option<Level> {
        self.first_of(LEVEL_KEYS).and_then(|value| parse_level(value))
    }

    fn first_of(&self, candidates: &[&str]) -> Option<&String> {
        candidates.iter().find_map(|key| self.raw.get(*key))
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Journald realtime timestamps are epoch microseconds
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return DateTime::from_timestamp_micros(value.parse().ok()?);
    }
    None
}

fn parse_level(value: &str) -> Option<Level> {
    // Digits follow syslog severity (0 = emergency .. 7 = debug)
    match value.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(Level::TRACE),
        "DEBUG" | "7" => Some(Level::DEBUG),
        "INFO" | "NOTICE" | "5" | "6" => Some(Level::INFO),
        "WARN" | "WARNING" | "4" => Some(Level::WARN),
        "ERROR" | "ERR" | "CRIT" | "CRITICAL" | "ALERT" | "EMERG" | "FATAL" | "0" | "1" | "2"
        | "3" => Some(Level::ERROR),
        _ => None,
    }
}
