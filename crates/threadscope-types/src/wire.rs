use std::fmt;

use crate::{Event, InvariantError};

/// Record terminator. One event per line.
pub const RECORD_TERMINATOR: char = '\n';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    Json(String),
    MultipleRecords,
    Invalid(InvariantError),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "{err}"),
            Self::MultipleRecords => write!(f, "expected a single record, found several lines"),
            Self::Invalid(err) => write!(f, "invalid record: {err}"),
        }
    }
}

impl std::error::Error for WireError {}

/// Encodes one event as compact JSON followed by the record terminator.
pub fn encode_event_line(event: &Event) -> Result<String, WireError> {
    let mut line = facet_json::to_string(event).map_err(|e| WireError::Json(e.to_string()))?;
    line.push(RECORD_TERMINATOR);
    Ok(line)
}

/// Decodes one record, with or without its trailing terminator.
pub fn decode_event_line(line: &str) -> Result<Event, WireError> {
    let payload = line.strip_suffix(RECORD_TERMINATOR).unwrap_or(line);
    let payload = payload.strip_suffix('\r').unwrap_or(payload);
    if payload.contains(RECORD_TERMINATOR) {
        return Err(WireError::MultipleRecords);
    }
    let event: Event =
        facet_json::from_slice(payload.as_bytes()).map_err(|e| WireError::Json(e.to_string()))?;
    // The transparent label decodes without going through `LockName::new`.
    if event.lock.as_str().is_empty() {
        return Err(WireError::Invalid(InvariantError::EmptyField("lock")));
    }
    Ok(event)
}
