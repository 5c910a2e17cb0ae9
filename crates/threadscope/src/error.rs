use std::fmt;
use std::io;

use threadscope_types::{InvariantError, LockName, WireError};

/// Failure of the wrapped primitive itself, as opposed to the trace sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveFailure {
    /// A previous holder panicked while holding the lock.
    Poisoned,
}

impl fmt::Display for PrimitiveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poisoned => write!(f, "lock poisoned by a panicking holder"),
        }
    }
}

impl std::error::Error for PrimitiveFailure {}

#[derive(Debug)]
pub enum TraceError {
    /// The record could not be written to or flushed from the sink.
    Sink(io::Error),
    Encode(WireError),
    InvalidLabel(InvariantError),
    Primitive {
        lock: LockName,
        failure: PrimitiveFailure,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sink(err) => write!(f, "failed to write trace record: {err}"),
            Self::Encode(err) => write!(f, "failed to encode trace record: {err}"),
            Self::InvalidLabel(err) => write!(f, "invalid lock label: {err}"),
            Self::Primitive { lock, failure } => {
                write!(f, "failed to acquire lock \"{lock}\": {failure}")
            }
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sink(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidLabel(err) => Some(err),
            Self::Primitive { failure, .. } => Some(failure),
        }
    }
}

impl From<io::Error> for TraceError {
    fn from(value: io::Error) -> Self {
        Self::Sink(value)
    }
}

impl From<WireError> for TraceError {
    fn from(value: WireError) -> Self {
        Self::Encode(value)
    }
}

impl From<InvariantError> for TraceError {
    fn from(value: InvariantError) -> Self {
        Self::InvalidLabel(value)
    }
}
