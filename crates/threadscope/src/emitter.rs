use std::fmt;
use std::io::{self, Write};
use std::sync::LazyLock;

use parking_lot::Mutex;
use threadscope_types::{Event, EventKind, LockName, encode_event_line};

use crate::config::{SinkTarget, TraceConfig};
use crate::error::TraceError;

static EMITTER: LazyLock<Emitter> =
    LazyLock::new(|| Emitter::from_config(&TraceConfig::from_env()));

/// The process-wide emitter, configured from the environment on first use.
pub fn emitter() -> &'static Emitter {
    &EMITTER
}

/// Emits one event through the process-wide emitter.
pub fn emit(kind: EventKind, lock: &LockName) -> Result<(), TraceError> {
    EMITTER.emit(kind, lock)
}

/// Byte destination for trace records.
pub enum Sink {
    Stdout,
    Stderr,
    /// Accepts and drops every record.
    Discard,
    Writer(Box<dyn Write + Send>),
}

impl Sink {
    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Self::Writer(Box::new(writer))
    }

    fn write_record(&mut self, line: &str) -> io::Result<()> {
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(line.as_bytes())?;
                out.flush()
            }
            Self::Stderr => {
                let mut out = io::stderr().lock();
                out.write_all(line.as_bytes())?;
                out.flush()
            }
            Self::Discard => Ok(()),
            Self::Writer(writer) => {
                writer.write_all(line.as_bytes())?;
                writer.flush()
            }
        }
    }
}

impl From<SinkTarget> for Sink {
    fn from(target: SinkTarget) -> Self {
        match target {
            SinkTarget::Stdout => Self::Stdout,
            SinkTarget::Stderr => Self::Stderr,
            SinkTarget::Off => Self::Discard,
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "Stdout"),
            Self::Stderr => write!(f, "Stderr"),
            Self::Discard => write!(f, "Discard"),
            Self::Writer(_) => write!(f, "Writer(..)"),
        }
    }
}

/// Serializes trace records onto a sink.
///
/// The sink mutex is the single serialization point: stamping, encoding,
/// writing and flushing one record all happen while it is held, so records
/// never interleave and `time` never decreases in stream order.
pub struct Emitter {
    sink: Mutex<Sink>,
}

impl Emitter {
    pub fn new(sink: Sink) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn from_config(config: &TraceConfig) -> Self {
        Self::new(Sink::from(config.sink))
    }

    pub fn emit(&self, kind: EventKind, lock: &LockName) -> Result<(), TraceError> {
        let mut sink = self.sink.lock();
        let event = Event::now(kind, lock.clone());
        let line = encode_event_line(&event)?;
        sink.write_record(&line)?;
        Ok(())
    }

    /// Swaps the destination, returning the previous one. Records already
    /// written stay where they were.
    pub fn replace_sink(&self, sink: Sink) -> Sink {
        std::mem::replace(&mut *self.sink.lock(), sink)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}
