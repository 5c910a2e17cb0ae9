use facet::Facet;
use std::cell::OnceCell;
use std::error::Error;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    EmptyField(&'static str),
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must be non-empty"),
        }
    }
}

impl Error for InvariantError {}

static PTIME_ANCHOR: OnceLock<Instant> = OnceLock::new();

fn ptime_anchor() -> &'static Instant {
    PTIME_ANCHOR.get_or_init(Instant::now)
}

/// Fixes the trace time origin to "now" unless something already fixed it.
///
/// Called from a load-time constructor so the origin is process start. Any
/// later call is a no-op; the first writer wins.
pub fn anchor_process_start() {
    let _ = ptime_anchor();
}

/// process start time + N milliseconds
#[derive(Facet, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[facet(transparent)]
pub struct PTime(u64);

impl PTime {
    pub fn now() -> Self {
        let elapsed_ms = ptime_anchor().elapsed().as_millis().min(u64::MAX as u128) as u64;
        Self(elapsed_ms)
    }

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

static NEXT_THREAD_TAG: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TAG: OnceCell<ThreadTag> = const { OnceCell::new() };
}

/// Opaque per-thread identity carried in the `tid` field.
///
/// Tags are handed out from a process-wide counter the first time a thread
/// asks for one, so they never collide and never change for a live thread.
#[derive(Facet, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[facet(transparent)]
pub struct ThreadTag(String);

impl ThreadTag {
    pub fn current() -> Self {
        THREAD_TAG.with(|tag| {
            tag.get_or_init(|| {
                let raw = NEXT_THREAD_TAG.fetch_add(1, Ordering::Relaxed);
                ThreadTag(raw.to_string())
            })
            .clone()
        })
    }

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ThreadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-assigned logical name of a synchronization primitive.
///
/// Names are not checked for uniqueness. Two primitives sharing a name are
/// indistinguishable in the trace.
#[derive(Facet, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[facet(transparent)]
pub struct LockName(String);

impl LockName {
    pub fn new(value: impl Into<String>) -> Result<Self, InvariantError> {
        let value = value.into();
        if value.is_empty() {
            return Err(InvariantError::EmptyField("lock"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
