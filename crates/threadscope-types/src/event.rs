use facet::Facet;
use std::fmt;

use crate::{LockName, PTime, ThreadTag};

/// Lock lifecycle transition recorded by one [`Event`].
///
/// For one thread and one lock name a well-formed trace reads
/// `attempt (acquired (condvar_wait condvar_woken)* released | try_failed)`.
#[derive(Facet, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum EventKind {
    /// Emitted before blocking, so contention is visible.
    LockAcquireAttempt,
    LockAcquired,
    LockReleased,
    /// A non-blocking attempt found the lock already held.
    LockTryFailed,
    /// The holder gave the lock up to wait on a condition variable.
    CondvarWait,
    /// The waiter was woken and holds the lock again.
    CondvarWoken,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LockAcquireAttempt => "lock_acquire_attempt",
            Self::LockAcquired => "lock_acquired",
            Self::LockReleased => "lock_released",
            Self::LockTryFailed => "lock_try_failed",
            Self::CondvarWait => "condvar_wait",
            Self::CondvarWoken => "condvar_woken",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One trace record. Built, written, and dropped by the emitter; never stored.
#[derive(Facet, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    #[facet(rename = "type")]
    pub kind: EventKind,

    /// Milliseconds since the process time origin.
    pub time: PTime,

    pub tid: ThreadTag,

    pub lock: LockName,
}

impl Event {
    /// Stamps an event for the calling thread at the current process time.
    pub fn now(kind: EventKind, lock: LockName) -> Self {
        Self {
            kind,
            time: PTime::now(),
            tid: ThreadTag::current(),
            lock,
        }
    }
}
