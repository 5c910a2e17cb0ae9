use std::fmt;
use std::ops::{Deref, DerefMut};

use threadscope_types::{EventKind, LockName};

use crate::emitter::{Emitter, emitter};
use crate::error::TraceError;
use crate::lock::TraceableLock;

/// Holds a [`TraceableLock`] and records its lifecycle.
///
/// Construction emits `lock_acquire_attempt`, blocks on the primitive, then
/// emits `lock_acquired`. Dropping emits `lock_released` and only then lets
/// the primitive go, so no other thread can be seen acquiring the same lock
/// before this release is in the stream.
///
/// ```rust,no_run
/// let counter = parking_lot::Mutex::new(0u64);
/// {
///     let mut guard = threadscope::ScopedLock::new(&counter, "M")?;
///     *guard += 1;
/// }
/// # Ok::<(), threadscope::TraceError>(())
/// ```
pub struct ScopedLock<'a, L: TraceableLock + 'a> {
    // `None` only after release has run.
    guard: Option<L::Guard<'a>>,
    name: LockName,
    emitter: &'a Emitter,
}

impl<'a, L: TraceableLock + 'a> ScopedLock<'a, L> {
    /// Acquires `lock`, tracing through the process-wide emitter.
    pub fn new(lock: &'a L, name: impl Into<String>) -> Result<Self, TraceError> {
        Self::new_in(emitter(), lock, name)
    }

    /// Acquires `lock`, tracing through `emitter`.
    pub fn new_in(
        emitter: &'a Emitter,
        lock: &'a L,
        name: impl Into<String>,
    ) -> Result<Self, TraceError> {
        let name = LockName::new(name)?;
        emitter.emit(EventKind::LockAcquireAttempt, &name)?;
        match lock.acquire() {
            Ok(guard) => Self::hold(emitter, guard, name),
            Err(failure) => Err(TraceError::Primitive {
                lock: name,
                failure,
            }),
        }
    }

    /// Non-blocking variant of [`ScopedLock::new`]. Returns `Ok(None)` after
    /// emitting `lock_try_failed` when the lock is held elsewhere.
    pub fn try_new(lock: &'a L, name: impl Into<String>) -> Result<Option<Self>, TraceError> {
        Self::try_new_in(emitter(), lock, name)
    }

    pub fn try_new_in(
        emitter: &'a Emitter,
        lock: &'a L,
        name: impl Into<String>,
    ) -> Result<Option<Self>, TraceError> {
        let name = LockName::new(name)?;
        emitter.emit(EventKind::LockAcquireAttempt, &name)?;
        match lock.try_acquire() {
            Ok(Some(guard)) => Self::hold(emitter, guard, name).map(Some),
            Ok(None) => {
                emitter.emit(EventKind::LockTryFailed, &name)?;
                Ok(None)
            }
            Err(failure) => Err(TraceError::Primitive {
                lock: name,
                failure,
            }),
        }
    }

    fn hold(emitter: &'a Emitter, guard: L::Guard<'a>, name: LockName) -> Result<Self, TraceError> {
        if let Err(err) = emitter.emit(EventKind::LockAcquired, &name) {
            // The stream never showed this acquisition, so it gets no release either.
            drop(guard);
            return Err(err);
        }
        Ok(Self {
            guard: Some(guard),
            name,
            emitter,
        })
    }

    pub fn name(&self) -> &LockName {
        &self.name
    }

    /// Releases now, reporting a sink failure for the `lock_released` record.
    /// The primitive is released even when the record could not be written.
    pub fn release(mut self) -> Result<(), TraceError> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<(), TraceError> {
        let Some(guard) = self.guard.take() else {
            return Ok(());
        };
        let result = self.emitter.emit(EventKind::LockReleased, &self.name);
        drop(guard);
        result
    }

    pub(crate) fn emitter(&self) -> &'a Emitter {
        self.emitter
    }

    pub(crate) fn primitive_guard_mut(&mut self) -> &mut L::Guard<'a> {
        self.guard
            .as_mut()
            .expect("ScopedLock guard is only taken by release")
    }
}

impl<'a, L> Deref for ScopedLock<'a, L>
where
    L: TraceableLock + 'a,
    L::Guard<'a>: Deref,
{
    type Target = <L::Guard<'a> as Deref>::Target;

    fn deref(&self) -> &Self::Target {
        self.guard
            .as_deref()
            .expect("ScopedLock guard is only taken by release")
    }
}

impl<'a, L> DerefMut for ScopedLock<'a, L>
where
    L: TraceableLock + 'a,
    L::Guard<'a>: DerefMut,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard
            .as_deref_mut()
            .expect("ScopedLock guard is only taken by release")
    }
}

impl<'a, L: TraceableLock + 'a> Drop for ScopedLock<'a, L> {
    fn drop(&mut self) {
        if let Err(err) = self.release_inner() {
            tracing::error!(lock = %self.name, %err, "lock released without a trace record");
        }
    }
}

impl<'a, L: TraceableLock + 'a> fmt::Debug for ScopedLock<'a, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedLock")
            .field("name", &self.name)
            .field("held", &self.guard.is_some())
            .finish()
    }
}
