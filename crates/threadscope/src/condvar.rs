use std::fmt;

use threadscope_types::EventKind;

use crate::error::TraceError;
use crate::guard::ScopedLock;

/// [`parking_lot::Condvar`] that records waits on a traced mutex.
///
/// A wait shows up as `condvar_wait` (the mutex is given up) followed by
/// `condvar_woken` (the mutex is held again), both under the mutex's name.
/// Spurious wakeups produce a pair of their own.
#[derive(Default)]
pub struct TracedCondvar {
    inner: parking_lot::Condvar,
}

impl TracedCondvar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until notified. Like the lock it waits on, there is no timeout.
    pub fn wait<T>(
        &self,
        guard: &mut ScopedLock<'_, parking_lot::Mutex<T>>,
    ) -> Result<(), TraceError> {
        let emitter = guard.emitter();
        emitter.emit(EventKind::CondvarWait, guard.name())?;
        self.inner.wait(guard.primitive_guard_mut());
        emitter.emit(EventKind::CondvarWoken, guard.name())
    }

    /// Waits for as long as `condition` holds for the protected value.
    pub fn wait_while<T, F>(
        &self,
        guard: &mut ScopedLock<'_, parking_lot::Mutex<T>>,
        mut condition: F,
    ) -> Result<(), TraceError>
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut **guard) {
            self.wait(guard)?;
        }
        Ok(())
    }

    pub fn notify_one(&self) -> bool {
        self.inner.notify_one()
    }

    pub fn notify_all(&self) -> usize {
        self.inner.notify_all()
    }
}

impl fmt::Debug for TracedCondvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracedCondvar").finish_non_exhaustive()
    }
}
