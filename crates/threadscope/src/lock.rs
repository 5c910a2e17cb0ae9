use crate::error::PrimitiveFailure;

/// A mutual-exclusion primitive a [`ScopedLock`](crate::ScopedLock) can wrap.
///
/// Releasing is dropping the returned guard. `acquire` has no timeout: a
/// thread stuck in it stays stuck, which is what makes a deadlock visible in
/// the trace.
pub trait TraceableLock {
    type Guard<'a>
    where
        Self: 'a;

    /// Blocks until the lock is held.
    fn acquire(&self) -> Result<Self::Guard<'_>, PrimitiveFailure>;

    /// Takes the lock if it is free. `Ok(None)` means it is held elsewhere.
    fn try_acquire(&self) -> Result<Option<Self::Guard<'_>>, PrimitiveFailure>;
}

impl<T> TraceableLock for parking_lot::Mutex<T> {
    type Guard<'a>
        = parking_lot::MutexGuard<'a, T>
    where
        Self: 'a;

    fn acquire(&self) -> Result<Self::Guard<'_>, PrimitiveFailure> {
        Ok(self.lock())
    }

    fn try_acquire(&self) -> Result<Option<Self::Guard<'_>>, PrimitiveFailure> {
        Ok(self.try_lock())
    }
}

impl<T> TraceableLock for std::sync::Mutex<T> {
    type Guard<'a>
        = std::sync::MutexGuard<'a, T>
    where
        Self: 'a;

    fn acquire(&self) -> Result<Self::Guard<'_>, PrimitiveFailure> {
        self.lock().map_err(|_| PrimitiveFailure::Poisoned)
    }

    fn try_acquire(&self) -> Result<Option<Self::Guard<'_>>, PrimitiveFailure> {
        match self.try_lock() {
            Ok(guard) => Ok(Some(guard)),
            Err(std::sync::TryLockError::WouldBlock) => Ok(None),
            Err(std::sync::TryLockError::Poisoned(_)) => Err(PrimitiveFailure::Poisoned),
        }
    }
}
