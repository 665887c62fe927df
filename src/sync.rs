//! Poison recovery for the mutexes shared between restore tasks
//!
//! Guards poisoned by a panicking task are recovered so the progress counter
//! and the error accumulator stay usable while the other tasks finish. The
//! panic itself is not caught: it is re-raised when the restore scope joins.

use std::sync::{Mutex, MutexGuard};

/// Extension trait for Mutex with poison recovery
pub trait MutexExt<T> {
    /// Lock the mutex, recovering the guard if another task panicked while holding it
    fn lock_recovered(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexExt<T> for Mutex<T> {
    fn lock_recovered(&self) -> MutexGuard<'_, T> {
        match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Mutex was poisoned by a panicked restore task, recovering");
                poisoned.into_inner()
            }
        }
    }
}
