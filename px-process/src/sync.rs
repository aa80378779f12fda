//! Blocking primitives
//!
//! Node-scoped state is guarded by `spin` locks. Suspending a thread until
//! another one signals needs a real sleeping primitive, provided here.

use std::sync::{Condvar, Mutex, PoisonError};

/// Counting semaphore
///
/// An `up` that happens before the matching `down` is remembered, so the
/// waiter returns immediately instead of missing the wakeup.
#[derive(Debug, Default)]
pub struct Semaphore {
    count: Mutex<usize>,
    cond: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `initial` permits
    pub const fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            cond: Condvar::new(),
        }
    }

    /// Add one permit, waking a blocked `down`
    pub fn up(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count += 1;
        self.cond.notify_one();
    }

    /// Take one permit, blocking until one is available
    pub fn down(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        while *count == 0 {
            count = self.cond.wait(count).unwrap_or_else(PoisonError::into_inner);
        }
        *count -= 1;
    }

    /// Take one permit if available
    pub fn try_down(&self) -> bool {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Permits currently available
    pub fn count(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
