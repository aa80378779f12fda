//! PID allocation

use px_api::Pid;
use spin::Mutex;

/// Issues process identifiers, never handing out the same one twice
///
/// One allocator is shared by every process of a system and passed to the
/// places that create processes.
#[derive(Debug)]
pub struct PidAllocator {
    next: Mutex<Pid>,
}

impl PidAllocator {
    /// Create an allocator whose first PID is 0
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create an allocator whose first PID is `first`
    pub const fn starting_at(first: Pid) -> Self {
        Self {
            next: Mutex::new(first),
        }
    }

    /// Hand out a fresh PID
    pub fn alloc(&self) -> Pid {
        let mut next = self.next.lock();
        let pid = *next;
        *next += 1;
        pid
    }

    /// PID the next call to [`PidAllocator::alloc`] returns
    pub fn peek(&self) -> Pid {
        *self.next.lock()
    }
}

impl Default for PidAllocator {
    fn default() -> Self {
        Self::new()
    }
}
