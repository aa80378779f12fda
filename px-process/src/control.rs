//! Exit and cleanup notifications, and the loop that drives them
//!
//! Destroying a process from its own entrypoint thread would free the
//! context that thread runs in. Both the root's exit and the destruction of
//! an exec'd process are therefore delivered as signals and handled by the
//! [`ControlLoop`], on a thread no process owns.

use alloc::sync::Arc;

use spin::Mutex;

use crate::child::Child;
use crate::family::Member;
use crate::signal::{SignalDispatcher, SignalReceiver};

/// Reacts to a process's exit notification
#[derive(Debug)]
pub struct ExitDispatcher {
    root: bool,
}

impl ExitDispatcher {
    pub fn new(root: bool) -> Self {
        Self { root }
    }
}

impl SignalDispatcher for ExitDispatcher {
    fn dispatch(&self, receiver: &SignalReceiver) {
        if self.root {
            px_info!("init process exited");
            receiver.request_shutdown();
        }
    }
}

/// Destroys a process that was replaced by execve
///
/// Holds the last reference the process keeps on itself until the cleanup
/// signal is delivered.
#[derive(Default)]
pub struct CleanupDispatcher {
    pending: Mutex<Option<Arc<Child>>>,
}

impl CleanupDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule(&self, child: Arc<Child>) {
        *self.pending.lock() = Some(child);
    }

    /// Whether a process is waiting to be destroyed
    pub fn is_scheduled(&self) -> bool {
        self.pending.lock().is_some()
    }
}

impl SignalDispatcher for CleanupDispatcher {
    fn dispatch(&self, _receiver: &SignalReceiver) {
        let Some(child) = self.pending.lock().take() else {
            return;
        };
        px_info!("execve cleanup for {} (pid {})", child.name(), child.pid());
        // the execve call may still be in flight on the old entrypoint and
        // hold a reference; after the join no reference is left on that thread
        if let Err(_err) = child.entrypoint().deactivate() {
            px_error!("cannot stop entrypoint of {}: {}", child.name(), _err);
        }
        drop(child);
    }
}

/// Holder of the root process
#[derive(Default)]
pub struct InitSlot {
    child: Mutex<Option<Arc<Child>>>,
}

impl InitSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `child` as the root process, returning the previous one
    pub fn set(&self, child: Arc<Child>) -> Option<Arc<Child>> {
        self.child.lock().replace(child)
    }

    pub fn get(&self) -> Option<Arc<Child>> {
        self.child.lock().clone()
    }

    pub fn take(&self) -> Option<Arc<Child>> {
        self.child.lock().take()
    }
}

/// Top-level driver dispatching notifications until the root exits
pub struct ControlLoop {
    signals: Arc<SignalReceiver>,
    init: Arc<InitSlot>,
}

impl ControlLoop {
    pub fn new(signals: Arc<SignalReceiver>, init: Arc<InitSlot>) -> Self {
        Self { signals, init }
    }

    /// Dispatch signals until shutdown is requested
    ///
    /// Releases the root process afterwards and returns its exit status.
    pub fn run(&self) -> Option<i32> {
        while !self.signals.shutdown_requested() {
            self.signals.wait_and_dispatch();
        }
        // destroy exec'd incarnations queued before the shutdown
        self.signals.dispatch_pending();

        let init = self.init.take()?;
        let status = init.family().exit_status();
        px_info!("shutting down, init exited with {:?}", status);
        status
    }
}
