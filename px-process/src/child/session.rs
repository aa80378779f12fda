//! The process-control session and the syscall channel

use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use std::sync::{Mutex, MutexGuard, PoisonError};

use px_api::error::invalid_state;
use px_api::{CapIssuer, CapKind, Capability, Result, RpcObject, SessionCall, SessionReply, Sysio, WakeUp};
use px_api::syscall::SYSIO_DS_SIZE;

use super::Child;
use crate::sync::Semaphore;

/// Session object through which a process issues its syscalls
pub struct SessionComponent {
    child: Weak<Child>,
}

impl SessionComponent {
    pub fn new(child: Weak<Child>) -> Self {
        Self { child }
    }
}

impl RpcObject for SessionComponent {
    fn kind(&self) -> CapKind {
        CapKind::Session
    }

    fn dispatch(&self, call: SessionCall) -> Result<SessionReply> {
        let child = self.child.upgrade().ok_or_else(|| invalid_state("process is gone"))?;
        match call {
            SessionCall::Syscall(syscall) => Ok(SessionReply::Done(child.syscall(syscall))),
            SessionCall::SysioDataspace => Ok(SessionReply::Cap(child.sysio_dataspace())),
        }
    }
}

/// Region holding the parameters of the one syscall in flight
pub struct SysioChannel {
    cap: Capability,
    caps: Arc<dyn CapIssuer>,
    block: Mutex<Box<Sysio>>,
}

impl SysioChannel {
    pub fn new(caps: Arc<dyn CapIssuer>) -> Self {
        Self {
            cap: caps.issue(CapKind::Dataspace),
            caps,
            block: Mutex::new(Box::default()),
        }
    }

    pub fn cap(&self) -> Capability {
        self.cap
    }

    /// Size of the region, a whole number of pages
    pub fn size(&self) -> usize {
        SYSIO_DS_SIZE
    }

    pub fn lock(&self) -> MutexGuard<'_, Box<Sysio>> {
        self.block.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SysioChannel {
    fn drop(&mut self) {
        self.caps.revoke(self.cap);
    }
}

/// Wakes a process blocked on an I/O channel
pub struct ChildWakeUp {
    blocker: Arc<Semaphore>,
}

impl ChildWakeUp {
    pub fn new(blocker: Arc<Semaphore>) -> Self {
        Self { blocker }
    }
}

impl WakeUp for ChildWakeUp {
    fn wake_up(&self) {
        self.blocker.up();
    }
}
