//! Request-dispatch service interface
//!
//! Session objects become reachable by registering them with an entrypoint,
//! which hands back a capability. Registration is paired with exactly one
//! deregistration; [`Managed`] enforces this by dissolving on drop.

use alloc::sync::Arc;
use core::fmt;

use crate::capability::{CapKind, Capability};
use crate::error::{Result, not_implemented};
use crate::syscall::Syscall;

/// Call delivered to a session object through its entrypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCall {
    /// Perform one syscall with its payload in the syscall channel
    Syscall(Syscall),
    /// Obtain the capability of the syscall channel
    SysioDataspace,
}

/// Reply to a [`SessionCall`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionReply {
    /// Syscall outcome
    Done(bool),
    /// Capability result
    Cap(Capability),
}

/// Object that can be served by an entrypoint
pub trait RpcObject: Send + Sync {
    /// Kind of capability that refers to this object
    fn kind(&self) -> CapKind;

    /// Handle one incoming call
    fn dispatch(&self, call: SessionCall) -> Result<SessionReply> {
        let _ = call;
        Err(not_implemented("session call"))
    }
}

/// Request-dispatch service
pub trait Entrypoint: Send + Sync {
    /// Register `object`, returning the capability that refers to it
    fn manage(&self, object: Arc<dyn RpcObject>) -> Capability;

    /// Deregister the object referred to by `cap`
    fn dissolve(&self, cap: Capability);
}

/// Scoped registration with an entrypoint
///
/// The object stays registered exactly as long as the guard lives.
pub struct Managed {
    cap: Capability,
    ep: Arc<dyn Entrypoint>,
}

impl Managed {
    /// Register `object` with `ep`
    pub fn new(ep: &Arc<dyn Entrypoint>, object: Arc<dyn RpcObject>) -> Self {
        let cap = ep.manage(object);
        Self {
            cap,
            ep: ep.clone(),
        }
    }

    /// Capability of the registered object
    pub fn cap(&self) -> Capability {
        self.cap
    }
}

impl Drop for Managed {
    fn drop(&mut self) {
        self.ep.dissolve(self.cap);
    }
}

impl fmt::Debug for Managed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Managed").field("cap", &self.cap).finish()
    }
}
