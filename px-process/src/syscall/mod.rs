//! Syscall dispatch
//!
//! Each syscall is served by a [`SyscallHandler`] registered with the
//! process-wide [`SyscallDispatcher`]. Handlers read their arguments from
//! the caller's syscall channel and store their results there.

pub mod io;
pub mod process;

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;

use px_api::error::not_implemented;
use px_api::{Result, Syscall, Sysio};
use spin::Once;

use crate::child::Child;

/// Implementation of one syscall
pub trait SyscallHandler: Send + Sync {
    /// Perform the syscall for `child`
    fn execute(&self, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()>;

    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Syscall this handler serves
    fn id(&self) -> Syscall;
}

/// Table of syscall handlers
pub struct SyscallDispatcher {
    handlers: BTreeMap<u32, Box<dyn SyscallHandler>>,
}

impl SyscallDispatcher {
    /// Create a dispatcher without handlers
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Register `handler`, replacing any handler for the same syscall
    pub fn register_handler(&mut self, handler: Box<dyn SyscallHandler>) {
        self.handlers.insert(handler.id() as u32, handler);
    }

    pub fn get_handler(&self, id: Syscall) -> Option<&dyn SyscallHandler> {
        self.handlers.get(&(id as u32)).map(|handler| handler.as_ref())
    }

    /// Run the handler for `id`
    pub fn dispatch(&self, id: Syscall, child: &Arc<Child>, sysio: &mut Sysio) -> Result<()> {
        let Some(handler) = self.get_handler(id) else {
            px_error!("no handler for syscall {}", id.name());
            return Err(not_implemented(id.name()));
        };
        px_trace!("{} (pid {}): {}", child.name(), child.pid(), handler.name());
        handler.execute(child, sysio)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for SyscallDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

static DISPATCHER: Once<SyscallDispatcher> = Once::new();

/// The dispatcher with every built-in handler registered
pub fn get_dispatcher() -> &'static SyscallDispatcher {
    DISPATCHER.call_once(|| {
        let mut dispatcher = SyscallDispatcher::new();
        io::register_handlers(&mut dispatcher);
        process::register_handlers(&mut dispatcher);
        dispatcher
    })
}
