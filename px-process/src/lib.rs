//! PX Process
//!
//! This crate is the process-management core of the POSIX personality. It
//! creates, tracks and tears down processes, manages their resource
//! sessions, and implements the parent/child semantics of spawn, fork,
//! execve, exit and wait.
//!
//! # Architecture
//!
//! - **Pid**: The PID allocator
//! - **Family**: The process tree and its blocking wait protocol
//! - **Resources**: Per-process RAM, CPU and RM sessions
//! - **Child**: The process itself
//! - **Syscall**: Handlers for the syscalls a process issues
//! - **Entrypoint**: The dispatch thread serving a process's session
//! - **Signal**/**Control**: Exit and cleanup notifications and their driver loop
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use px_api::{CapIssuer, Capability, LocalCapIssuer, Result, Vfs, CapKind};
//! use px_process::{Child, ChildEnv, ProcessConfig, RpcEntrypoint};
//! use px_services::ServiceRegistry;
//!
//! struct Rom(LocalCapIssuer);
//!
//! impl Vfs for Rom {
//!     fn dataspace_from_file(&self, _path: &str) -> Result<Capability> {
//!         Ok(self.0.issue(CapKind::Dataspace))
//!     }
//!     fn release_dataspace(&self, _cap: Capability) {}
//! }
//!
//! let caps: Arc<dyn CapIssuer> = Arc::new(LocalCapIssuer::new());
//! let resources_ep = Arc::new(RpcEntrypoint::new("resources", 256 * 1024, caps.clone()));
//! let env = ChildEnv::new(
//!     caps,
//!     Arc::new(Rom(LocalCapIssuer::new())),
//!     Arc::new(ServiceRegistry::new()),
//!     resources_ep,
//!     ProcessConfig::default(),
//! );
//!
//! let pid = env.pids.alloc();
//! let init = Child::new("init", None, pid, &env, &["init"], &[], false).unwrap();
//! init.start().unwrap();
//! assert!(init.is_root());
//! ```

extern crate alloc;

#[macro_use]
pub mod logging;

pub mod child;
pub mod config;
pub mod control;
pub mod entrypoint;
pub mod family;
pub mod fd;
pub mod pid;
pub mod resources;
pub mod rm_service;
pub mod signal;
pub mod sync;
pub mod syscall;

// Re-export commonly used items
pub use child::{Child, ChildEnv, Lifecycle};
pub use config::ProcessConfig;
pub use control::{CleanupDispatcher, ControlLoop, ExitDispatcher, InitSlot};
pub use entrypoint::RpcEntrypoint;
pub use family::{FamilyMember, Member};
pub use fd::FdRegistry;
pub use pid::PidAllocator;
pub use resources::Resources;
pub use rm_service::LocalRmService;
pub use signal::{SignalContext, SignalDispatcher, SignalReceiver};
pub use sync::Semaphore;
pub use syscall::{SyscallDispatcher, SyscallHandler, get_dispatcher};
