//! PX API - Core interfaces and types for the POSIX personality
//!
//! This crate provides the vocabulary shared by the process-management core
//! and the collaborators it is hosted on: identifiers, capabilities, the
//! common error type, the syscall parameter block, and the traits through
//! which the core consumes the dispatch service, the capability issuer and
//! the virtual file system.
//!
//! # Architecture
//!
//! - **Core**: Fundamental types and constants
//! - **Error**: Common error type and the syscall-level error class
//! - **Capability**: Unforgeable references and their issuer
//! - **Rpc**: Dispatch-service registration with scoped deregistration
//! - **Syscall**: Syscall identifiers and the shared `Sysio` block
//! - **Interfaces**: Virtual file system and I/O channel contracts
//!
//! # Usage
//!
//! ```rust
//! use px_api::capability::{CapIssuer, CapKind, LocalCapIssuer};
//!
//! let issuer = LocalCapIssuer::new();
//! let cap = issuer.issue(CapKind::Dataspace);
//! assert!(cap.is_valid());
//! ```

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// Core modules
pub mod capability;
pub mod core;
pub mod error;
pub mod interfaces;
pub mod rpc;
pub mod syscall;

// Re-export commonly used types
pub use crate::capability::{CapIssuer, CapKind, Capability, LocalCapIssuer};
pub use crate::core::types::*;
pub use crate::error::{Error, Result, SysError};
pub use crate::interfaces::{IoChannel, Vfs, WakeUp};
pub use crate::rpc::{Entrypoint, Managed, RpcObject, SessionCall, SessionReply};
pub use crate::syscall::{Syscall, Sysio};
