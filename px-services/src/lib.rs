//! PX Services
//!
//! This crate answers the question "who serves this session request" for a
//! process. Each process owns a [`ServiceResolver`]: an ordered chain of
//! local providers (its binary image, argument and environment blobs, its own
//! process-control session, its address-space service) that falls back to the
//! registry of providers inherited from its parent.
//!
//! # Architecture
//!
//! - **Args**: Session argument strings (`key=value, key2="text"`)
//! - **Core**: The [`Service`] provider trait and local providers
//! - **Registry**: Providers inherited from the parent
//! - **Policy**: Chain entries and the label-enforcement policy
//! - **Resolver**: The per-process resolution chain
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use px_api::{CapIssuer, CapKind, LocalCapIssuer};
//! use px_services::{RomFilePolicy, ServiceRegistry, ServiceResolver};
//!
//! let caps = LocalCapIssuer::new();
//! let parent = Arc::new(ServiceRegistry::new());
//! let resolver = ServiceResolver::new("init", parent)
//!     .with_policy(RomFilePolicy::new("args", Some(caps.issue(CapKind::Dataspace))));
//!
//! assert!(resolver.resolve_session_request("ROM", "filename=\"args\"").is_some());
//! ```

#![no_std]

extern crate alloc;

// Core modules
pub mod args;
pub mod core;
pub mod policy;
pub mod registry;
pub mod resolver;

// Re-export commonly used items
pub use crate::core::{LocalService, Service, service_name};
pub use policy::{LabelingPolicy, RomFilePolicy, ServicePolicy, SessionPolicy};
pub use registry::ServiceRegistry;
pub use resolver::ServiceResolver;
