//! Core service interfaces and types
//!
//! This module provides the session-provider trait and the trivial local
//! provider that hands out one fixed capability.

use alloc::string::{String, ToString};

use px_api::{Capability, Result};

/// Well-known service names
pub mod service_name {
    /// Read-only memory region (binary image, arguments, environment)
    pub const ROM: &str = "ROM";
    /// Address-space (region map) management
    pub const RM: &str = "RM";
    /// Process-control session carrying the syscall interface
    pub const SESSION: &str = "Px";
}

/// Session provider
pub trait Service: Send + Sync {
    /// Get the service name
    fn name(&self) -> &str;

    /// Open a session, returning its capability
    fn session(&self, args: &str) -> Result<Capability>;

    /// Transfer additional quota to an existing session
    fn upgrade(&self, cap: Capability, args: &str) -> Result<()> {
        let _ = (cap, args);
        Ok(())
    }

    /// Close a session
    fn close(&self, cap: Capability) {
        let _ = cap;
    }
}

/// Provider that answers every session request with the same capability
#[derive(Debug, Clone)]
pub struct LocalService {
    name: String,
    cap: Capability,
}

impl LocalService {
    /// Create a new local service
    ///
    /// # Arguments
    ///
    /// * `name` - Service name the provider answers to
    /// * `cap` - Capability returned on session requests
    pub fn new(name: &str, cap: Capability) -> Self {
        Self {
            name: name.to_string(),
            cap,
        }
    }

    /// Capability handed out by this provider
    pub fn cap(&self) -> Capability {
        self.cap
    }
}

impl Service for LocalService {
    fn name(&self) -> &str {
        &self.name
    }

    fn session(&self, _args: &str) -> Result<Capability> {
        Ok(self.cap)
    }
}
