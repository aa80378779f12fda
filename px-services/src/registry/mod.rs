//! Service registry
//!
//! This module provides the registry of providers a process inherits from
//! its parent. It is the last stage of every resolution chain and is shared
//! by all processes of one parent.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use px_api::{Error, Result};
use spin::RwLock;

use crate::core::Service;

/// Service information
#[derive(Clone)]
pub struct ServiceInfo {
    /// Service ID
    pub id: u32,
    /// Service name
    pub name: String,
    /// Service implementation
    pub service: Arc<dyn Service>,
}

struct Inner {
    /// Registered services
    services: BTreeMap<u32, ServiceInfo>,
    /// Services by name
    services_by_name: BTreeMap<String, u32>,
    /// Next available service ID
    next_id: u32,
}

/// Service registry
pub struct ServiceRegistry {
    inner: RwLock<Inner>,
}

impl ServiceRegistry {
    /// Create a new service registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                services: BTreeMap::new(),
                services_by_name: BTreeMap::new(),
                next_id: 1000, // Start from 1000 to avoid conflicts
            }),
        }
    }

    /// Register a service under its own name
    pub fn register(&self, service: Arc<dyn Service>) -> Result<u32> {
        let mut inner = self.inner.write();
        let name = service.name().to_string();

        if inner.services_by_name.contains_key(&name) {
            return Err(Error::InvalidState(format!("Service {} already exists", name)));
        }

        let id = inner.next_id;
        inner.next_id += 1;

        inner.services_by_name.insert(name.clone(), id);
        inner.services.insert(id, ServiceInfo { id, name, service });

        Ok(id)
    }

    /// Unregister a service
    pub fn unregister(&self, id: u32) -> Result<()> {
        let mut inner = self.inner.write();
        let info = inner
            .services
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("Service {} not found", id)))?;

        inner.services_by_name.remove(&info.name);
        Ok(())
    }

    /// Get a service by ID
    pub fn get(&self, id: u32) -> Option<ServiceInfo> {
        self.inner.read().services.get(&id).cloned()
    }

    /// Find a service by name
    pub fn find(&self, name: &str) -> Option<Arc<dyn Service>> {
        let inner = self.inner.read();
        inner
            .services_by_name
            .get(name)
            .and_then(|id| inner.services.get(id))
            .map(|info| info.service.clone())
    }

    /// List the names of all registered services
    pub fn list(&self) -> Vec<String> {
        self.inner.read().services_by_name.keys().cloned().collect()
    }

    /// Number of registered services
    pub fn count(&self) -> usize {
        self.inner.read().services.len()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
