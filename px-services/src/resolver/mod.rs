//! Per-process resolution chain
//!
//! Policies are consulted in the order they were added; the first one that
//! claims a request wins. Requests nobody claims fall through to the
//! registry inherited from the parent, which may itself fail the request.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use px_api::error::not_found;
use px_api::{Capability, Result};

use crate::core::Service;
use crate::policy::{LabelingPolicy, SessionPolicy};
use crate::registry::ServiceRegistry;

/// Ordered chain of providers for one process
pub struct ServiceResolver {
    policies: Vec<Box<dyn SessionPolicy>>,
    parent_services: Arc<ServiceRegistry>,
    labeling: LabelingPolicy,
}

impl ServiceResolver {
    /// Create an empty chain for the process called `label`
    pub fn new(label: &str, parent_services: Arc<ServiceRegistry>) -> Self {
        Self {
            policies: Vec::new(),
            parent_services,
            labeling: LabelingPolicy::new(label),
        }
    }

    /// Append a policy behind the ones already present
    pub fn with_policy<P: SessionPolicy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    /// Number of local policies ahead of the parent registry
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the chain consists of the parent registry only
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Registry consulted after all local policies
    pub fn parent_services(&self) -> &Arc<ServiceRegistry> {
        &self.parent_services
    }

    /// Find the provider for a session request
    pub fn resolve_session_request(&self, service_name: &str, args: &str) -> Option<Arc<dyn Service>> {
        self.policies
            .iter()
            .find_map(|policy| policy.resolve_session_request(service_name, args))
            .or_else(|| self.parent_services.find(service_name))
    }

    /// Apply the label-enforcement policy to outgoing request arguments
    pub fn filter_session_args(&self, service_name: &str, args: &mut String, capacity: usize) -> Result<()> {
        self.labeling.filter_session_args(service_name, args, capacity).inspect_err(|_e| {
            #[cfg(feature = "log")]
            log::warn!("label for {} session does not fit: {}", service_name, _e);
        })
    }

    /// Filter the arguments, resolve the provider and open the session
    pub fn session(&self, service_name: &str, args: &mut String, capacity: usize) -> Result<Capability> {
        self.filter_session_args(service_name, args, capacity)?;

        match self.resolve_session_request(service_name, args) {
            Some(service) => service.session(args),
            None => {
                #[cfg(feature = "log")]
                log::debug!("no provider for {} session ({})", service_name, args);
                Err(not_found(service_name))
            }
        }
    }
}
