//! Resolution chain entries
//!
//! A [`SessionPolicy`] either claims a session request by returning the
//! provider that serves it, or passes. The [`LabelingPolicy`] is not part of
//! the chain; it rewrites the arguments of every outgoing request.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;

use px_api::{Capability, Result};

use crate::args;
use crate::core::service_name as names;
use crate::core::{LocalService, Service};

/// One entry of a resolution chain
pub trait SessionPolicy: Send + Sync {
    /// Provider for the request, or `None` to pass it on
    fn resolve_session_request(&self, service_name: &str, args: &str) -> Option<Arc<dyn Service>>;
}

/// Serves one named read-only region through the `ROM` service
pub struct RomFilePolicy {
    filename: String,
    service: Option<Arc<LocalService>>,
}

impl RomFilePolicy {
    /// Create a policy for `filename` backed by `ds`
    ///
    /// Without a dataspace the policy never claims a request.
    pub fn new(filename: &str, ds: Option<Capability>) -> Self {
        Self {
            filename: filename.to_string(),
            service: ds.map(|cap| Arc::new(LocalService::new(names::ROM, cap))),
        }
    }

    /// File name this policy answers to
    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn requested_file<'a>(args: &'a str) -> Option<&'a str> {
        if let Some(name) = args::string_arg(args, "filename") {
            return Some(name);
        }
        // labels are chained as "outer -> inner", the last element names the file
        args::string_arg(args, "label").map(|label| label.rsplit(" -> ").next().unwrap_or(label))
    }
}

impl SessionPolicy for RomFilePolicy {
    fn resolve_session_request(&self, service_name: &str, args: &str) -> Option<Arc<dyn Service>> {
        if service_name != names::ROM {
            return None;
        }
        let service = self.service.as_ref()?;
        match Self::requested_file(args) {
            Some(name) if name == self.filename => Some(service.clone() as Arc<dyn Service>),
            _ => None,
        }
    }
}

/// Claims every request for one service name
pub struct ServicePolicy {
    service: Arc<dyn Service>,
}

impl ServicePolicy {
    /// Create a policy answering with `service` for its own name
    pub fn new(service: Arc<dyn Service>) -> Self {
        Self { service }
    }
}

impl SessionPolicy for ServicePolicy {
    fn resolve_session_request(&self, service_name: &str, _args: &str) -> Option<Arc<dyn Service>> {
        (service_name == self.service.name()).then(|| self.service.clone())
    }
}

/// Makes the requesting process's name evident in every session label
#[derive(Debug, Clone)]
pub struct LabelingPolicy {
    name: String,
}

impl LabelingPolicy {
    /// Create a labeling policy for the process called `name`
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Prefix the request's label with the process name
    ///
    /// `capacity` is the size of the argument buffer, see [`args::set_arg`].
    pub fn filter_session_args(&self, _service: &str, args: &mut String, capacity: usize) -> Result<()> {
        let value = match args::string_arg(args, "label") {
            Some(label) if !label.is_empty() => format!("\"{} -> {}\"", self.name, label),
            _ => format!("\"{}\"", self.name),
        };
        args::set_arg(args, capacity, "label", &value)
    }
}
