//! Collaborators shared by the processes of one system

use alloc::sync::Arc;

use px_api::{CapIssuer, Entrypoint, Vfs};
use px_services::ServiceRegistry;

use crate::config::ProcessConfig;
use crate::control::InitSlot;
use crate::pid::PidAllocator;
use crate::signal::SignalReceiver;

/// Everything a process needs from its surroundings
///
/// Cloning is cheap; forked and exec'd processes inherit the environment of
/// the process that created them.
#[derive(Clone)]
pub struct ChildEnv {
    /// Source of fresh PIDs
    pub pids: Arc<PidAllocator>,
    /// Receiver for exit and cleanup notifications
    pub signals: Arc<SignalReceiver>,
    /// File system binaries are loaded from
    pub vfs: Arc<dyn Vfs>,
    /// Issuer for every capability the core hands out
    pub caps: Arc<dyn CapIssuer>,
    /// Providers inherited from the parent
    pub parent_services: Arc<ServiceRegistry>,
    /// Entrypoint serving the resource sessions
    pub resources_ep: Arc<dyn Entrypoint>,
    /// Holder of the root process
    pub init: Arc<InitSlot>,
    pub config: ProcessConfig,
}

impl ChildEnv {
    /// Create an environment with a fresh PID allocator, signal receiver
    /// and init slot
    pub fn new(
        caps: Arc<dyn CapIssuer>,
        vfs: Arc<dyn Vfs>,
        parent_services: Arc<ServiceRegistry>,
        resources_ep: Arc<dyn Entrypoint>,
        config: ProcessConfig,
    ) -> Self {
        Self {
            pids: Arc::new(PidAllocator::new()),
            signals: SignalReceiver::new(caps.clone()),
            vfs,
            caps,
            parent_services,
            resources_ep,
            init: Arc::new(InitSlot::new()),
            config,
        }
    }
}
