//! Per-process resource sessions
//!
//! A process owns one [`Resources`] bundle: a RAM session, a CPU session and
//! an RM session, all registered with a shared entrypoint for as long as the
//! bundle exists. The RAM and RM sessions share one [`DataspaceRegistry`].

pub mod cpu;
pub mod dataspace;
pub mod ram;
pub mod rm;

use alloc::sync::Arc;

use px_api::{CapIssuer, Capability, Entrypoint, Managed};

use crate::config::ProcessConfig;

pub use cpu::{CpuSession, MainThread};
pub use dataspace::{Dataspace, DataspaceRegistry};
pub use ram::RamSession;
pub use rm::{RegionInfo, RmSession};

/// Resource sessions of one process
pub struct Resources {
    // registrations go first so they are dissolved before the sessions drop
    ram_guard: Managed,
    cpu_guard: Managed,
    rm_guard: Managed,
    ram: Arc<RamSession>,
    cpu: Arc<CpuSession>,
    rm: Arc<RmSession>,
    ds_registry: Arc<DataspaceRegistry>,
}

impl Resources {
    /// Build the sessions for process `label` and register them with `ep`
    pub fn new(
        label: &str,
        forked: bool,
        ep: &Arc<dyn Entrypoint>,
        caps: &Arc<dyn CapIssuer>,
        config: &ProcessConfig,
    ) -> Self {
        let ds_registry = Arc::new(DataspaceRegistry::new(caps.clone()));
        let ram = Arc::new(RamSession::new(ds_registry.clone(), config.ram_quota, config.page_size));
        let cpu = Arc::new(CpuSession::new(label, forked));
        let rm = Arc::new(RmSession::new(ds_registry.clone(), config.page_size));

        Self {
            ram_guard: Managed::new(ep, ram.clone()),
            cpu_guard: Managed::new(ep, cpu.clone()),
            rm_guard: Managed::new(ep, rm.clone()),
            ram,
            cpu,
            rm,
            ds_registry,
        }
    }

    pub fn ds_registry(&self) -> &Arc<DataspaceRegistry> {
        &self.ds_registry
    }

    pub fn ram(&self) -> &Arc<RamSession> {
        &self.ram
    }

    pub fn cpu(&self) -> &Arc<CpuSession> {
        &self.cpu
    }

    pub fn rm(&self) -> &Arc<RmSession> {
        &self.rm
    }

    pub fn ram_cap(&self) -> Capability {
        self.ram_guard.cap()
    }

    pub fn cpu_cap(&self) -> Capability {
        self.cpu_guard.cap()
    }

    pub fn rm_cap(&self) -> Capability {
        self.rm_guard.cap()
    }
}
