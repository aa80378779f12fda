//! Locally implemented RM service
//!
//! Callers that manage a sub-region of their own address space (a dynamic
//! linker, for one) open extra RM sessions. These are served by the process
//! itself and share its dataspace registry.

use alloc::sync::Arc;

use hashbrown::HashMap;
use px_api::{Capability, Entrypoint, Managed, Result, Size};
use px_services::{Service, service_name};
use spin::Mutex;

use crate::resources::{DataspaceRegistry, RmSession};

pub struct LocalRmService {
    ep: Arc<dyn Entrypoint>,
    registry: Arc<DataspaceRegistry>,
    page_size: Size,
    sessions: Mutex<HashMap<Capability, (Arc<RmSession>, Managed)>>,
}

impl LocalRmService {
    pub fn new(ep: Arc<dyn Entrypoint>, registry: Arc<DataspaceRegistry>, page_size: Size) -> Self {
        Self {
            ep,
            registry,
            page_size,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The session object behind `cap`
    pub fn rm_session(&self, cap: Capability) -> Option<Arc<RmSession>> {
        self.sessions.lock().get(&cap).map(|(session, _)| session.clone())
    }

    /// Number of open sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl Service for LocalRmService {
    fn name(&self) -> &str {
        service_name::RM
    }

    fn session(&self, _args: &str) -> Result<Capability> {
        let session = Arc::new(RmSession::new(self.registry.clone(), self.page_size));
        let guard = Managed::new(&self.ep, session.clone());
        let cap = guard.cap();
        self.sessions.lock().insert(cap, (session, guard));
        Ok(cap)
    }

    fn close(&self, cap: Capability) {
        let closed = self.sessions.lock().remove(&cap);
        if closed.is_none() {
            px_warn!("close of unknown RM session {:?}", cap);
        }
    }
}
