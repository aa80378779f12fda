//! Memory-allocation session

use alloc::sync::Arc;

use hashbrown::HashMap;
use px_api::{CapKind, Capability, Error, Result, RpcObject, Size};
use px_api::error::not_found;
use spin::Mutex;

use super::dataspace::DataspaceRegistry;

struct Accounting {
    used: Size,
    allocations: HashMap<Capability, Size>,
}

/// Hands out dataspaces charged against a quota
pub struct RamSession {
    registry: Arc<DataspaceRegistry>,
    quota: Size,
    page_size: Size,
    accounting: Mutex<Accounting>,
}

impl RamSession {
    pub fn new(registry: Arc<DataspaceRegistry>, quota: Size, page_size: Size) -> Self {
        Self {
            registry,
            quota,
            page_size,
            accounting: Mutex::new(Accounting {
                used: 0,
                allocations: HashMap::new(),
            }),
        }
    }

    /// Allocate a dataspace of at least `size` bytes
    pub fn alloc(&self, size: Size) -> Result<Capability> {
        let size = size
            .div_ceil(self.page_size)
            .max(1)
            .checked_mul(self.page_size)
            .ok_or(Error::QuotaExceeded)?;

        let mut accounting = self.accounting.lock();
        let used = accounting.used.checked_add(size).ok_or(Error::QuotaExceeded)?;
        if used > self.quota {
            return Err(Error::QuotaExceeded);
        }
        let cap = self.registry.create(size).cap();
        accounting.used += size;
        accounting.allocations.insert(cap, size);
        Ok(cap)
    }

    /// Free a dataspace obtained from [`RamSession::alloc`]
    pub fn free(&self, cap: Capability) -> Result<()> {
        let mut accounting = self.accounting.lock();
        let size = accounting
            .allocations
            .remove(&cap)
            .ok_or_else(|| not_found("dataspace"))?;
        accounting.used -= size;
        self.registry.remove(cap);
        Ok(())
    }

    /// Bytes currently allocated
    pub fn used(&self) -> Size {
        self.accounting.lock().used
    }

    pub fn quota(&self) -> Size {
        self.quota
    }
}

impl RpcObject for RamSession {
    fn kind(&self) -> CapKind {
        CapKind::Ram
    }
}
