//! Address-space (region map) session

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;

use px_api::error::{invalid_argument, invalid_state, not_found};
use px_api::{Addr, CapKind, Capability, Error, Result, RpcObject, Size};
use spin::Mutex;

use super::dataspace::{Dataspace, DataspaceRegistry};

/// First address used when the caller leaves placement to the session
const AUTO_PLACE_BASE: Addr = 0x1000_0000;

#[derive(Clone)]
struct Region {
    ds: Arc<Dataspace>,
    size: Size,
}

/// Attached dataspace as reported by [`RmSession::regions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
    pub base: Addr,
    pub size: Size,
    pub ds: Capability,
}

/// Layout of one process's address space
///
/// Regions are keyed by their base address and never overlap.
pub struct RmSession {
    registry: Arc<DataspaceRegistry>,
    page_size: Size,
    regions: Mutex<BTreeMap<Addr, Region>>,
}

impl RmSession {
    pub fn new(registry: Arc<DataspaceRegistry>, page_size: Size) -> Self {
        Self {
            registry,
            page_size,
            regions: Mutex::new(BTreeMap::new()),
        }
    }

    /// Dataspaces this session can attach
    pub fn registry(&self) -> &Arc<DataspaceRegistry> {
        &self.registry
    }

    /// Attach `ds` at `local_addr`, or at a free address when `None`
    ///
    /// Returns the base address of the new region.
    pub fn attach(&self, ds: Capability, local_addr: Option<Addr>) -> Result<Addr> {
        let ds = self.registry.get(ds).ok_or_else(|| not_found("dataspace"))?;
        let size = ds
            .size()
            .div_ceil(self.page_size)
            .max(1)
            .checked_mul(self.page_size)
            .ok_or_else(|| invalid_argument("region size overflow"))?;

        let mut regions = self.regions.lock();
        let base = match local_addr {
            Some(addr) => {
                if addr % self.page_size != 0 {
                    return Err(invalid_argument("unaligned attach address"));
                }
                addr
            }
            None => regions
                .iter()
                .next_back()
                .map(|(base, region)| base + region.size)
                .unwrap_or(AUTO_PLACE_BASE)
                .max(AUTO_PLACE_BASE),
        };

        let end = base.checked_add(size).ok_or(Error::InvalidAddress(base))?;
        let overlaps = regions
            .range(..end)
            .next_back()
            .is_some_and(|(other, region)| other + region.size > base);
        if overlaps {
            return Err(invalid_state("region overlaps an attached region"));
        }

        regions.insert(base, Region { ds, size });
        Ok(base)
    }

    /// Remove the region starting at `addr`
    pub fn detach(&self, addr: Addr) -> Result<()> {
        self.regions
            .lock()
            .remove(&addr)
            .map(|_| ())
            .ok_or(Error::InvalidAddress(addr))
    }

    /// Region containing `addr` and the offset of `addr` within it
    fn lookup(&self, addr: Addr) -> Result<(Region, usize)> {
        let regions = self.regions.lock();
        regions
            .range(..=addr)
            .next_back()
            .filter(|(base, region)| addr < *base + region.size)
            .map(|(base, region)| (region.clone(), addr - base))
            .ok_or(Error::InvalidAddress(addr))
    }

    /// Write `data` at `addr` of this address space
    pub fn poke(&self, addr: Addr, data: &[u8]) -> Result<()> {
        let (region, offset) = self.lookup(addr)?;
        region
            .ds
            .write(offset, data)
            .map_err(|_| Error::InvalidAddress(addr))
    }

    /// Read `len` bytes at `addr` of this address space
    pub fn peek(&self, addr: Addr, len: usize) -> Result<Vec<u8>> {
        let (region, offset) = self.lookup(addr)?;
        region.ds.read(offset, len).map_err(|_| Error::InvalidAddress(addr))
    }

    /// All attached regions in address order
    pub fn regions(&self) -> Vec<RegionInfo> {
        self.regions
            .lock()
            .iter()
            .map(|(base, region)| RegionInfo {
                base: *base,
                size: region.size,
                ds: region.ds.cap(),
            })
            .collect()
    }

    /// Reproduce this address space in `target`
    ///
    /// Every region gets a private copy of its content in a fresh dataspace
    /// of `target`'s registry, attached at the same address.
    pub fn replay(&self, target: &RmSession) -> Result<()> {
        let regions: Vec<(Addr, Region)> = self
            .regions
            .lock()
            .iter()
            .map(|(base, region)| (*base, region.clone()))
            .collect();

        for (base, region) in regions {
            let copy = target.registry.create_with(region.ds.size(), &region.ds.contents())?;
            target.attach(copy.cap(), Some(base))?;
        }
        Ok(())
    }
}

impl RpcObject for RmSession {
    fn kind(&self) -> CapKind {
        CapKind::Rm
    }
}
