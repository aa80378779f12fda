//! Dataspaces and their per-process registry

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;
use px_api::{Addr, CapIssuer, CapKind, Capability, Error, Result, Size};
use spin::{Mutex, RwLock};

/// Shared memory region backed by a byte buffer
pub struct Dataspace {
    cap: Capability,
    bytes: Mutex<Vec<u8>>,
}

impl Dataspace {
    fn new(cap: Capability, size: Size) -> Self {
        Self {
            cap,
            bytes: Mutex::new(vec![0; size]),
        }
    }

    pub fn cap(&self) -> Capability {
        self.cap
    }

    pub fn size(&self) -> Size {
        self.bytes.lock().len()
    }

    /// Copy `data` to `offset`
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<()> {
        let mut bytes = self.bytes.lock();
        let end = offset.checked_add(data.len()).filter(|&end| end <= bytes.len());
        match end {
            Some(end) => {
                bytes[offset..end].copy_from_slice(data);
                Ok(())
            }
            None => Err(Error::InvalidAddress(offset as Addr)),
        }
    }

    /// Copy `len` bytes starting at `offset`
    pub fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let bytes = self.bytes.lock();
        let end = offset.checked_add(len).filter(|&end| end <= bytes.len());
        match end {
            Some(end) => Ok(bytes[offset..end].to_vec()),
            None => Err(Error::InvalidAddress(offset as Addr)),
        }
    }

    /// Snapshot of the whole content
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }
}

impl core::fmt::Debug for Dataspace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dataspace")
            .field("cap", &self.cap)
            .field("size", &self.size())
            .finish()
    }
}

/// Catalogue of the dataspaces owned by one process
///
/// Dataspaces are created and destroyed through the registry only. Their
/// capabilities are revoked when they are removed or when the registry goes
/// away.
pub struct DataspaceRegistry {
    caps: Arc<dyn CapIssuer>,
    entries: RwLock<HashMap<Capability, Arc<Dataspace>>>,
}

impl DataspaceRegistry {
    pub fn new(caps: Arc<dyn CapIssuer>) -> Self {
        Self {
            caps,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a zero-filled dataspace of `size` bytes
    pub fn create(&self, size: Size) -> Arc<Dataspace> {
        let ds = Arc::new(Dataspace::new(self.caps.issue(CapKind::Dataspace), size));
        self.entries.write().insert(ds.cap(), ds.clone());
        ds
    }

    /// Create a dataspace of `size` bytes holding `data` at its start
    pub fn create_with(&self, size: Size, data: &[u8]) -> Result<Arc<Dataspace>> {
        let ds = self.create(size);
        if let Err(err) = ds.write(0, data) {
            self.remove(ds.cap());
            return Err(err);
        }
        Ok(ds)
    }

    pub fn get(&self, cap: Capability) -> Option<Arc<Dataspace>> {
        self.entries.read().get(&cap).cloned()
    }

    /// Destroy the dataspace referred to by `cap`
    pub fn remove(&self, cap: Capability) -> Option<Arc<Dataspace>> {
        let ds = self.entries.write().remove(&cap)?;
        self.caps.revoke(cap);
        Some(ds)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Drop for DataspaceRegistry {
    fn drop(&mut self) {
        for (cap, _) in self.entries.get_mut().drain() {
            self.caps.revoke(cap);
        }
    }
}
