//! Binary image handle and the argument and environment blobs

use alloc::sync::Arc;
use alloc::vec::Vec;

use px_api::error::invalid_argument;
use px_api::{Capability, Result, Vfs};

/// Binary loaded from the file system, given back on drop
pub struct BinaryImage {
    cap: Capability,
    vfs: Arc<dyn Vfs>,
}

impl BinaryImage {
    /// Load the binary at `path`
    pub fn load(vfs: Arc<dyn Vfs>, path: &str) -> Result<Self> {
        let cap = vfs.dataspace_from_file(path)?;
        Ok(Self { cap, vfs })
    }

    pub fn cap(&self) -> Capability {
        self.cap
    }
}

impl Drop for BinaryImage {
    fn drop(&mut self) {
        self.vfs.release_dataspace(self.cap);
    }
}

/// Pack `entries` NUL-separated with a terminating empty entry
///
/// Fails when the blob would not fit into `capacity` bytes or an entry is
/// empty or contains a NUL.
pub fn pack_entries<S: AsRef<str>>(entries: &[S], capacity: usize) -> Result<Vec<u8>> {
    let mut blob = Vec::new();
    for entry in entries {
        let bytes = entry.as_ref().as_bytes();
        if bytes.is_empty() || bytes.contains(&0) {
            return Err(invalid_argument("empty or NUL-containing entry"));
        }
        blob.extend_from_slice(bytes);
        blob.push(0);
    }
    blob.push(0);

    if blob.len() > capacity {
        return Err(invalid_argument("argument block overflow"));
    }
    Ok(blob)
}
