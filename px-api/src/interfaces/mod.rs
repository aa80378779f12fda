//! Collaborator interfaces
//!
//! The process core consumes the virtual file system and the I/O channels
//! behind file descriptors only through these contracts.

use alloc::sync::Arc;

use crate::capability::Capability;
use crate::error::Result;

/// Virtual file system as seen by the process core
pub trait Vfs: Send + Sync {
    /// Load the file at `path` into a shared memory region
    fn dataspace_from_file(&self, path: &str) -> Result<Capability>;

    /// Give back a region obtained from [`Vfs::dataspace_from_file`]
    fn release_dataspace(&self, cap: Capability);
}

/// Receiver of "something changed" notifications from an I/O channel
pub trait WakeUp: Send + Sync {
    /// Wake the blocked party
    fn wake_up(&self);
}

/// I/O channel referenced by a file descriptor
pub trait IoChannel: Send + Sync {
    /// Short description used in diagnostics
    fn name(&self) -> &str;

    /// Write `buf`, returning the number of bytes consumed
    fn write(&self, buf: &[u8]) -> Result<usize>;

    /// Read into `buf`, returning the number of bytes produced
    ///
    /// Fails with [`crate::Error::WouldBlock`] when no data is available yet.
    fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// Register a party to be woken once the channel becomes ready
    fn register_wake_up_notifier(&self, notifier: Arc<dyn WakeUp>) {
        let _ = notifier;
    }

    /// Undo [`IoChannel::register_wake_up_notifier`]
    fn unregister_wake_up_notifier(&self, notifier: &Arc<dyn WakeUp>) {
        let _ = notifier;
    }
}
