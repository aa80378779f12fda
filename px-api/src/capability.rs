//! Capabilities
//!
//! A capability is an unforgeable reference granting access to one resource
//! or session. Within the core it is a plain value: the issuer guarantees
//! uniqueness of the id, the kind records what the capability refers to.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// What a capability refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapKind {
    /// Shared memory region
    Dataspace,
    /// Process-control session (the syscall session)
    Session,
    /// Memory-allocation session
    Ram,
    /// CPU/thread-control session
    Cpu,
    /// Address-space (region map) session
    Rm,
    /// Parent interface of a process
    Parent,
    /// Asynchronous notification context
    Signal,
}

/// Unforgeable reference to a resource or session
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability {
    id: u64,
    kind: CapKind,
}

impl Capability {
    /// Create a capability from a raw id, used by issuers
    pub const fn from_raw(id: u64, kind: CapKind) -> Self {
        Self { id, kind }
    }

    /// An invalid capability of the given kind
    pub const fn invalid(kind: CapKind) -> Self {
        Self { id: 0, kind }
    }

    /// Raw capability id
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Kind of object this capability refers to
    pub const fn kind(&self) -> CapKind {
        self.kind
    }

    /// Whether the capability refers to anything at all
    pub const fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// Serialized token written into a process's address space
    pub fn to_bytes(&self) -> [u8; 8] {
        self.id.to_le_bytes()
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cap({:?}#{})", self.kind, self.id)
    }
}

/// Issuer of fresh capabilities
pub trait CapIssuer: Send + Sync {
    /// Hand out a never-before-issued capability of the given kind
    fn issue(&self, kind: CapKind) -> Capability;

    /// Retire a capability; later uses must not resolve to anything
    fn revoke(&self, cap: Capability);
}

/// Issuer backed by a process-local counter
#[derive(Debug)]
pub struct LocalCapIssuer {
    next_id: AtomicU64,
    revoked: AtomicU64,
}

impl LocalCapIssuer {
    /// Create a new issuer; ids start at 1 so that 0 stays invalid
    pub const fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            revoked: AtomicU64::new(0),
        }
    }

    /// Number of capabilities issued so far
    pub fn issued(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed) - 1
    }

    /// Number of capabilities revoked so far
    pub fn revoked(&self) -> u64 {
        self.revoked.load(Ordering::Relaxed)
    }
}

impl Default for LocalCapIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl CapIssuer for LocalCapIssuer {
    fn issue(&self, kind: CapKind) -> Capability {
        Capability::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed), kind)
    }

    fn revoke(&self, cap: Capability) {
        if cap.is_valid() {
            self.revoked.fetch_add(1, Ordering::Relaxed);
        }
    }
}
