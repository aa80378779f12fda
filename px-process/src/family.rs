//! Process tree
//!
//! Every process carries a [`FamilyMember`] describing its place in the
//! parent/child hierarchy. A parent holds strong references to its children
//! until it reaps them; a child only knows its parent weakly.
//!
//! Waiting follows a poll-then-block protocol on a counting semaphore owned
//! by the parent. A child exiting between the parent's scan and its block
//! leaves a permit behind, so the following block returns at once.

use alloc::collections::BTreeMap;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::any::Any;

use px_api::Pid;
use spin::Mutex;

use crate::sync::Semaphore;

/// Anything that owns a place in the process tree
pub trait Member: Any + Send + Sync {
    /// The tree node of this member
    fn family(&self) -> &FamilyMember;

    /// Upcast for recovering the concrete member type
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// One process's node in the process tree
pub struct FamilyMember {
    pid: Pid,
    parent: Option<Weak<dyn Member>>,
    children: Mutex<BTreeMap<Pid, Arc<dyn Member>>>,
    exit_status: Mutex<Option<i32>>,
    wait4_blocker: Semaphore,
}

impl FamilyMember {
    /// Create the node of process `pid` below `parent`
    pub fn new(pid: Pid, parent: Option<&Arc<dyn Member>>) -> Self {
        Self {
            pid,
            parent: parent.map(Arc::downgrade),
            children: Mutex::new(BTreeMap::new()),
            exit_status: Mutex::new(None),
            wait4_blocker: Semaphore::new(0),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The parent, if it has one and it is still alive
    pub fn parent(&self) -> Option<Arc<dyn Member>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Add a child, returning the member previously known under its PID
    pub fn insert(&self, child: Arc<dyn Member>) -> Option<Arc<dyn Member>> {
        let pid = child.family().pid();
        self.children.lock().insert(pid, child)
    }

    /// Remove the child with PID `pid`
    pub fn remove(&self, pid: Pid) -> Option<Arc<dyn Member>> {
        self.children.lock().remove(&pid)
    }

    /// The child with PID `pid`
    pub fn child(&self, pid: Pid) -> Option<Arc<dyn Member>> {
        self.children.lock().get(&pid).cloned()
    }

    /// PIDs of all direct children in ascending order
    pub fn children(&self) -> Vec<Pid> {
        self.children.lock().keys().copied().collect()
    }

    pub fn has_children(&self) -> bool {
        !self.children.lock().is_empty()
    }

    /// Record the exit status and wake the parent
    ///
    /// Only the first call has an effect.
    pub fn mark_exited(&self, status: i32) {
        {
            let mut exit_status = self.exit_status.lock();
            if let Some(previous) = *exit_status {
                px_warn!("pid {} exited twice ({} then {}), ignoring", self.pid, previous, status);
                return;
            }
            *exit_status = Some(status);
        }

        match self.parent() {
            Some(parent) => parent.family().wait4_blocker.up(),
            None => {
                px_trace!("pid {} has no parent to wake", self.pid);
            }
        }
    }

    pub fn has_exited(&self) -> bool {
        self.exit_status.lock().is_some()
    }

    /// Status passed to [`FamilyMember::mark_exited`]
    pub fn exit_status(&self) -> Option<i32> {
        *self.exit_status.lock()
    }

    /// First exited child, without blocking and without removing it
    pub fn poll4(&self) -> Option<Arc<dyn Member>> {
        self.children
            .lock()
            .values()
            .find(|child| child.family().has_exited())
            .cloned()
    }

    /// Block until a child has exited and return it
    ///
    /// Blocks forever when there are no children; callers check
    /// [`FamilyMember::has_children`] first. Only one thread may wait on a
    /// node at a time.
    pub fn wait4(&self) -> Arc<dyn Member> {
        loop {
            if let Some(child) = self.poll4() {
                return child;
            }
            self.wait4_blocker.down();
        }
    }
}

impl core::fmt::Debug for FamilyMember {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FamilyMember")
            .field("pid", &self.pid)
            .field("children", &self.children())
            .field("exit_status", &self.exit_status())
            .finish()
    }
}
