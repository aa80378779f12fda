//! Asynchronous notifications
//!
//! A [`SignalReceiver`] collects submitted signals and hands each one to the
//! dispatcher registered for its context. Dispatch happens on whichever
//! thread drives the receiver, never on the submitter's.

use alloc::collections::VecDeque;
use alloc::sync::{Arc, Weak};
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

use hashbrown::HashMap;
use px_api::{CapIssuer, CapKind, Capability};
use spin::RwLock;

/// Handler run when a signal for its context is delivered
pub trait SignalDispatcher: Send + Sync {
    fn dispatch(&self, receiver: &SignalReceiver);
}

/// Registration of a dispatcher; dissolved on drop
pub struct SignalContext {
    cap: Capability,
    receiver: Weak<SignalReceiver>,
}

impl SignalContext {
    /// Capability used to submit signals to this context
    pub fn cap(&self) -> Capability {
        self.cap
    }
}

impl Drop for SignalContext {
    fn drop(&mut self) {
        if let Some(receiver) = self.receiver.upgrade() {
            receiver.dissolve(self.cap);
        }
    }
}

impl core::fmt::Debug for SignalContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignalContext").field("cap", &self.cap).finish()
    }
}

/// Queue of pending signals plus the dispatchers they are delivered to
pub struct SignalReceiver {
    caps: Arc<dyn CapIssuer>,
    contexts: RwLock<HashMap<Capability, Arc<dyn SignalDispatcher>>>,
    pending: Mutex<VecDeque<Capability>>,
    cond: Condvar,
    shutdown: AtomicBool,
}

impl SignalReceiver {
    pub fn new(caps: Arc<dyn CapIssuer>) -> Arc<Self> {
        Arc::new(Self {
            caps,
            contexts: RwLock::new(HashMap::new()),
            pending: Mutex::new(VecDeque::new()),
            cond: Condvar::new(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Register `dispatcher`, returning the context signals are submitted to
    pub fn manage(self: &Arc<Self>, dispatcher: Arc<dyn SignalDispatcher>) -> SignalContext {
        let cap = self.caps.issue(CapKind::Signal);
        self.contexts.write().insert(cap, dispatcher);
        SignalContext {
            cap,
            receiver: Arc::downgrade(self),
        }
    }

    fn dissolve(&self, cap: Capability) {
        if self.contexts.write().remove(&cap).is_some() {
            self.caps.revoke(cap);
        }
        self.lock_pending().retain(|pending| *pending != cap);
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, VecDeque<Capability>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue one signal for the context behind `cap`
    pub fn submit(&self, cap: Capability) {
        self.lock_pending().push_back(cap);
        self.cond.notify_all();
    }

    /// Number of signals not yet dispatched
    pub fn pending(&self) -> usize {
        self.lock_pending().len()
    }

    fn deliver(&self, cap: Capability) {
        let dispatcher = self.contexts.read().get(&cap).cloned();
        match dispatcher {
            Some(dispatcher) => dispatcher.dispatch(self),
            None => {
                px_debug!("signal for dissolved context {:?} dropped", cap);
            }
        }
    }

    /// Block until a signal is pending, then dispatch it
    ///
    /// Returns without dispatching once shutdown has been requested.
    pub fn wait_and_dispatch(&self) {
        let cap = {
            let mut pending = self.lock_pending();
            loop {
                if let Some(cap) = pending.pop_front() {
                    break cap;
                }
                if self.shutdown_requested() {
                    return;
                }
                pending = self.cond.wait(pending).unwrap_or_else(PoisonError::into_inner);
            }
        };
        self.deliver(cap);
    }

    /// Dispatch every pending signal without blocking
    ///
    /// Returns the number of signals taken from the queue.
    pub fn dispatch_pending(&self) -> usize {
        let mut count = 0;
        loop {
            let next = self.lock_pending().pop_front();
            let Some(cap) = next else {
                return count;
            };
            self.deliver(cap);
            count += 1;
        }
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Ask the driver loop to stop
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        let _pending = self.lock_pending();
        self.cond.notify_all();
    }
}
