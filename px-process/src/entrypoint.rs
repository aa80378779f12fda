//! Request-dispatch thread
//!
//! An [`RpcEntrypoint`] serves the objects managed by it on one dedicated
//! thread. Callers queue a request and block until the thread replies.

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle, ThreadId};

use hashbrown::HashMap;
use px_api::error::invalid_state;
use px_api::{CapIssuer, Capability, Entrypoint, Result, RpcObject, SessionCall, SessionReply};
use spin::{Mutex, RwLock};

type Objects = Arc<RwLock<HashMap<Capability, Arc<dyn RpcObject>>>>;

enum Request {
    Call {
        cap: Capability,
        call: SessionCall,
        reply: Sender<Result<SessionReply>>,
    },
    Stop,
}

fn dispatch(objects: &Objects, cap: Capability, call: SessionCall) -> Result<SessionReply> {
    // the lock is released before the object runs so it may dissolve itself
    let object = objects.read().get(&cap).cloned();
    match object {
        Some(object) => object.dispatch(call),
        None => Err(invalid_state("call to unknown capability")),
    }
}

/// Entrypoint with its own dispatch thread
pub struct RpcEntrypoint {
    name: String,
    stack_size: usize,
    caps: Arc<dyn CapIssuer>,
    objects: Objects,
    sender: Mutex<Option<Sender<Request>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl RpcEntrypoint {
    pub fn new(name: &str, stack_size: usize, caps: Arc<dyn CapIssuer>) -> Self {
        Self {
            name: name.to_string(),
            stack_size,
            caps,
            objects: Arc::new(RwLock::new(HashMap::new())),
            sender: Mutex::new(None),
            thread: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the dispatch thread
    pub fn activate(&self) -> Result<()> {
        let mut thread = self.thread.lock();
        if thread.is_some() {
            return Err(invalid_state("entrypoint already active"));
        }

        let (tx, rx): (Sender<Request>, Receiver<Request>) = mpsc::channel();
        let objects = self.objects.clone();
        let handle = thread::Builder::new()
            .name(self.name.clone())
            .stack_size(self.stack_size)
            .spawn(move || {
                while let Ok(Request::Call { cap, call, reply }) = rx.recv() {
                    let _ = reply.send(dispatch(&objects, cap, call));
                }
            })
            .map_err(|_| invalid_state("cannot spawn entrypoint thread"))?;

        px_trace!("entrypoint {} active", self.name);
        *thread = Some(handle);
        *self.sender.lock() = Some(tx);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.thread.lock().is_some()
    }

    fn thread_id(&self) -> Option<ThreadId> {
        self.thread.lock().as_ref().map(|handle| handle.thread().id())
    }

    /// Invoke `call` on the object behind `cap` and wait for the reply
    ///
    /// Calls made from the dispatch thread itself are served in place.
    pub fn call(&self, cap: Capability, call: SessionCall) -> Result<SessionReply> {
        if self.thread_id() == Some(thread::current().id()) {
            return dispatch(&self.objects, cap, call);
        }

        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or_else(|| invalid_state("entrypoint not active"))?;

        let (reply, response) = mpsc::channel();
        sender
            .send(Request::Call { cap, call, reply })
            .map_err(|_| invalid_state("entrypoint stopped"))?;
        response.recv().map_err(|_| invalid_state("entrypoint stopped"))?
    }

    /// Stop the dispatch thread and wait for it to finish
    ///
    /// A call in flight completes first. Afterwards no code runs on the
    /// dispatch thread, and later calls fail as on a never-activated
    /// entrypoint. Must not be called from the dispatch thread itself.
    pub fn deactivate(&self) -> Result<()> {
        if self.thread_id() == Some(thread::current().id()) {
            return Err(invalid_state("entrypoint cannot stop itself"));
        }
        if let Some(sender) = self.sender.lock().take() {
            let _ = sender.send(Request::Stop);
        }
        let handle = self.thread.lock().take();
        let Some(handle) = handle else {
            return Ok(());
        };
        if handle.join().is_err() {
            px_error!("entrypoint {} thread panicked", self.name);
        }
        px_trace!("entrypoint {} stopped", self.name);
        Ok(())
    }

    /// Number of objects currently managed
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl Entrypoint for RpcEntrypoint {
    fn manage(&self, object: Arc<dyn RpcObject>) -> Capability {
        let cap = self.caps.issue(object.kind());
        self.objects.write().insert(cap, object);
        cap
    }

    fn dissolve(&self, cap: Capability) {
        if self.objects.write().remove(&cap).is_some() {
            self.caps.revoke(cap);
        }
    }
}

impl Drop for RpcEntrypoint {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.get_mut().take() {
            let _ = sender.send(Request::Stop);
        }
        let Some(handle) = self.thread.get_mut().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // the last reference went away on our own thread, which exits
            // once this call returns
            px_trace!("entrypoint {} detached", self.name);
            return;
        }
        if handle.join().is_err() {
            px_error!("entrypoint {} thread panicked", self.name);
        }
    }
}
