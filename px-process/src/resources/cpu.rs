//! CPU/thread-control session

use alloc::string::{String, ToString};

use px_api::error::invalid_state;
use px_api::{Addr, CapKind, Result, RpcObject};
use spin::Mutex;

/// Register state the main thread was started with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainThread {
    pub ip: Addr,
    pub sp: Addr,
}

/// Controls the threads of one process
pub struct CpuSession {
    label: String,
    forked: bool,
    main_thread: Mutex<Option<MainThread>>,
}

impl CpuSession {
    pub fn new(label: &str, forked: bool) -> Self {
        Self {
            label: label.to_string(),
            forked,
            main_thread: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the session belongs to a forked process
    pub fn forked(&self) -> bool {
        self.forked
    }

    /// Start the main thread at `ip` with stack pointer `sp`
    pub fn start_main_thread(&self, ip: Addr, sp: Addr) -> Result<()> {
        let mut main_thread = self.main_thread.lock();
        if main_thread.is_some() {
            return Err(invalid_state("main thread already started"));
        }
        px_debug!("{}: main thread at ip={:#x} sp={:#x}", self.label, ip, sp);
        *main_thread = Some(MainThread { ip, sp });
        Ok(())
    }

    pub fn main_thread(&self) -> Option<MainThread> {
        *self.main_thread.lock()
    }
}

impl RpcObject for CpuSession {
    fn kind(&self) -> CapKind {
        CapKind::Cpu
    }
}
