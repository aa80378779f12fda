//! Syscall identifiers and the shared syscall parameter block
//!
//! A process issues one syscall at a time. Its request payload and the
//! response are exchanged through a [`Sysio`] block that lives in a shared
//! memory region sized to the structure, rounded up to the page size.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::mem::size_of;

use static_assertions::const_assert;

use crate::core::types::{Addr, Fd, PAGE_SIZE, Pid, page_round_up};
use crate::error::{Result, SysError, invalid_argument};

/// Capacity of the data chunk used by read and write
pub const SYSIO_CHUNK_SIZE: usize = 4096;

/// Capacity of the path buffer
pub const SYSIO_PATH_MAX: usize = 512;

/// Capacity of the NUL-separated argument block
pub const SYSIO_ARGS_MAX: usize = 2048;

/// Capacity of the NUL-separated environment block
pub const SYSIO_ENV_MAX: usize = 2048;

/// Size of the syscall channel region
pub const SYSIO_DS_SIZE: usize = page_round_up(size_of::<Sysio>());

const_assert!(size_of::<Sysio>() <= SYSIO_DS_SIZE);
const_assert!(SYSIO_DS_SIZE % PAGE_SIZE == 0);
const_assert!(SYSIO_DS_SIZE <= 4 * PAGE_SIZE);

/// Syscall identifiers understood by the process session
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syscall {
    /// Write `chunk[..count]` to `fd`
    Write = 1,
    /// Read up to `count` bytes from `fd` into `chunk`
    Read = 2,
    /// Close `fd`
    Close = 3,
    /// Make `to_fd` refer to the channel of `fd`
    Dup2 = 4,
    /// Report the caller's PID
    Getpid = 5,
    /// Create a forked child starting at `ip`/`sp`
    Fork = 6,
    /// Replace the caller's image with `path`
    Execve = 7,
    /// Reap an exited child
    Wait4 = 8,
}

impl Syscall {
    /// Human-readable syscall name
    pub fn name(&self) -> &'static str {
        match self {
            Syscall::Write => "write",
            Syscall::Read => "read",
            Syscall::Close => "close",
            Syscall::Dup2 => "dup2",
            Syscall::Getpid => "getpid",
            Syscall::Fork => "fork",
            Syscall::Execve => "execve",
            Syscall::Wait4 => "wait4",
        }
    }
}

impl TryFrom<u32> for Syscall {
    type Error = crate::error::Error;

    fn try_from(raw: u32) -> Result<Self> {
        Ok(match raw {
            1 => Syscall::Write,
            2 => Syscall::Read,
            3 => Syscall::Close,
            4 => Syscall::Dup2,
            5 => Syscall::Getpid,
            6 => Syscall::Fork,
            7 => Syscall::Execve,
            8 => Syscall::Wait4,
            _ => return Err(invalid_argument("unknown syscall number")),
        })
    }
}

/// Syscall parameter block shared between a process and its session
#[repr(C)]
pub struct Sysio {
    /// Error class of the last failed syscall
    pub error: SysError,
    /// Descriptor argument
    pub fd: Fd,
    /// Target descriptor of `dup2`
    pub to_fd: Fd,
    /// Byte count for read and write, in and out
    pub count: usize,
    /// Do not block in `wait4`
    pub nohang: bool,
    /// Entry instruction pointer of a forked child
    pub ip: Addr,
    /// Initial stack pointer of a forked child
    pub sp: Addr,
    /// Where to poke the parent capability of a forked child
    pub parent_cap_addr: Addr,
    /// PID result of `getpid`, `fork` and `wait4`
    pub pid: Pid,
    /// Exit status result of `wait4`
    pub status: i32,
    /// NUL-terminated path
    pub path: [u8; SYSIO_PATH_MAX],
    /// NUL-separated arguments
    pub args: [u8; SYSIO_ARGS_MAX],
    /// NUL-separated environment entries
    pub env: [u8; SYSIO_ENV_MAX],
    /// Data chunk
    pub chunk: [u8; SYSIO_CHUNK_SIZE],
}

impl Sysio {
    /// Create a zeroed block
    pub const fn new() -> Self {
        Self {
            error: SysError::None,
            fd: 0,
            to_fd: 0,
            count: 0,
            nohang: false,
            ip: 0,
            sp: 0,
            parent_cap_addr: 0,
            pid: 0,
            status: 0,
            path: [0; SYSIO_PATH_MAX],
            args: [0; SYSIO_ARGS_MAX],
            env: [0; SYSIO_ENV_MAX],
            chunk: [0; SYSIO_CHUNK_SIZE],
        }
    }

    /// Store `path` NUL-terminated
    pub fn set_path(&mut self, path: &str) -> Result<()> {
        if path.len() >= SYSIO_PATH_MAX {
            return Err(invalid_argument("path too long"));
        }
        self.path.fill(0);
        self.path[..path.len()].copy_from_slice(path.as_bytes());
        Ok(())
    }

    /// Path up to its terminating NUL
    pub fn path(&self) -> Result<&str> {
        let len = self.path.iter().position(|&b| b == 0).unwrap_or(SYSIO_PATH_MAX);
        core::str::from_utf8(&self.path[..len]).map_err(|_| invalid_argument("path is not UTF-8"))
    }

    /// Copy `data` into the chunk and set `count`
    pub fn set_chunk(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > SYSIO_CHUNK_SIZE {
            return Err(invalid_argument("chunk too large"));
        }
        self.chunk[..data.len()].copy_from_slice(data);
        self.count = data.len();
        Ok(())
    }

    /// The first `count` bytes of the chunk
    pub fn chunk(&self) -> &[u8] {
        &self.chunk[..self.count.min(SYSIO_CHUNK_SIZE)]
    }

    /// Store `args` as a NUL-separated block
    pub fn set_args<S: AsRef<str>>(&mut self, args: &[S]) -> Result<()> {
        pack_block(&mut self.args, args)
    }

    /// Arguments stored in the block
    pub fn args(&self) -> Result<Vec<String>> {
        unpack_block(&self.args)
    }

    /// Store environment entries as a NUL-separated block
    pub fn set_env<S: AsRef<str>>(&mut self, entries: &[S]) -> Result<()> {
        pack_block(&mut self.env, entries)
    }

    /// Environment entries stored in the block
    pub fn env(&self) -> Result<Vec<String>> {
        unpack_block(&self.env)
    }
}

impl Default for Sysio {
    fn default() -> Self {
        Self::new()
    }
}

/// Store `items` NUL-separated; `buf` is left untouched on failure
fn pack_block<S: AsRef<str>>(buf: &mut [u8], items: &[S]) -> Result<()> {
    let mut needed = 0usize;
    for item in items {
        let bytes = item.as_ref().as_bytes();
        if bytes.is_empty() || bytes.contains(&0) {
            return Err(invalid_argument("empty or NUL-containing entry"));
        }
        needed = needed.saturating_add(bytes.len() + 1);
    }
    // one spare byte keeps the block double-NUL terminated
    if needed >= buf.len() {
        return Err(invalid_argument("block overflow"));
    }

    buf.fill(0);
    let mut pos = 0;
    for item in items {
        let bytes = item.as_ref().as_bytes();
        buf[pos..pos + bytes.len()].copy_from_slice(bytes);
        pos += bytes.len() + 1;
    }
    Ok(())
}

fn unpack_block(buf: &[u8]) -> Result<Vec<String>> {
    let mut items = Vec::new();
    for part in buf.split(|&b| b == 0) {
        if part.is_empty() {
            break;
        }
        let s = core::str::from_utf8(part).map_err(|_| invalid_argument("entry is not UTF-8"))?;
        items.push(s.to_string());
    }
    Ok(items)
}
