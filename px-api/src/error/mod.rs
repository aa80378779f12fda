//! Error handling module for the POSIX personality

use core::fmt;
use alloc::string::{String, ToString};

use crate::core::types::{Addr, Fd};

/// Common error type used throughout the process-management core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Descriptor number is not open in the descriptor table
    InvalidFd(Fd),
    /// Resource not found (file, service, session, child)
    NotFound(String),
    /// Invalid argument
    InvalidArgument(String),
    /// Invalid state
    InvalidState(String),
    /// Session quota exhausted
    QuotaExceeded,
    /// Address is not backed by any attached region
    InvalidAddress(Addr),
    /// Operation would block
    WouldBlock,
    /// Caller has no children to wait for
    NoChildren,
    /// Not implemented
    NotImplemented(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFd(fd) => write!(f, "Invalid file descriptor: {}", fd),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::QuotaExceeded => write!(f, "Quota exceeded"),
            Error::InvalidAddress(addr) => write!(f, "Invalid address: {:#x}", addr),
            Error::WouldBlock => write!(f, "Operation would block"),
            Error::NoChildren => write!(f, "No child processes"),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type for operations that can fail
pub type Result<T> = core::result::Result<T, Error>;

/// Creates a new not found error
pub fn not_found(msg: &str) -> Error {
    Error::NotFound(msg.to_string())
}

/// Creates a new invalid argument error
pub fn invalid_argument(msg: &str) -> Error {
    Error::InvalidArgument(msg.to_string())
}

/// Creates a new invalid state error
pub fn invalid_state(msg: &str) -> Error {
    Error::InvalidState(msg.to_string())
}

/// Creates a new not implemented error
pub fn not_implemented(msg: &str) -> Error {
    Error::NotImplemented(msg.to_string())
}

/// Syscall-level error class reported back through the syscall channel
///
/// The numeric values are part of the `Sysio` layout shared with the
/// process's C library, so they must stay stable.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SysError {
    /// No error
    #[default]
    None = 0,
    /// Descriptor not open
    BadFd = 1,
    /// No such file or service
    NoEnt = 2,
    /// Invalid argument
    Inval = 3,
    /// No child to wait for
    Child = 4,
    /// Out of memory or quota
    NoMem = 5,
    /// Bad address
    Fault = 6,
    /// Operation would block
    Again = 7,
    /// Syscall not implemented
    NoSys = 8,
}

impl From<&Error> for SysError {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidFd(_) => SysError::BadFd,
            Error::NotFound(_) => SysError::NoEnt,
            Error::InvalidArgument(_) | Error::InvalidState(_) => SysError::Inval,
            Error::QuotaExceeded => SysError::NoMem,
            Error::InvalidAddress(_) => SysError::Fault,
            Error::WouldBlock => SysError::Again,
            Error::NoChildren => SysError::Child,
            Error::NotImplemented(_) => SysError::NoSys,
        }
    }
}
