//! `px_*` logging macros
//!
//! Records go to the `log` facade under the `px_process` target. Without the
//! `log` feature the macros expand to nothing.

#[doc(hidden)]
#[macro_export]
macro_rules! px_log {
    ($level:ident, $($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::$level!(target: "px_process", $($arg)*);
    };
}

#[macro_export]
macro_rules! px_trace {
    ($($arg:tt)*) => { $crate::px_log!(trace, $($arg)*) };
}

#[macro_export]
macro_rules! px_debug {
    ($($arg:tt)*) => { $crate::px_log!(debug, $($arg)*) };
}

/// Lifecycle events: exits, replacements, shutdown
#[macro_export]
macro_rules! px_info {
    ($($arg:tt)*) => { $crate::px_log!(info, $($arg)*) };
}

#[macro_export]
macro_rules! px_warn {
    ($($arg:tt)*) => { $crate::px_log!(warn, $($arg)*) };
}

#[macro_export]
macro_rules! px_error {
    ($($arg:tt)*) => { $crate::px_log!(error, $($arg)*) };
}
