//! Logging macros for the runtime
//!
//! Forwards to the `log` facade when the `log` feature is enabled and
//! compiles to nothing otherwise.

#[cfg(feature = "log")]
#[doc(hidden)]
pub use ::log as __log;

/// Debug message
#[cfg(feature = "log")]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::log::__log::debug!(target: "ppos", $($arg)*) };
}

/// Info message
#[cfg(feature = "log")]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::log::__log::info!(target: "ppos", $($arg)*) };
}

/// Error message
#[cfg(feature = "log")]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::log::__log::error!(target: "ppos", $($arg)*) };
}

/// Trace message
#[cfg(feature = "log")]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::log::__log::trace!(target: "ppos", $($arg)*) };
}

/// Warning message
#[cfg(feature = "log")]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::log::__log::warn!(target: "ppos", $($arg)*) };
}

// No-op versions when logging is disabled
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! debug { ($($arg:tt)*) => {}; }
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! info { ($($arg:tt)*) => {}; }
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! error { ($($arg:tt)*) => {}; }
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! trace { ($($arg:tt)*) => {}; }
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! warn { ($($arg:tt)*) => {}; }
