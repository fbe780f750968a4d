//! Log sink handed to plugins.

use tracing::{debug, error, info, warn};

/// Severity of a plugin log message.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(C)]
pub enum CbkLogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

/// Callback interface plugins use to report back to the host.
pub trait Callbacks: Send + Sync {
    fn log(&self, level: CbkLogLevel, file: &str, line: u32, message: &str);
}

/// [`Callbacks`] that forward every message to `tracing` at the matching level.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingCallbacks;

impl Callbacks for TracingCallbacks {
    fn log(&self, level: CbkLogLevel, file: &str, line: u32, message: &str) {
        match level {
            CbkLogLevel::Error   => error!(target: "plugin", origin = file, line, "{message}"),
            CbkLogLevel::Warning => warn!(target: "plugin", origin = file, line, "{message}"),
            CbkLogLevel::Info    => info!(target: "plugin", origin = file, line, "{message}"),
            CbkLogLevel::Debug   => debug!(target: "plugin", origin = file, line, "{message}"),
        }
    }
}
