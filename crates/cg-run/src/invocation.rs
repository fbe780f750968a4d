//! Invocation control and the cross-thread stop flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

/// Retries allowed for a single invocation before the experiment gives up.
pub const MAX_RETRIES: u32 = 5;

/// Decides whether the run loop performs another invocation.
///
/// ```text
/// progress():
///   abort set          → false, forever
///   retry set          → clear it, retry_count += 1
///                        → true while retry_count ≤ MAX_RETRIES, else abort
///   otherwise          → retry_count = 0, current_invocation += 1
///                        → true while current_invocation < total
/// ```
///
/// [`retry`](Self::retry) and [`abort`](Self::abort) only set flags; both
/// take effect on the next `progress()` call.
#[derive(Clone, Debug)]
pub struct InvocationControl {
    total:             u32,
    /// `None` before the first `progress()` call.
    current:           Option<u32>,
    retry_count:       u32,
    retry:             bool,
    abort:             bool,
    retries_exhausted: bool,
}

impl InvocationControl {
    pub fn new(total_invocations: u32) -> Self {
        Self {
            total:             total_invocations,
            current:           None,
            retry_count:       0,
            retry:             false,
            abort:             false,
            retries_exhausted: false,
        }
    }

    pub fn progress(&mut self) -> bool {
        if self.abort {
            return false;
        }
        if self.retry {
            self.retry = false;
            self.retry_count += 1;
            if self.retry_count <= MAX_RETRIES {
                debug!(invocation = ?self.current, retry = self.retry_count, "retrying invocation");
                return true;
            }
            warn!(invocation = ?self.current, retries = MAX_RETRIES, "retries exhausted, aborting");
            self.retries_exhausted = true;
            self.abort = true;
            return false;
        }
        if self.current.is_some_and(|c| c >= self.total) {
            return false;
        }
        self.retry_count = 0;
        let next = self.current.map_or(0, |c| c + 1);
        self.current = Some(next);
        next < self.total
    }

    /// Repeat the current invocation on the next `progress()`.
    pub fn retry(&mut self) {
        self.retry = true;
    }

    /// Stop the experiment; every later `progress()` returns `false`.
    pub fn abort(&mut self) {
        self.abort = true;
    }

    pub fn current_invocation(&self) -> Option<u32> {
        self.current
    }

    pub fn total_invocations(&self) -> u32 {
        self.total
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn is_aborted(&self) -> bool {
        self.abort
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retries_exhausted
    }
}

/// "Stop requested" flag shared with an operator thread.
///
/// Clones share the same flag.  The run loop checks it before every
/// invocation; an invocation already in flight is never interrupted.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
