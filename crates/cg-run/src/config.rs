//! Experiment-level run settings.

use std::path::PathBuf;

use cg_core::SimTime;

use crate::{ExecResult, RunError};

/// Settings of one experiment run.
///
/// Typically filled from the run configuration file by the application and
/// handed to [`RunInstantiator`](crate::RunInstantiator).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunConfig {
    /// Number of invocations to run.
    pub invocations: u32,

    /// Base seed.  Invocation `n` reseeds the stochastics with
    /// `random_seed + n`; a retried invocation reuses its seed.
    pub random_seed: u64,

    pub start_time: SimTime,

    /// Exclusive upper bound of every invocation.
    pub end_time: SimTime,

    /// Handed to the observers' slave-pre hook.
    pub result_dir: PathBuf,
}

impl RunConfig {
    pub fn validate(&self) -> ExecResult<()> {
        if self.end_time <= self.start_time {
            return Err(RunError::Config(format!(
                "end time {} must lie after start time {}",
                self.end_time, self.start_time
            )));
        }
        Ok(())
    }

    /// Seed of invocation `invocation`.
    #[inline]
    pub fn invocation_seed(&self, invocation: u32) -> u64 {
        self.random_seed.wrapping_add(u64::from(invocation))
    }
}
