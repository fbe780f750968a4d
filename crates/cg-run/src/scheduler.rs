//! Seams to the external scheduler and spawn point network.
//!
//! The time-ordering algorithm that drives the cycle operations lives
//! outside this workspace.  [`RunInstantiator`](crate::RunInstantiator)
//! hands it one [`Invocation`] per run and maps its [`SchedulerReturn`] onto
//! the invocation control.

use cg_core::{AgentId, EventNetwork, ObserverRef, RunResult, SimTime, Stochastics};
use cg_plugin::ObservationNetwork;
use cg_profile::AgentBlueprintProvider;

use crate::{AgentFactory, ExecResult};

/// Outcome of one scheduler run.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerReturn {
    NoError,
    /// Recoverable: the invocation is repeated.
    AbortInvocation,
    /// Fatal: no further invocations run.
    AbortSimulation,
}

/// Samples agent profiles and adds the resulting agents.
pub struct Spawner<'a> {
    pub(crate) agents:      &'a mut AgentFactory,
    pub(crate) provider:    &'a AgentBlueprintProvider,
    pub(crate) stochastics: &'a dyn Stochastics,
    pub(crate) observers:   &'a [ObserverRef],
}

impl Spawner<'_> {
    /// Build and add one agent of `agent_profile`.
    pub fn spawn(&mut self, agent_profile: &str, spawn_time: SimTime) -> ExecResult<AgentId> {
        let build = self.provider.sample_agent(agent_profile, self.stochastics)?;
        self.agents.add_agent(&build, spawn_time, self.observers)
    }

    pub fn agents(&self) -> &AgentFactory {
        &*self.agents
    }

    pub fn agents_mut(&mut self) -> &mut AgentFactory {
        &mut *self.agents
    }

    pub fn stochastics(&self) -> &dyn Stochastics {
        self.stochastics
    }
}

/// Places agents into the world.
pub trait SpawnPointNetwork {
    /// Prepare for a new invocation.  Returning `false` fails it.
    fn instantiate(&mut self) -> bool {
        true
    }

    /// Spawn every agent present when the invocation starts.
    fn trigger_pre_run_spawn_points(&mut self, spawner: &mut Spawner<'_>) -> ExecResult<()>;

    /// Spawn agents appearing at `time`.  Called by the scheduler.
    fn trigger_runtime_spawn_points(&mut self, _time: SimTime, _spawner: &mut Spawner<'_>) -> ExecResult<()> {
        Ok(())
    }

    /// Forget per-invocation state.
    fn clear(&mut self) {}
}

/// Everything a scheduler needs for one invocation.
pub struct Invocation<'a> {
    pub index:         u32,
    pub start_time:    SimTime,
    pub end_time:      SimTime,
    pub spawner:       Spawner<'a>,
    pub spawn_points:  &'a mut dyn SpawnPointNetwork,
    pub observation:   &'a ObservationNetwork,
    pub event_network: &'a dyn EventNetwork,
    pub run_result:    &'a mut RunResult,
}

/// Drives the cycle operations of every agent from start to end time.
pub trait Scheduler {
    fn run(&mut self, invocation: &mut Invocation<'_>) -> SchedulerReturn;
}
