//! The multi-invocation run loop.

use cg_core::{Collaborators, ObserverRef, RunResult};
use cg_plugin::ObservationNetwork;
use cg_profile::AgentBlueprintProvider;
use tracing::{debug, error, info, warn};

use crate::{
    AgentFactory, ExecResult, Invocation, InvocationControl, RunConfig, RunError, Scheduler, SchedulerReturn,
    SpawnPointNetwork, Spawner, StopFlag,
};

/// Totals of a run that finished without aborting.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct RunSummary {
    /// Invocations the scheduler completed without error.
    pub completed: u32,
    /// Invocations repeated after `AbortInvocation`.
    pub retries:   u32,
}

/// Runs every invocation of an experiment.
///
/// ```text
/// observers.init_all(result_dir)
/// while control.progress():
///   stop requested?              → abort
///   reseed(random_seed + n)
///   world / spawn points / observers prepared for the run
///   pre-run spawn points
///   scheduler.run                → NoError | retry() | abort()
///   observers.finalize_run
///   agents, spawn points, world, events cleared   (always)
/// observers.finalize_all()
/// ```
pub struct RunInstantiator {
    config:        RunConfig,
    collaborators: Collaborators,
    provider:      AgentBlueprintProvider,
    agents:        AgentFactory,
    observation:   ObservationNetwork,
    spawn_points:  Box<dyn SpawnPointNetwork>,
    scheduler:     Box<dyn Scheduler>,
    stop:          StopFlag,
}

impl RunInstantiator {
    pub fn new(
        config:        RunConfig,
        collaborators: Collaborators,
        provider:      AgentBlueprintProvider,
        agents:        AgentFactory,
        observation:   ObservationNetwork,
        spawn_points:  Box<dyn SpawnPointNetwork>,
        scheduler:     Box<dyn Scheduler>,
    ) -> Self {
        Self {
            config,
            collaborators,
            provider,
            agents,
            observation,
            spawn_points,
            scheduler,
            stop: StopFlag::new(),
        }
    }

    /// Share an externally owned stop flag.
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    /// A clone of the flag checked before every invocation.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn agents(&self) -> &AgentFactory {
        &self.agents
    }

    pub fn observation(&self) -> &ObservationNetwork {
        &self.observation
    }

    /// Run all invocations.
    ///
    /// Errors when the scheduler aborts the simulation, retries run out, a
    /// stop is requested, or an invocation fails to set up.  Per-invocation
    /// state is torn down after every invocation regardless of outcome.
    pub fn execute_run(&mut self) -> ExecResult<RunSummary> {
        self.config.validate()?;
        self.observation.init_all(&self.config.result_dir)?;
        let observers = self.observation.observers();

        let mut control = InvocationControl::new(self.config.invocations);
        let mut summary = RunSummary::default();
        let mut outcome = Ok(());

        while control.progress() {
            let Some(invocation) = control.current_invocation() else {
                break;
            };
            if self.stop.is_stop_requested() {
                warn!(invocation, "stop requested");
                control.abort();
                outcome = Err(RunError::Stopped { invocation });
                break;
            }

            info!(invocation, retry = control.retry_count(), "invocation started");
            let result = self.run_invocation(invocation, &observers);
            self.clear_run();

            match result {
                Ok(SchedulerReturn::NoError) => {
                    summary.completed += 1;
                    info!(invocation, "invocation finished");
                }
                Ok(SchedulerReturn::AbortInvocation) => {
                    warn!(invocation, "invocation aborted, retrying");
                    summary.retries += 1;
                    control.retry();
                }
                Ok(SchedulerReturn::AbortSimulation) => {
                    error!(invocation, "simulation aborted");
                    control.abort();
                    outcome = Err(RunError::Aborted { invocation });
                }
                Err(err) => {
                    error!(invocation, error = %err, "invocation failed");
                    control.abort();
                    outcome = Err(err);
                }
            }
        }

        if control.retries_exhausted() {
            outcome = Err(RunError::RetriesExhausted {
                invocation: control.current_invocation().unwrap_or_default(),
                retries:    crate::MAX_RETRIES,
            });
        }

        let finalized = self.observation.finalize_all();
        outcome?;
        finalized?;
        info!(completed = summary.completed, retries = summary.retries, "run finished");
        Ok(summary)
    }

    fn run_invocation(&mut self, invocation: u32, observers: &[ObserverRef]) -> ExecResult<SchedulerReturn> {
        let seed = self.config.invocation_seed(invocation);
        self.collaborators.stochastics.init_generator(seed);
        debug!(invocation, seed, "stochastics reseeded");

        if !self.collaborators.world.instantiate() {
            return Err(RunError::WorldInit { invocation });
        }
        if !self.spawn_points.instantiate() {
            return Err(RunError::SpawnPointInit { invocation });
        }
        self.observation.init_run()?;

        let mut run_result = RunResult::new();
        let mut spawner = Spawner {
            agents:      &mut self.agents,
            provider:    &self.provider,
            stochastics: &*self.collaborators.stochastics,
            observers,
        };
        self.spawn_points.trigger_pre_run_spawn_points(&mut spawner)?;
        debug!(invocation, agents = spawner.agents().len(), "pre-run agents spawned");

        let mut context = Invocation {
            index: invocation,
            start_time: self.config.start_time,
            end_time: self.config.end_time,
            spawner,
            spawn_points: &mut *self.spawn_points,
            observation: &self.observation,
            event_network: &*self.collaborators.event_network,
            run_result: &mut run_result,
        };
        let returned = self.scheduler.run(&mut context);
        debug!(invocation, ?returned, status = ?run_result.status(), "scheduler returned");

        self.observation.finalize_run(&run_result)?;
        Ok(returned)
    }

    /// Tear down per-invocation state.
    fn clear_run(&mut self) {
        self.agents.clear();
        self.spawn_points.clear();
        self.collaborators.world.reset();
        self.collaborators.event_network.clear();
    }
}
