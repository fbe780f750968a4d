//! `cg-run` — experiment driver for the component-graph runtime.
//!
//! An experiment is a number of invocations of the same scenario.  Each
//! invocation reseeds the stochastics, spawns agents, hands control to the
//! external [`Scheduler`], and tears everything down again.
//!
//! | Type                  | Role                                                |
//! |-----------------------|-----------------------------------------------------|
//! | [`InvocationControl`] | Next-invocation decision with bounded retry/abort   |
//! | [`StopFlag`]          | Stop request from another thread                    |
//! | [`AgentFactory`]      | Builds agents through the model binding             |
//! | [`RunInstantiator`]   | The run loop                                        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let binding = ModelBinding::new(plugin_config, Rc::new(DynamicLoader), collaborators.clone());
//! let agents = AgentFactory::new(Box::new(binding));
//! let mut run = RunInstantiator::new(
//!     run_config, collaborators, provider, agents, observation, spawn_points, scheduler,
//! );
//! let summary = run.execute_run()?;
//! ```

pub mod config;
pub mod error;
pub mod factory;
pub mod instantiator;
pub mod invocation;
pub mod scheduler;


pub use config::RunConfig;
pub use error::{ExecResult, RunError};
pub use factory::AgentFactory;
pub use instantiator::{RunInstantiator, RunSummary};
pub use invocation::{InvocationControl, MAX_RETRIES, StopFlag};
pub use scheduler::{Invocation, Scheduler, SchedulerReturn, SpawnPointNetwork, Spawner};
