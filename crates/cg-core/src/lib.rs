//! `cg-core` — foundational types for the component-graph runtime.
//!
//! This crate is a dependency of every other `cg-*` crate and of every model
//! or observation plugin.  It has no `cg-*` dependencies.
//!
//! # What lives here
//!
//! | Module            | Contents                                                   |
//! |-------------------|------------------------------------------------------------|
//! | [`ids`]           | `AgentId`, `ChannelId`, `LinkId`, `ObserverId`             |
//! | [`time`]          | `SimTime` (milliseconds)                                   |
//! | [`schedule`]      | `ScheduleMetadata` (init / priority / offset / response / cycle) |
//! | [`parameters`]    | `ParameterSet`, `ParameterValue`, `NormalDistribution`     |
//! | [`signal`]        | `SignalInterface`, `Signal` (shared immutable value)       |
//! | [`run_result`]    | `RunResult`, `RunStatus`                                   |
//! | [`stochastics`]   | `Stochastics` trait, `SimStochastics` (seeded `SmallRng`)  |
//! | [`world`]         | `World`, `EventNetwork` collaborator traits                |
//! | [`callbacks`]     | `Callbacks` log sink, `CbkLogLevel`, `TracingCallbacks`    |
//! | [`observer`]      | `ObserverRef` (read-only observer handle)                  |
//! | [`collaborators`] | `Collaborators` bundle handed to plugins                   |
//! | [`error`]         | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to the plain-data types.     |

pub mod callbacks;
pub mod collaborators;
pub mod error;
pub mod ids;
pub mod observer;
pub mod parameters;
pub mod run_result;
pub mod schedule;
pub mod signal;
pub mod stochastics;
pub mod time;
pub mod world;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use callbacks::{Callbacks, CbkLogLevel, TracingCallbacks};
pub use collaborators::Collaborators;
pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, ChannelId, LinkId, ObserverId};
pub use observer::ObserverRef;
pub use parameters::{NormalDistribution, ParameterSet, ParameterValue};
pub use run_result::{RunResult, RunStatus};
pub use schedule::ScheduleMetadata;
pub use signal::{Signal, SignalInterface, ValueSignal};
pub use stochastics::{SimStochastics, Stochastics};
pub use time::SimTime;
pub use world::{EventNetwork, World};
