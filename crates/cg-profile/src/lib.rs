//! `cg-profile` — agent types for probabilistically configured agents.
//!
//! A dynamic agent profile names weighted driver and vehicle options.  At
//! build time the pipeline runs in three pure stages:
//!
//! ```text
//! Profiles ──DynamicProfileSampler──▶ SampledProfiles
//!          ──DynamicParameterSampler─▶ SampledParameters
//!          ──DynamicAgentTypeGenerator─▶ AgentBuildInformation
//! ```
//!
//! [`AgentBlueprintProvider`] fronts the pipeline and also serves static
//! agent profiles, whose graph comes from a system configuration.

pub mod error;
pub mod generator;
pub mod profiles;
pub mod provider;
pub mod sampler;

#[cfg(test)]
mod tests;

pub use error::{ProfileError, ProfileResult};
pub use generator::{ChannelIdAllocator, DynamicAgentTypeGenerator, GeneratorConfig, PrunedInput};
pub use profiles::{
    AgentProfile, Probabilities, Profiles, SensorLink, SensorParameter, SensorPosition, SensorProfileRef,
    VehicleComponent, VehicleModels, VehicleProfile,
};
pub use provider::{AgentBlueprintProvider, AgentBuildInformation, SystemConfigSource};
pub use sampler::{
    DynamicParameterSampler, DynamicProfileSampler, SampledParameters, SampledProfiles, sample_bounded_normal,
    sample_optional, sample_required,
};
