//! One entry point for static and dynamic agents.

use std::collections::BTreeMap;
use std::sync::Arc;

use cg_core::{ParameterSet, Stochastics};
use cg_graph::AgentType;
use tracing::debug;

use crate::{
    AgentProfile, DynamicAgentTypeGenerator, DynamicParameterSampler, DynamicProfileSampler, GeneratorConfig,
    ProfileError, ProfileResult, Profiles, PrunedInput, SampledProfiles, SensorParameter, VehicleModels,
};

/// Everything the agent factory needs to build one agent.
#[derive(Clone, Debug)]
pub struct AgentBuildInformation {
    pub agent_profile:            String,
    pub agent_type:               Arc<AgentType>,
    pub vehicle_model:            String,
    pub vehicle_model_parameters: ParameterSet,
    pub sensors:                  Vec<SensorParameter>,
    /// Set for dynamic agents.
    pub sampled:                  Option<SampledProfiles>,
    /// Blueprint inputs dropped while assembling a dynamic agent.
    pub pruned_inputs:            Vec<PrunedInput>,
}

/// Fixed agent types read from system configurations.
pub trait SystemConfigSource {
    fn system(&self, file: &str, system_id: i32) -> Option<Arc<AgentType>>;
}

impl SystemConfigSource for BTreeMap<(String, i32), Arc<AgentType>> {
    fn system(&self, file: &str, system_id: i32) -> Option<Arc<AgentType>> {
        self.get(&(file.to_owned(), system_id)).cloned()
    }
}

pub struct AgentBlueprintProvider {
    profiles:       Profiles,
    vehicle_models: VehicleModels,
    config:         GeneratorConfig,
    /// Every component a dynamic agent may be assembled from.
    blueprint:      Arc<AgentType>,
    systems:        Box<dyn SystemConfigSource>,
}

impl AgentBlueprintProvider {
    pub fn new(
        profiles:       Profiles,
        vehicle_models: VehicleModels,
        config:         GeneratorConfig,
        blueprint:      Arc<AgentType>,
        systems:        Box<dyn SystemConfigSource>,
    ) -> Self {
        Self { profiles, vehicle_models, config, blueprint, systems }
    }

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    /// Build information for one agent of `agent_profile`.
    ///
    /// Dynamic profiles run the full sample → sample → generate pipeline;
    /// static profiles look their agent type up in the system configs.
    pub fn sample_agent(&self, agent_profile: &str, stochastics: &dyn Stochastics) -> ProfileResult<AgentBuildInformation> {
        let profile = self
            .profiles
            .agent_profiles
            .get(agent_profile)
            .ok_or_else(|| ProfileError::UnknownAgentProfile(agent_profile.to_owned()))?;

        match profile {
            AgentProfile::Dynamic { .. } => {
                let sampled = DynamicProfileSampler::new(&self.profiles).sample(agent_profile, stochastics)?;
                let parameters = DynamicParameterSampler::new(&self.profiles).sample(&sampled, stochastics)?;
                DynamicAgentTypeGenerator::new(&self.config, &self.blueprint, &self.profiles, &self.vehicle_models)
                    .generate(&sampled, &parameters)
            }
            AgentProfile::Static { system_config_file, system_id, vehicle_model } => {
                let agent_type = self.systems.system(system_config_file, *system_id).ok_or_else(|| {
                    ProfileError::UnknownSystemConfig { file: system_config_file.clone(), system_id: *system_id }
                })?;
                let vehicle_model_parameters = self
                    .vehicle_models
                    .get(vehicle_model)
                    .cloned()
                    .ok_or_else(|| ProfileError::UnknownVehicleModel(vehicle_model.clone()))?;
                debug!(agent_profile, file = %system_config_file, system_id, "static agent type resolved");
                Ok(AgentBuildInformation {
                    agent_profile: agent_profile.to_owned(),
                    agent_type,
                    vehicle_model: vehicle_model.clone(),
                    vehicle_model_parameters,
                    sensors: Vec::new(),
                    sampled: None,
                    pruned_inputs: Vec::new(),
                })
            }
        }
    }
}
