//! Assembles an agent type from sampled
//! profiles.
//!
//! Components are cloned from a blueprint agent type that contains every
//! component a dynamic agent may use.  The generator works on a private
//! draft and only returns an [`AgentType`] once every step has succeeded, so
//! a failing build never leaks a partial graph.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cg_core::{ChannelId, CoreError, LinkId, ParameterSet, ParameterValue};
use cg_graph::{AgentType, ComponentType, GraphError};
use tracing::debug;

use crate::{
    AgentBuildInformation, ProfileError, ProfileResult, Profiles, SampledParameters, SampledProfiles,
    SensorParameter, VehicleModels, VehicleProfile,
};

/// Names of the blueprint components the generator stitches together.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorConfig {
    /// Always present.
    pub basic_components:          Vec<String>,
    /// Added alongside the driver module.
    pub driver_components:         Vec<String>,
    /// Added when at least one vehicle component was fitted.
    pub vehicle_components_needed: Vec<String>,
    /// Cloned once per sensor.
    pub sensor_blueprint:          String,
    /// Consumes every sensor.
    pub sensor_fusion:             String,
    /// Fusion input of the first sensor; sensor `i` uses `base + i`.
    pub sensor_fusion_base_input:  u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let names = |names: &[&str]| -> Vec<String> { names.iter().map(|n| (*n).to_owned()).collect() };
        Self {
            basic_components:          names(&[
                "AgentUpdater",
                "ComponentController",
                "Dynamics_Collision",
                "Dynamics_Prioritizer",
                "Dynamics_RegularDriving",
                "Parameters_Vehicle",
                "Sensor_Driver",
            ]),
            driver_components:         names(&["Action_LongitudinalDriver", "Action_SecondaryDriver"]),
            vehicle_components_needed: names(&["PrioritizerAccelerationVehicleComponents", "PrioritizerSteeringVehicleComponents"]),
            sensor_blueprint:          "Sensor_OSI".into(),
            sensor_fusion:             "SensorFusionOSI".into(),
            sensor_fusion_base_input:  100,
        }
    }
}

/// Hands out channel ids that cannot collide with any id of the blueprint.
///
/// Never hands out [`ChannelId::INVALID`]; once the id space is used up every
/// further request fails.
#[derive(Clone, Debug)]
pub struct ChannelIdAllocator {
    next: Option<ChannelId>,
}

impl ChannelIdAllocator {
    pub fn starting_at(first: ChannelId) -> Self {
        Self { next: (first != ChannelId::INVALID).then_some(first) }
    }

    /// First id after `max`, or 0 when the blueprint has no channels.
    pub fn after(max: Option<ChannelId>) -> Self {
        Self { next: max.map_or(Some(ChannelId(0)), |m| m.checked_offset(1)) }
    }

    pub fn next_id(&mut self) -> ProfileResult<ChannelId> {
        let id = self.next.ok_or(ProfileError::IdSpaceExhausted("channel"))?;
        self.next = id.checked_offset(1);
        Ok(id)
    }
}

/// An input link dropped because no component of the agent produces its
/// channel.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrunedInput {
    pub component: String,
    pub link:      LinkId,
    pub channel:   ChannelId,
}

/// Components collected so far, keyed by name.
#[derive(Default)]
struct Draft {
    components: BTreeMap<String, ComponentType>,
}

impl Draft {
    fn insert(&mut self, component: ComponentType) -> ProfileResult<()> {
        if self.components.contains_key(component.name()) {
            return Err(GraphError::DuplicateComponent(component.name().to_owned()).into());
        }
        self.components.insert(component.name().to_owned(), component);
        Ok(())
    }

    /// Register every produced channel and drop input links nobody feeds.
    fn finish(self) -> ProfileResult<(AgentType, Vec<PrunedInput>)> {
        let produced: BTreeSet<ChannelId> = self
            .components
            .values()
            .flat_map(|c| c.output_links().values().copied())
            .collect();

        let mut agent_type = AgentType::new();
        let mut pruned = Vec::new();
        for &channel in &produced {
            agent_type.add_channel(channel)?;
        }
        for (name, mut component) in self.components {
            let dangling: Vec<(LinkId, ChannelId)> = component
                .input_links()
                .iter()
                .filter(|(_, channel)| !produced.contains(*channel))
                .map(|(&link, &channel)| (link, channel))
                .collect();
            for (link, channel) in dangling {
                debug!(component = %name, %link, %channel, "pruning input without producer");
                component.remove_input_link(link);
                pruned.push(PrunedInput { component: name.clone(), link, channel });
            }
            agent_type.add_component(Arc::new(component))?;
        }
        Ok((agent_type, pruned))
    }
}

pub struct DynamicAgentTypeGenerator<'a> {
    config:         &'a GeneratorConfig,
    blueprint:      &'a AgentType,
    profiles:       &'a Profiles,
    vehicle_models: &'a VehicleModels,
}

impl<'a> DynamicAgentTypeGenerator<'a> {
    pub fn new(
        config:         &'a GeneratorConfig,
        blueprint:      &'a AgentType,
        profiles:       &'a Profiles,
        vehicle_models: &'a VehicleModels,
    ) -> Self {
        Self { config, blueprint, profiles, vehicle_models }
    }

    pub fn generate(
        &self,
        sampled:    &SampledProfiles,
        parameters: &SampledParameters,
    ) -> ProfileResult<AgentBuildInformation> {
        let vehicle = self
            .profiles
            .vehicle_profiles
            .get(&sampled.vehicle_profile)
            .ok_or_else(|| ProfileError::UnknownProfile {
                kind: "vehicle".into(),
                name: sampled.vehicle_profile.clone(),
            })?;

        let mut draft = Draft::default();
        let mut channels = ChannelIdAllocator::after(self.blueprint.max_channel_id());

        self.gather_all(&mut draft, &self.config.basic_components)?;
        self.gather_driver(&mut draft, &sampled.driver_profile)?;
        self.gather_vehicle_components(&mut draft, sampled, vehicle)?;
        self.gather_sensors(&mut draft, vehicle, parameters, &mut channels)?;

        let vehicle_model_parameters = self
            .vehicle_models
            .get(&vehicle.vehicle_model)
            .cloned()
            .ok_or_else(|| ProfileError::UnknownVehicleModel(vehicle.vehicle_model.clone()))?;

        let (agent_type, pruned_inputs) = draft.finish()?;
        debug!(
            agent_profile = %sampled.agent_profile,
            components = agent_type.components().len(),
            channels = agent_type.channels().len(),
            pruned_inputs = pruned_inputs.len(),
            "dynamic agent type generated",
        );
        Ok(AgentBuildInformation {
            agent_profile: sampled.agent_profile.clone(),
            agent_type: Arc::new(agent_type),
            vehicle_model: vehicle.vehicle_model.clone(),
            vehicle_model_parameters,
            sensors: vehicle.sensors.clone(),
            sampled: Some(sampled.clone()),
            pruned_inputs,
        })
    }

    fn blueprint_component(&self, name: &str) -> ProfileResult<ComponentType> {
        self.blueprint
            .component(name)
            .map(|c| ComponentType::clone(c))
            .ok_or_else(|| ProfileError::UnknownBlueprint(name.to_owned()))
    }

    fn gather_all(&self, draft: &mut Draft, names: &[String]) -> ProfileResult<()> {
        for name in names {
            draft.insert(self.blueprint_component(name)?)?;
        }
        Ok(())
    }

    /// The driver module named by the profile's `Type`, carrying the
    /// profile's parameters, plus the driver helpers.
    fn gather_driver(&self, draft: &mut Draft, driver_profile: &str) -> ProfileResult<()> {
        let parameters = self
            .profiles
            .driver_profiles
            .get(driver_profile)
            .ok_or_else(|| ProfileError::UnknownProfile { kind: "driver".into(), name: driver_profile.to_owned() })?;
        let module = match parameters.string("Type") {
            Ok(module) => module,
            Err(CoreError::MissingParameter(_)) => {
                return Err(ProfileError::MissingField { profile: driver_profile.to_owned(), field: "Type" });
            }
            Err(err) => return Err(err.into()),
        };

        let mut driver = self.blueprint_component(module)?;
        driver.set_parameters(Arc::new(parameters.clone()));
        draft.insert(driver)?;
        self.gather_all(draft, &self.config.driver_components)
    }

    fn gather_vehicle_components(
        &self,
        draft:   &mut Draft,
        sampled: &SampledProfiles,
        vehicle: &VehicleProfile,
    ) -> ProfileResult<()> {
        let mut fitted = 0;
        for slot in &vehicle.vehicle_components {
            let Some(profile_name) = sampled.component_profiles.get(&slot.component_type) else {
                continue;
            };
            let mut parameters = self
                .profiles
                .profile_group(&slot.component_type, profile_name)
                .cloned()
                .ok_or_else(|| ProfileError::UnknownProfile {
                    kind: slot.component_type.clone(),
                    name: profile_name.clone(),
                })?;
            if !slot.sensor_links.is_empty() {
                let links = slot
                    .sensor_links
                    .iter()
                    .map(|l| {
                        ParameterSet::new()
                            .with("SensorId", l.sensor_id)
                            .with("InputId", l.input_id.as_str())
                    })
                    .collect();
                parameters.insert("SensorLinks", ParameterValue::List(links));
            }

            let mut component = self.blueprint_component(&slot.component_type)?;
            component.set_parameters(Arc::new(parameters));
            draft.insert(component)?;
            fitted += 1;
        }
        if fitted > 0 {
            self.gather_all(draft, &self.config.vehicle_components_needed)?;
        }
        Ok(())
    }

    /// One `Sensor_<id>` per declared sensor, each on fresh channels, all
    /// feeding the fusion component.
    fn gather_sensors(
        &self,
        draft:      &mut Draft,
        vehicle:    &VehicleProfile,
        parameters: &SampledParameters,
        channels:   &mut ChannelIdAllocator,
    ) -> ProfileResult<()> {
        if vehicle.sensors.is_empty() {
            return Ok(());
        }
        let base = self.config.sensor_fusion_base_input;
        let sensor_blueprint = self.blueprint_component(&self.config.sensor_blueprint)?;
        let mut fusion = self.blueprint_component(&self.config.sensor_fusion)?;
        fusion.remove_input_link(LinkId(base));

        for (index, sensor) in vehicle.sensors.iter().enumerate() {
            let latency = parameters.sensor_latencies.get(&sensor.id).copied().unwrap_or(0.0);
            let sensor_parameters = self.sensor_parameters(sensor, latency)?;

            let mut component = sensor_blueprint.renamed(format!("Sensor_{}", sensor.id));
            let outputs: Vec<LinkId> = component.output_links().keys().copied().collect();
            let mut fusion_channel = None;
            for link in outputs {
                let channel = channels.next_id()?;
                component.replace_output_channel(link, channel)?;
                fusion_channel.get_or_insert(channel);
            }
            component.set_parameters(Arc::new(sensor_parameters));
            draft.insert(component)?;

            if let Some(channel) = fusion_channel {
                let link = u32::try_from(index)
                    .ok()
                    .and_then(|i| LinkId(base).checked_offset(i))
                    .ok_or(ProfileError::IdSpaceExhausted("sensor fusion input link"))?;
                fusion.add_input_link(link, channel)?;
            }
        }
        draft.insert(fusion)
    }

    fn sensor_parameters(&self, sensor: &SensorParameter, latency: f64) -> ProfileResult<ParameterSet> {
        let reference = &sensor.profile;
        let profile = self
            .profiles
            .profile_group(&reference.sensor_type, &reference.name)
            .ok_or_else(|| ProfileError::UnknownProfile {
                kind: reference.sensor_type.clone(),
                name: reference.name.clone(),
            })?;
        let position = &sensor.position;
        Ok(profile
            .clone()
            .with("Id", sensor.id)
            .with("Name", reference.name.as_str())
            .with("Type", reference.sensor_type.as_str())
            .with("Latency", latency)
            .with("Position", position.name.as_str())
            .with("Longitudinal", position.longitudinal)
            .with("Lateral", position.lateral)
            .with("Height", position.height)
            .with("Yaw", position.yaw)
            .with("Pitch", position.pitch)
            .with("Roll", position.roll))
    }
}
