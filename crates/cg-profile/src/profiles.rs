//! Profile catalogue: plain data filled by an external importer.

use std::collections::BTreeMap;

use cg_core::ParameterSet;

/// Weighted options, kept in declaration order so sampling is reproducible.
pub type Probabilities = Vec<(String, f64)>;

/// Every profile known to an experiment.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Profiles {
    pub agent_profiles:   BTreeMap<String, AgentProfile>,
    /// Driver profile name → driver parameters (must contain `Type`).
    pub driver_profiles:  BTreeMap<String, ParameterSet>,
    pub vehicle_profiles: BTreeMap<String, VehicleProfile>,
    /// Profile type (component type or sensor type) → profile name → parameters.
    pub profile_groups:   BTreeMap<String, BTreeMap<String, ParameterSet>>,
}

impl Profiles {
    pub fn profile_group(&self, kind: &str, name: &str) -> Option<&ParameterSet> {
        self.profile_groups.get(kind)?.get(name)
    }

    /// Builder-style insert into `profile_groups`.
    pub fn with_profile(mut self, kind: impl Into<String>, name: impl Into<String>, parameters: ParameterSet) -> Self {
        self.profile_groups
            .entry(kind.into())
            .or_default()
            .insert(name.into(), parameters);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentProfile {
    /// Driver and vehicle drawn from weighted options at build time.
    Dynamic {
        driver_profiles:  Probabilities,
        vehicle_profiles: Probabilities,
    },
    /// A fixed component graph taken from a system configuration.
    Static {
        system_config_file: String,
        system_id:          i32,
        vehicle_model:      String,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleProfile {
    pub vehicle_model:      String,
    pub vehicle_components: Vec<VehicleComponent>,
    pub sensors:            Vec<SensorParameter>,
}

/// A component slot of a vehicle profile.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleComponent {
    /// Blueprint name, also the profile-group kind of its profiles.
    pub component_type:     String,
    /// Optional pick: the probability mass left over means "not fitted".
    pub component_profiles: Probabilities,
    pub sensor_links:       Vec<SensorLink>,
}

/// Routes one sensor's data to an input of a vehicle component.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorLink {
    pub sensor_id: i32,
    pub input_id:  String,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorParameter {
    pub id:       i32,
    pub position: SensorPosition,
    pub profile:  SensorProfileRef,
}

/// Mounting position relative to the vehicle reference point, metres and
/// radians.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorPosition {
    pub name:         String,
    pub longitudinal: f64,
    pub lateral:      f64,
    pub height:       f64,
    pub yaw:          f64,
    pub pitch:        f64,
    pub roll:         f64,
}

/// Key into `profile_groups`: `sensor_type` is the group, `name` the entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorProfileRef {
    pub name:        String,
    pub sensor_type: String,
}

/// Vehicle model name → model parameters.
pub type VehicleModels = BTreeMap<String, ParameterSet>;
