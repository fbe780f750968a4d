//! Profile and parameter sampling.
//!
//! Both samplers are pure: they read the catalogue, draw from the supplied
//! stochastics and return a new record.  The generator consumes the two
//! records; nothing is mutated along the way.

use std::collections::{BTreeMap, BTreeSet};

use cg_core::{NormalDistribution, ParameterValue, Stochastics};
use tracing::{debug, trace};

use crate::{AgentProfile, ProfileError, ProfileResult, Profiles};

/// Attempts before a bounded-normal draw gives up and clamps.
pub const MAX_BOUNDED_DRAWS: usize = 100;

/// Result of [`DynamicProfileSampler::sample`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampledProfiles {
    pub agent_profile:      String,
    pub driver_profile:     String,
    pub vehicle_profile:    String,
    /// Component type → chosen profile.  Slots that rolled "not fitted" are
    /// absent.  A vehicle profile holds at most one slot per component type,
    /// so no slot is lost to a key collision.
    pub component_profiles: BTreeMap<String, String>,
}

/// Result of [`DynamicParameterSampler::sample`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampledParameters {
    /// Sensor id → latency in milliseconds.
    pub sensor_latencies: BTreeMap<i32, f64>,
}

// ── Weighted picks ────────────────────────────────────────────────────────────

/// Pick one option with probability proportional to its weight.
pub fn sample_required<'a>(options: &'a [(String, f64)], stochastics: &dyn Stochastics) -> Option<&'a str> {
    let total: f64 = options.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let roll = stochastics.uniform(0.0, total);
    pick(options, roll).or_else(|| {
        // Rounding can leave `roll` a hair above the cumulative sum.
        options.iter().rev().find(|(_, w)| *w > 0.0).map(|(n, _)| n.as_str())
    })
}

/// Pick at most one option; weights are absolute probabilities and the
/// remainder up to 1 selects nothing.
pub fn sample_optional<'a>(options: &'a [(String, f64)], stochastics: &dyn Stochastics) -> Option<&'a str> {
    pick(options, stochastics.uniform(0.0, 1.0))
}

fn pick(options: &[(String, f64)], roll: f64) -> Option<&str> {
    let mut cumulative = 0.0;
    for (name, weight) in options {
        cumulative += weight.max(0.0);
        if roll < cumulative {
            return Some(name);
        }
    }
    None
}

/// Normal draw inside `[min, max]`, retried up to [`MAX_BOUNDED_DRAWS`] times
/// and clamped after that.
pub fn sample_bounded_normal(distribution: &NormalDistribution, stochastics: &dyn Stochastics) -> f64 {
    let mut value = distribution.mean;
    for _ in 0..MAX_BOUNDED_DRAWS {
        value = stochastics.normal(distribution.mean, distribution.std_dev);
        if distribution.contains(value) {
            return value;
        }
    }
    trace!(?distribution, value, "bounded normal clamped");
    distribution.clamp(value)
}

// ── Samplers ──────────────────────────────────────────────────────────────────

/// Draws driver, vehicle and component profiles for one dynamic agent.
pub struct DynamicProfileSampler<'a> {
    profiles: &'a Profiles,
}

impl<'a> DynamicProfileSampler<'a> {
    pub fn new(profiles: &'a Profiles) -> Self {
        Self { profiles }
    }

    pub fn sample(&self, agent_profile: &str, stochastics: &dyn Stochastics) -> ProfileResult<SampledProfiles> {
        let profile = self
            .profiles
            .agent_profiles
            .get(agent_profile)
            .ok_or_else(|| ProfileError::UnknownAgentProfile(agent_profile.to_owned()))?;
        let AgentProfile::Dynamic { driver_profiles, vehicle_profiles } = profile else {
            return Err(ProfileError::NotDynamic(agent_profile.to_owned()));
        };

        let driver_profile = sample_required(driver_profiles, stochastics)
            .ok_or_else(|| ProfileError::NoOptions(format!("driver of agent profile '{agent_profile}'")))?;
        let vehicle_profile = sample_required(vehicle_profiles, stochastics)
            .ok_or_else(|| ProfileError::NoOptions(format!("vehicle of agent profile '{agent_profile}'")))?;

        let vehicle = self
            .profiles
            .vehicle_profiles
            .get(vehicle_profile)
            .ok_or_else(|| ProfileError::UnknownProfile { kind: "vehicle".into(), name: vehicle_profile.to_owned() })?;

        let mut component_profiles = BTreeMap::new();
        let mut slot_types = BTreeSet::new();
        for slot in &vehicle.vehicle_components {
            if !slot_types.insert(slot.component_type.as_str()) {
                return Err(ProfileError::DuplicateVehicleComponent {
                    vehicle:        vehicle_profile.to_owned(),
                    component_type: slot.component_type.clone(),
                });
            }
            if let Some(chosen) = sample_optional(&slot.component_profiles, stochastics) {
                component_profiles.insert(slot.component_type.clone(), chosen.to_owned());
            }
        }

        debug!(
            agent_profile,
            driver_profile,
            vehicle_profile,
            components = component_profiles.len(),
            "profiles sampled",
        );
        Ok(SampledProfiles {
            agent_profile: agent_profile.to_owned(),
            driver_profile: driver_profile.to_owned(),
            vehicle_profile: vehicle_profile.to_owned(),
            component_profiles,
        })
    }
}

/// Draws per-sensor values for the sampled vehicle.
pub struct DynamicParameterSampler<'a> {
    profiles: &'a Profiles,
}

impl<'a> DynamicParameterSampler<'a> {
    pub fn new(profiles: &'a Profiles) -> Self {
        Self { profiles }
    }

    /// Latency of every sensor, from the `Latency` entry of its sensor
    /// profile: a fixed double, a bounded normal distribution, or absent (0).
    pub fn sample(&self, sampled: &SampledProfiles, stochastics: &dyn Stochastics) -> ProfileResult<SampledParameters> {
        let vehicle = self.profiles.vehicle_profiles.get(&sampled.vehicle_profile).ok_or_else(|| {
            ProfileError::UnknownProfile { kind: "vehicle".into(), name: sampled.vehicle_profile.clone() }
        })?;

        let mut sensor_latencies = BTreeMap::new();
        for sensor in &vehicle.sensors {
            let reference = &sensor.profile;
            let profile = self
                .profiles
                .profile_group(&reference.sensor_type, &reference.name)
                .ok_or_else(|| ProfileError::UnknownProfile {
                    kind: reference.sensor_type.clone(),
                    name: reference.name.clone(),
                })?;
            let latency = match profile.get("Latency") {
                Some(ParameterValue::NormalDistribution(d)) => sample_bounded_normal(d, stochastics),
                Some(ParameterValue::Double(v)) => *v,
                Some(ParameterValue::Int(v)) => f64::from(*v),
                Some(other) => {
                    return Err(cg_core::CoreError::ParameterType {
                        key:      "Latency".into(),
                        expected: "normal distribution",
                        found:    other.type_name(),
                    }
                    .into());
                }
                None => 0.0,
            };
            sensor_latencies.insert(sensor.id, latency);
        }
        Ok(SampledParameters { sensor_latencies })
    }
}
