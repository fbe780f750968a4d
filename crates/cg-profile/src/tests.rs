//! Unit tests for cg-profile.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use cg_core::{NormalDistribution, ParameterSet, ScheduleMetadata, Stochastics};
use cg_graph::{AgentType, ComponentType};

use crate::{
    AgentBlueprintProvider, AgentProfile, GeneratorConfig, Profiles, SensorLink, SensorParameter, SensorPosition,
    SensorProfileRef, VehicleComponent, VehicleModels, VehicleProfile,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Replays scripted draws.  Uniform draws are given as fractions of the
/// requested range; an exhausted normal script returns `fallback_normal`.
#[derive(Default)]
struct Scripted {
    uniforms:        Mutex<VecDeque<f64>>,
    normals:         Mutex<VecDeque<f64>>,
    fallback_normal: f64,
}

impl Scripted {
    fn new(uniforms: &[f64], normals: &[f64]) -> Self {
        Self {
            uniforms:        Mutex::new(uniforms.iter().copied().collect()),
            normals:         Mutex::new(normals.iter().copied().collect()),
            fallback_normal: 1.0e9,
        }
    }
}

impl Stochastics for Scripted {
    fn init_generator(&self, _seed: u64) {}

    fn uniform(&self, low: f64, high: f64) -> f64 {
        let f = self.uniforms.lock().unwrap().pop_front().unwrap_or(0.0);
        low + f * (high - low)
    }

    fn normal(&self, _mean: f64, _std_dev: f64) -> f64 {
        self.normals.lock().unwrap().pop_front().unwrap_or(self.fallback_normal)
    }

    fn exponential(&self, _lambda: f64) -> f64 {
        0.0
    }

    fn seed(&self) -> u64 {
        0
    }
}

fn cyclic() -> ScheduleMetadata {
    ScheduleMetadata::new(false, 0, 0, 0, 100).unwrap()
}

fn ct(name: &str, inputs: &[(u32, u32)], outputs: &[(u32, u32)]) -> Arc<ComponentType> {
    let mut c = ComponentType::new(name, cyclic(), name);
    for &(link, channel) in inputs {
        c = c.with_input(link, channel).unwrap();
    }
    for &(link, channel) in outputs {
        c = c.with_output(link, channel).unwrap();
    }
    Arc::new(c)
}

const DRIVER: &str = "AlgorithmAgentFollowingDriverModel";

/// Every component a test agent may use.  Channel 99 is the highest id.
fn blueprint() -> AgentType {
    let mut t = AgentType::new();
    for c in [
        ct("AgentUpdater", &[(0, 10)], &[]),
        ct("Dynamics", &[(0, 20)], &[(0, 10)]),
        ct(DRIVER, &[(0, 30)], &[(0, 40)]),
        ct("Action", &[(0, 40)], &[(0, 20)]),
        ct("AEB", &[(0, 30)], &[(0, 50)]),
        ct("Prioritizer", &[(0, 50)], &[(0, 60)]),
        ct("Sensor_OSI", &[], &[(0, 70)]),
        ct("SensorFusion", &[(100, 70)], &[(0, 30)]),
        ct("Unused", &[], &[(0, 99)]),
    ] {
        t.add_component(c).unwrap();
    }
    t
}

fn config() -> GeneratorConfig {
    GeneratorConfig {
        basic_components:          vec!["AgentUpdater".into(), "Dynamics".into()],
        driver_components:         vec!["Action".into()],
        vehicle_components_needed: vec!["Prioritizer".into()],
        sensor_blueprint:          "Sensor_OSI".into(),
        sensor_fusion:             "SensorFusion".into(),
        sensor_fusion_base_input:  100,
    }
}

fn sensor(id: i32) -> SensorParameter {
    SensorParameter {
        id,
        position: SensorPosition { name: format!("Mount{id}"), longitudinal: 2.0, height: 0.5, ..Default::default() },
        profile:  SensorProfileRef { name: "Standard".into(), sensor_type: "Geometric2D".into() },
    }
}

fn vehicle(components: Vec<VehicleComponent>, sensors: usize) -> VehicleProfile {
    VehicleProfile {
        vehicle_model:      "car_bmw".into(),
        vehicle_components: components,
        sensors:            (0..sensors as i32).map(sensor).collect(),
    }
}

fn aeb(profile: &str) -> VehicleComponent {
    VehicleComponent {
        component_type:     "AEB".into(),
        component_profiles: vec![(profile.into(), 1.0)],
        sensor_links:       vec![SensorLink { sensor_id: 0, input_id: "Camera".into() }],
    }
}

fn dynamic(driver: &str, vehicle: &str) -> AgentProfile {
    AgentProfile::Dynamic {
        driver_profiles:  vec![(driver.into(), 1.0)],
        vehicle_profiles: vec![(vehicle.into(), 1.0)],
    }
}

fn profiles() -> Profiles {
    let mut p = Profiles::default()
        .with_profile("AEB", "AebStandard", ParameterSet::new().with("TTC", 2.0))
        .with_profile(
            "Geometric2D",
            "Standard",
            ParameterSet::new()
                .with("DetectionRange", 100.0)
                .with("Latency", NormalDistribution::new(50.0, 10.0, 40.0, 60.0).unwrap()),
        );
    p.driver_profiles.insert(
        "Regular".into(),
        ParameterSet::new().with("Type", DRIVER).with("VelocityWish", 30.0),
    );
    p.driver_profiles.insert("Broken".into(), ParameterSet::new().with("VelocityWish", 30.0));

    p.vehicle_profiles.insert("ThreeSensors".into(), vehicle(vec![aeb("AebStandard")], 3));
    p.vehicle_profiles.insert("Bare".into(), vehicle(vec![], 0));
    p.vehicle_profiles.insert("BadAeb".into(), vehicle(vec![aeb("Missing")], 1));

    p.agent_profiles.insert("Car".into(), dynamic("Regular", "ThreeSensors"));
    p.agent_profiles.insert("BareCar".into(), dynamic("Regular", "Bare"));
    p.agent_profiles.insert("BadDriver".into(), dynamic("Broken", "ThreeSensors"));
    p.agent_profiles.insert("BadAeb".into(), dynamic("Regular", "BadAeb"));
    p.agent_profiles.insert(
        "Truck".into(),
        AgentProfile::Static {
            system_config_file: "systems.xml".into(),
            system_id:          1,
            vehicle_model:      "car_bmw".into(),
        },
    );
    p
}

fn vehicle_models() -> VehicleModels {
    [("car_bmw".to_owned(), ParameterSet::new().with("Mass", 1500.0))].into_iter().collect()
}

fn provider(systems: BTreeMap<(String, i32), Arc<AgentType>>) -> AgentBlueprintProvider {
    AgentBlueprintProvider::new(profiles(), vehicle_models(), config(), Arc::new(blueprint()), Box::new(systems))
}

// ── Weighted sampling ─────────────────────────────────────────────────────────

#[cfg(test)]
mod sampling {
    use super::Scripted;
    use crate::{sample_bounded_normal, sample_optional, sample_required};
    use cg_core::NormalDistribution;

    fn options(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(n, w)| ((*n).to_owned(), *w)).collect()
    }

    #[test]
    fn required_pick_normalises_weights() {
        let opts = options(&[("a", 2.0), ("b", 6.0)]);
        // 0.2 * 8 = 1.6 falls in a; 0.3 * 8 = 2.4 falls in b.
        assert_eq!(sample_required(&opts, &Scripted::new(&[0.2], &[])), Some("a"));
        assert_eq!(sample_required(&opts, &Scripted::new(&[0.3], &[])), Some("b"));
        assert_eq!(sample_required(&options(&[("a", 0.0)]), &Scripted::new(&[0.5], &[])), None);
        assert_eq!(sample_required(&[], &Scripted::new(&[0.5], &[])), None);
    }

    #[test]
    fn optional_pick_leaves_remainder_empty() {
        let opts = options(&[("x", 0.3)]);
        assert_eq!(sample_optional(&opts, &Scripted::new(&[0.1], &[])), Some("x"));
        assert_eq!(sample_optional(&opts, &Scripted::new(&[0.5], &[])), None);
    }

    #[test]
    fn bounded_normal_retries_then_clamps() {
        let d = NormalDistribution::new(50.0, 10.0, 40.0, 60.0).unwrap();
        assert_eq!(sample_bounded_normal(&d, &Scripted::new(&[], &[100.0, 10.0, 55.0])), 55.0);
        // Never in range: clamped to the nearest bound.
        assert_eq!(sample_bounded_normal(&d, &Scripted::new(&[], &[])), 60.0);
    }
}

// ── Channel ids ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod allocator {
    use cg_core::ChannelId;

    use crate::{ChannelIdAllocator, ProfileError};

    #[test]
    fn starts_after_blueprint_maximum() {
        let mut a = ChannelIdAllocator::after(Some(ChannelId(99)));
        assert_eq!(a.next_id().unwrap(), ChannelId(100));
        assert_eq!(a.next_id().unwrap(), ChannelId(101));
        assert_eq!(ChannelIdAllocator::after(None).next_id().unwrap(), ChannelId(0));
        assert_eq!(ChannelIdAllocator::starting_at(ChannelId(7)).next_id().unwrap(), ChannelId(7));
    }

    #[test]
    fn exhaustion_is_an_error_not_a_wrap() {
        let mut a = ChannelIdAllocator::after(Some(ChannelId(u32::MAX - 2)));
        assert_eq!(a.next_id().unwrap(), ChannelId(u32::MAX - 1));
        assert!(matches!(a.next_id(), Err(ProfileError::IdSpaceExhausted("channel"))));
        assert!(matches!(a.next_id(), Err(ProfileError::IdSpaceExhausted("channel"))));

        let mut full = ChannelIdAllocator::after(Some(ChannelId(u32::MAX)));
        assert!(matches!(full.next_id(), Err(ProfileError::IdSpaceExhausted(_))));
        let mut invalid = ChannelIdAllocator::starting_at(ChannelId::INVALID);
        assert!(matches!(invalid.next_id(), Err(ProfileError::IdSpaceExhausted(_))));
    }
}

// ── Agent-type generation ─────────────────────────────────────────────────────

#[cfg(test)]
mod generator {
    use std::collections::{BTreeMap, BTreeSet};

    use cg_core::{ChannelId, LinkId};
    use cg_graph::GraphError;

    use super::*;
    use crate::{
        DynamicAgentTypeGenerator, DynamicProfileSampler, ProfileError, PrunedInput, SampledParameters, SampledProfiles,
    };

    fn car() -> crate::AgentBuildInformation {
        // Latencies: 45 for every sensor.
        let stochastics = Scripted::new(&[0.0; 8], &[45.0, 45.0, 45.0]);
        provider(BTreeMap::new()).sample_agent("Car", &stochastics).unwrap()
    }

    #[test]
    fn sensors_replicated_on_distinct_channels() {
        let info = car();
        let t = &info.agent_type;
        let sensors: Vec<_> = (0..3).map(|i| t.component(&format!("Sensor_{i}")).unwrap()).collect();
        assert!(t.component("Sensor_OSI").is_none());

        let outputs: Vec<ChannelId> = sensors.iter().map(|s| s.output_links()[&LinkId(0)]).collect();
        let distinct: BTreeSet<_> = outputs.iter().copied().collect();
        assert_eq!(distinct.len(), 3);
        // Fresh ids lie above every blueprint id.
        assert!(outputs.iter().all(|c| c.0 > 99));
        assert!(outputs.iter().all(|c| t.contains_channel(*c)));

        let fusion = t.component("SensorFusion").unwrap();
        let inputs: Vec<(LinkId, ChannelId)> = fusion.input_links().iter().map(|(l, c)| (*l, *c)).collect();
        assert_eq!(
            inputs,
            vec![(LinkId(100), outputs[0]), (LinkId(101), outputs[1]), (LinkId(102), outputs[2])]
        );
        assert_eq!(sensors[1].model_library(), "Sensor_OSI");
    }

    #[test]
    fn sensor_parameters_injected() {
        let info = car();
        let p = info.agent_type.component("Sensor_2").unwrap().parameters();
        assert_eq!(*p.int("Id").unwrap(), 2);
        assert_eq!(*p.double("Latency").unwrap(), 45.0);
        assert_eq!(*p.double("Longitudinal").unwrap(), 2.0);
        assert_eq!(p.string("Type").unwrap(), "Geometric2D");
        assert_eq!(p.string("Position").unwrap(), "Mount2");
        assert_eq!(*p.double("DetectionRange").unwrap(), 100.0);
        assert_eq!(info.sensors.len(), 3);
    }

    #[test]
    fn driver_and_vehicle_components_assembled() {
        let info = car();
        let t = &info.agent_type;
        let names: Vec<&str> = t.components().keys().map(String::as_str).collect();
        for expected in ["AgentUpdater", "Dynamics", DRIVER, "Action", "AEB", "Prioritizer", "SensorFusion"] {
            assert!(names.contains(&expected), "{expected} missing from {names:?}");
        }
        assert!(!names.contains(&"Unused"));

        let driver = t.component(DRIVER).unwrap();
        assert_eq!(*driver.parameters().double("VelocityWish").unwrap(), 30.0);

        let aeb = t.component("AEB").unwrap().parameters();
        assert_eq!(*aeb.double("TTC").unwrap(), 2.0);
        let links = aeb.list("SensorLinks").unwrap();
        assert_eq!(*links[0].int("SensorId").unwrap(), 0);
        assert_eq!(links[0].string("InputId").unwrap(), "Camera");

        assert_eq!(info.vehicle_model, "car_bmw");
        assert_eq!(*info.vehicle_model_parameters.double("Mass").unwrap(), 1500.0);
        assert_eq!(info.sampled.as_ref().unwrap().driver_profile, "Regular");
    }

    #[test]
    fn inputs_without_producer_pruned() {
        let info = provider(BTreeMap::new())
            .sample_agent("BareCar", &Scripted::new(&[0.0; 4], &[]))
            .unwrap();
        let t = &info.agent_type;
        assert!(t.component("SensorFusion").is_none());
        assert!(t.component("Prioritizer").is_none());
        // Fusion is absent, so nothing feeds the driver's channel 30.
        assert!(t.component(DRIVER).unwrap().input_links().is_empty());
        assert!(!t.contains_channel(ChannelId(30)));
        assert_eq!(t.component("Dynamics").unwrap().input_links()[&LinkId(0)], ChannelId(20));

        assert_eq!(
            info.pruned_inputs,
            vec![PrunedInput { component: DRIVER.into(), link: LinkId(0), channel: ChannelId(30) }]
        );
    }

    #[test]
    fn fully_wired_agent_prunes_nothing() {
        assert!(car().pruned_inputs.is_empty());
    }

    #[test]
    fn fusion_links_past_the_id_space_are_fatal() {
        let mut config = config();
        // Three sensors need MAX - 2, MAX - 1 and MAX; the last is the sentinel.
        config.sensor_fusion_base_input = u32::MAX - 2;
        let provider = AgentBlueprintProvider::new(
            profiles(),
            vehicle_models(),
            config,
            Arc::new(blueprint()),
            Box::new(BTreeMap::new()),
        );
        let err = provider
            .sample_agent("Car", &Scripted::new(&[0.0; 8], &[45.0, 45.0, 45.0]))
            .unwrap_err();
        assert!(matches!(err, ProfileError::IdSpaceExhausted("sensor fusion input link")), "{err}");
    }

    #[test]
    fn unknown_component_profile_is_fatal() {
        let err = provider(BTreeMap::new())
            .sample_agent("BadAeb", &Scripted::new(&[0.0; 4], &[45.0]))
            .unwrap_err();
        assert!(
            matches!(err, ProfileError::UnknownProfile { ref kind, ref name } if kind == "AEB" && name == "Missing"),
            "{err}"
        );
    }

    #[test]
    fn driver_without_type_is_fatal() {
        let err = provider(BTreeMap::new())
            .sample_agent("BadDriver", &Scripted::new(&[0.0; 4], &[45.0; 3]))
            .unwrap_err();
        assert!(matches!(err, ProfileError::MissingField { field: "Type", ref profile } if profile == "Broken"));
    }

    #[test]
    fn duplicate_component_is_fatal() {
        let mut config = config();
        config.basic_components.push("Action".into());
        let (profiles, models, blueprint) = (profiles(), vehicle_models(), blueprint());
        let generator = DynamicAgentTypeGenerator::new(&config, &blueprint, &profiles, &models);
        let sampled = SampledProfiles {
            agent_profile:      "BareCar".into(),
            driver_profile:     "Regular".into(),
            vehicle_profile:    "Bare".into(),
            component_profiles: BTreeMap::new(),
        };
        let err = generator.generate(&sampled, &SampledParameters::default()).unwrap_err();
        assert!(matches!(err, ProfileError::Graph(GraphError::DuplicateComponent(ref n)) if n == "Action"));
    }

    #[test]
    fn repeated_vehicle_component_type_is_fatal() {
        let mut profiles = profiles();
        profiles
            .vehicle_profiles
            .insert("TwoAeb".into(), vehicle(vec![aeb("AebStandard"), aeb("AebStandard")], 1));
        profiles.agent_profiles.insert("TwoAebCar".into(), dynamic("Regular", "TwoAeb"));

        let err = DynamicProfileSampler::new(&profiles)
            .sample("TwoAebCar", &Scripted::new(&[0.0; 8], &[]))
            .unwrap_err();
        assert!(
            matches!(
                err,
                ProfileError::DuplicateVehicleComponent { ref vehicle, ref component_type }
                    if vehicle == "TwoAeb" && component_type == "AEB"
            ),
            "{err}"
        );
    }

    #[test]
    fn unknown_agent_profile() {
        let err = provider(BTreeMap::new()).sample_agent("Bus", &Scripted::default()).unwrap_err();
        assert!(matches!(err, ProfileError::UnknownAgentProfile(ref n) if n == "Bus"));
    }
}

// ── Static profiles ───────────────────────────────────────────────────────────

#[cfg(test)]
mod provider {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::ProfileError;

    #[test]
    fn static_profile_uses_system_config() {
        let system = Arc::new(blueprint());
        let mut systems = BTreeMap::new();
        systems.insert(("systems.xml".to_owned(), 1), Arc::clone(&system));

        let info = provider(systems).sample_agent("Truck", &Scripted::default()).unwrap();
        assert!(Arc::ptr_eq(&info.agent_type, &system));
        assert!(info.sampled.is_none());
        assert_eq!(info.vehicle_model, "car_bmw");
    }

    #[test]
    fn missing_system_config() {
        let err = provider(BTreeMap::new()).sample_agent("Truck", &Scripted::default()).unwrap_err();
        assert!(matches!(err, ProfileError::UnknownSystemConfig { system_id: 1, .. }));
    }
}
