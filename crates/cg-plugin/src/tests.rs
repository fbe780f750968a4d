//! Unit tests for cg-plugin.
//!
//! Plugins are compiled into the test binary and served through
//! [`StaticLoader`], so every call still goes through the resolved entry
//! points and the panic barriers.

use std::any::Any;
use std::cell::RefCell;
use std::ffi::c_char;
use std::rc::Rc;
use std::sync::Arc;

use cg_core::{
    Collaborators, EventNetwork, LinkId, RunResult, Signal, SimStochastics, SimTime, TracingCallbacks,
    ValueSignal, World,
};

use crate::abi::{ModelImplementation, ModelInit, ObservationImplementation, ObservationInit};
use crate::{ModelBinding, PluginConfig, StaticLibrary, StaticLoader};

// ── Test plugins ──────────────────────────────────────────────────────────────

struct NullWorld;

impl World for NullWorld {
    fn reset(&self) {}

    fn clear(&self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct NullEvents;

impl EventNetwork for NullEvents {
    fn clear(&self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn collaborators() -> Collaborators {
    Collaborators::new(
        Arc::new(SimStochastics::new(7)),
        Arc::new(NullWorld),
        Arc::new(NullEvents),
        Arc::new(TracingCallbacks),
    )
}

fn int_of(signal: Option<&Signal>) -> Option<i32> {
    signal
        .and_then(|s| s.downcast_ref::<ValueSignal<i32>>())
        .map(|v| v.value)
}

/// Publishes `input * factor`; publishes the `constant` parameter if it has
/// no input.
struct Scaler {
    factor:     i32,
    last_input: Option<i32>,
    constant:   i32,
    controller: bool,
    panicky:    bool,
}

impl ModelImplementation for Scaler {
    fn create(init: &ModelInit<'_>) -> Result<Self, String> {
        let p = init.parameters;
        if p.bool("reject").copied().unwrap_or(false) {
            return Err("rejected by parameter".into());
        }
        Ok(Self {
            factor:     p.int("factor").copied().unwrap_or(1),
            last_input: None,
            constant:   p.int("constant").copied().unwrap_or(0),
            controller: init.event_network.is_some(),
            panicky:    p.bool("panic").copied().unwrap_or(false),
        })
    }

    fn update_input(&mut self, _link: LinkId, signal: Option<&Signal>, _time: SimTime) -> Result<(), String> {
        self.last_input = int_of(signal);
        Ok(())
    }

    fn update_output(&mut self, link: LinkId, _time: SimTime) -> Result<Option<Signal>, String> {
        match link.0 {
            0 => Ok(Some(ValueSignal::shared(self.last_input.map_or(self.constant, |v| v * self.factor)))),
            1 => Ok(Some(ValueSignal::shared(self.controller))),
            other => Err(format!("no output link {other}")),
        }
    }

    fn trigger(&mut self, _time: SimTime) -> Result<(), String> {
        if self.panicky {
            panic!("model blew up");
        }
        Ok(())
    }
}

thread_local! {
    /// `(observer, hook)` in call order.
    static HOOK_LOG: RefCell<Vec<(u32, &'static str)>> = const { RefCell::new(Vec::new()) };
}

fn hook_log() -> Vec<(u32, &'static str)> {
    HOOK_LOG.with(|l| l.borrow().clone())
}

fn reset_hook_log() {
    HOOK_LOG.with(|l| l.borrow_mut().clear());
}

/// Records every hook; ends the run at `end_at` and fails updates when
/// `fail_update` is set.
struct Recorder {
    id:          u32,
    end_at:      i32,
    fail_update: bool,
    result_dir:  Option<String>,
}

impl Recorder {
    fn log(&self, hook: &'static str) {
        HOOK_LOG.with(|l| l.borrow_mut().push((self.id, hook)));
    }
}

impl ObservationImplementation for Recorder {
    fn create(init: &ObservationInit<'_>) -> Result<Self, String> {
        Ok(Self {
            id:          init.id.0,
            end_at:      init.parameters.int("end_at").copied().unwrap_or(i32::MAX),
            fail_update: init.parameters.bool("fail_update").copied().unwrap_or(false),
            result_dir:  None,
        })
    }

    fn master_pre(&mut self) -> Result<(), String> {
        self.log("master_pre");
        Ok(())
    }

    fn slave_pre(&mut self, path: &str) -> Result<(), String> {
        self.log("slave_pre");
        self.result_dir = Some(path.to_owned());
        Ok(())
    }

    fn slave_pre_run(&mut self) -> Result<(), String> {
        self.log("slave_pre_run");
        Ok(())
    }

    fn slave_update(&mut self, time: SimTime, run_result: &mut RunResult) -> Result<(), String> {
        self.log("slave_update");
        if self.fail_update {
            return Err("update failed".into());
        }
        if time.as_millis() >= self.end_at {
            run_result.set_end_condition(time);
        }
        Ok(())
    }

    fn slave_post_run(&mut self, run_result: &RunResult) -> Result<(), String> {
        self.log(if run_result.is_end_condition() { "slave_post_run:end" } else { "slave_post_run" });
        Ok(())
    }

    fn slave_post(&mut self) -> Result<(), String> {
        self.log("slave_post");
        Ok(())
    }

    fn result_file(&self) -> Option<String> {
        self.result_dir.as_ref().map(|d| format!("{d}/observer_{}.xml", self.id))
    }
}

extern "C-unwind" fn future_version() -> *const c_char {
    c"2.0".as_ptr()
}

fn loader() -> Rc<StaticLoader> {
    Rc::new(
        StaticLoader::new()
            .with_library("Scaler", StaticLibrary::model::<Scaler>())
            .with_library("ComponentController", StaticLibrary::model::<Scaler>())
            .with_library(
                "Future",
                StaticLibrary::model::<Scaler>().with_symbol(
                    crate::abi::symbols::MODEL_GET_VERSION,
                    future_version as crate::abi::GetVersionFn as *const (),
                ),
            )
            .with_library(
                "Truncated",
                StaticLibrary::model::<Scaler>().without_symbol(crate::abi::symbols::MODEL_TRIGGER),
            )
            .with_library("Recorder", StaticLibrary::observation::<Recorder>()),
    )
}

fn binding(loader: &Rc<StaticLoader>) -> ModelBinding {
    ModelBinding::new(PluginConfig::new("plugins"), loader.clone(), collaborators())
}

// ── ABI helpers ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod abi {
    use crate::abi::compatible;

    #[test]
    fn major_version_decides() {
        assert!(compatible("1.0.0", "1.0.0"));
        assert!(compatible("1.4", "1.0.0"));
        assert!(!compatible("2.0", "1.0.0"));
        assert!(!compatible("", "1.0.0"));
    }
}

// ── Library paths ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod paths {
    use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
    use std::rc::Rc;

    use crate::{DynamicLoader, ModelBinding, PluginConfig, PluginError};

    #[test]
    fn platform_file_name_with_debug_postfix() {
        let config = PluginConfig::new("/opt/sim/lib").with_debug_postfix("d");
        let path = config.library_path("Sensor_OSI");
        assert_eq!(path.parent().unwrap(), config.library_dir());
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{DLL_PREFIX}Sensor_OSId{DLL_SUFFIX}")
        );
    }

    #[test]
    fn missing_shared_object_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut binding = ModelBinding::new(PluginConfig::new(dir.path()), Rc::new(DynamicLoader), super::collaborators());
        match binding.library("Absent") {
            Err(PluginError::Load { library, path, .. }) => {
                assert_eq!(library, "Absent");
                assert!(path.starts_with(dir.path()));
            }
            other => panic!("expected a load error, got {other:?}"),
        }
        assert!(!binding.is_loaded("Absent"));
    }
}

// ── Model binding ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod model {
    use std::sync::Arc;

    use cg_core::{AgentId, ParameterSet, ScheduleMetadata, SimTime};
    use cg_graph::{ComponentFactory, ComponentRequest, ComponentType, GraphError, ModelInstance, ReleaseOutcome};

    use super::*;
    use crate::PluginError;

    fn component(library: &str, parameters: ParameterSet) -> Arc<ComponentType> {
        let mut c = ComponentType::new("c", ScheduleMetadata::new(false, 0, 0, 0, 100).unwrap(), library);
        c.set_parameters(Arc::new(parameters));
        Arc::new(c)
    }

    fn request<'a>(name: &'a str, ct: &'a Arc<ComponentType>) -> ComponentRequest<'a> {
        ComponentRequest { agent: AgentId(0), name, component_type: ct, observers: &[] }
    }

    #[test]
    fn library_loaded_once_for_many_components() {
        let loader = loader();
        let mut binding = binding(&loader);
        let ct = component("Scaler", ParameterSet::new());
        let a = binding.create(&request("a", &ct)).unwrap();
        let b = binding.create(&request("b", &ct)).unwrap();

        assert_eq!(loader.open_count("Scaler"), 1);
        assert!(Rc::ptr_eq(a.library(), b.library()));
        assert_eq!(a.library().live_instances(), 2);

        assert_eq!(binding.release(a), ReleaseOutcome::Released);
        assert_eq!(binding.release(b), ReleaseOutcome::Released);
        assert_eq!(binding.library("Scaler").unwrap().live_instances(), 0);
        assert_eq!(loader.open_count("Scaler"), 1);
    }

    #[test]
    fn incompatible_version_is_not_cached() {
        let loader = loader();
        let mut binding = binding(&loader);
        for _ in 0..2 {
            match binding.library("Future") {
                Err(PluginError::IncompatibleVersion { found, .. }) => assert_eq!(found, "2.0"),
                other => panic!("expected a version error, got {other:?}"),
            }
        }
        assert!(!binding.is_loaded("Future"));
        assert_eq!(loader.open_count("Future"), 2);
    }

    #[test]
    fn missing_symbol_abandons_bind() {
        let loader = loader();
        let mut binding = binding(&loader);
        assert!(matches!(
            binding.library("Truncated"),
            Err(PluginError::MissingSymbol { symbol: "ModelTrigger", .. })
        ));
        assert!(!binding.is_loaded("Truncated"));
    }

    #[test]
    fn rejected_create_surfaces_as_creation_error() {
        let loader = loader();
        let mut binding = binding(&loader);
        let ct = component("Scaler", ParameterSet::new().with("reject", true));
        let Err(err) = binding.create_component(&request("a", &ct)) else {
            panic!("create should have been rejected");
        };
        assert!(matches!(err, GraphError::ComponentCreation { ref component, .. } if component == "a"));
        assert_eq!(binding.library("Scaler").unwrap().live_instances(), 0);
    }

    #[test]
    fn calls_cross_the_abi() {
        let loader = loader();
        let mut binding = binding(&loader);
        let ct = component("Scaler", ParameterSet::new().with("factor", 3));
        let mut model = binding.create(&request("a", &ct)).unwrap();

        let input = cg_core::ValueSignal::shared(14);
        model.update_input(LinkId(0), Some(&input), SimTime(0)).unwrap();
        model.trigger(SimTime(0)).unwrap();
        let out = model.update_output(LinkId(0), SimTime(0)).unwrap();
        assert_eq!(int_of(out.as_ref()), Some(42));

        assert!(model.update_output(LinkId(9), SimTime(0)).is_err());
        binding.release(model);
    }

    #[test]
    fn panic_is_contained() {
        let loader = loader();
        let mut binding = binding(&loader);
        let ct = component("Scaler", ParameterSet::new().with("panic", true));
        let mut model = binding.create(&request("a", &ct)).unwrap();
        match model.trigger(SimTime(0)) {
            Err(cg_graph::ModelCallError::Panicked { entry_point, message }) => {
                assert_eq!(entry_point, "ModelTrigger");
                assert_eq!(message, "model blew up");
            }
            other => panic!("expected a contained panic, got {other:?}"),
        }
        // The instance is still usable.
        assert!(model.update_output(LinkId(0), SimTime(0)).is_ok());
        binding.release(model);
    }

    #[test]
    fn returned_error_is_a_rejection() {
        let loader = loader();
        let mut binding = binding(&loader);
        let ct = component("Scaler", ParameterSet::new());
        let mut model = binding.create(&request("a", &ct)).unwrap();
        match model.update_output(LinkId(7), SimTime(0)) {
            Err(cg_graph::ModelCallError::Rejected { entry_point }) => assert_eq!(entry_point, "ModelUpdateOutput"),
            other => panic!("expected a rejection, got {other:?}"),
        }
        binding.release(model);
    }

    #[test]
    fn only_the_controller_sees_the_event_network() {
        let loader = loader();
        let mut binding = binding(&loader);
        let plain = component("Scaler", ParameterSet::new());
        let controller = component("ComponentController", ParameterSet::new());
        let mut p = binding.create(&request("p", &plain)).unwrap();
        let mut c = binding.create(&request("c", &controller)).unwrap();

        let seen = |m: &mut crate::BoundModel| {
            m.update_output(LinkId(1), SimTime(0))
                .unwrap()
                .and_then(|s| s.downcast_ref::<cg_core::ValueSignal<bool>>().map(|v| v.value))
        };
        assert_eq!(seen(&mut p), Some(false));
        assert_eq!(seen(&mut c), Some(true));
        binding.release(p);
        binding.release(c);
    }

    #[test]
    fn unload_defers_until_release() {
        let loader = loader();
        let mut binding = binding(&loader);
        let ct = component("Scaler", ParameterSet::new());
        let mut model = binding.create(&request("a", &ct)).unwrap();

        binding.unload();
        assert!(!binding.is_loaded("Scaler"));
        assert_eq!(model.library().live_instances(), 1);
        model.trigger(SimTime(0)).unwrap();

        let library = Rc::clone(model.library());
        assert_eq!(binding.release(model), ReleaseOutcome::Released);
        assert_eq!(library.live_instances(), 0);
    }

    #[test]
    fn foreign_instance_is_not_tracked() {
        struct Foreign;
        impl ModelInstance for Foreign {
            fn library_name(&self) -> &str {
                "Foreign"
            }
            fn trigger(&mut self, _: SimTime) -> Result<(), cg_graph::ModelCallError> {
                Ok(())
            }
            fn update_input(
                &mut self,
                _: LinkId,
                _: Option<&Signal>,
                _: SimTime,
            ) -> Result<(), cg_graph::ModelCallError> {
                Ok(())
            }
            fn update_output(&mut self, _: LinkId, _: SimTime) -> Result<Option<Signal>, cg_graph::ModelCallError> {
                Ok(None)
            }
            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }
        }

        let loader = loader();
        let mut binding = binding(&loader);
        assert_eq!(binding.release_component(Box::new(Foreign)), ReleaseOutcome::NotTracked);
    }
}

// ── Agents bound through plugins ──────────────────────────────────────────────

#[cfg(test)]
mod agent {
    use std::sync::Arc;

    use cg_core::{AgentId, ChannelId, LinkId, ParameterSet, ScheduleMetadata, SimTime};
    use cg_graph::{Agent, AgentType, ComponentType};

    use super::*;

    #[test]
    fn data_flows_between_plugin_components() {
        let schedule = ScheduleMetadata::new(false, 0, 0, 0, 100).unwrap();
        let mut source = ComponentType::new("source", schedule, "Scaler").with_output(0, 1).unwrap();
        source.set_parameters(Arc::new(ParameterSet::new().with("constant", 21)));
        let mut doubler = ComponentType::new("doubler", schedule, "Scaler")
            .with_input(0, 1)
            .unwrap()
            .with_output(0, 2)
            .unwrap();
        doubler.set_parameters(Arc::new(ParameterSet::new().with("factor", 2)));

        let mut t = AgentType::new();
        t.add_channel(ChannelId(1)).unwrap();
        t.add_channel(ChannelId(2)).unwrap();
        t.add_component(Arc::new(source)).unwrap();
        t.add_component(Arc::new(doubler)).unwrap();

        let loader = loader();
        let mut binding = binding(&loader);
        let mut agent = Agent::instantiate(AgentId(0), SimTime(0), &t, &mut binding, &[]).unwrap();
        let s = agent.component_index("source").unwrap();
        let d = agent.component_index("doubler").unwrap();

        agent.trigger_cycle(s, SimTime(0)).unwrap();
        agent.acquire_output_data(s, LinkId(0), SimTime(0)).unwrap();
        agent.update_input_data(d, LinkId(0), SimTime(0)).unwrap();
        agent.trigger_cycle(d, SimTime(0)).unwrap();
        agent.acquire_output_data(d, LinkId(0), SimTime(0)).unwrap();

        let out = agent.component(d).unwrap().output_buffer(LinkId(0)).unwrap().get();
        assert_eq!(int_of(out), Some(42));
        assert_eq!(loader.open_count("Scaler"), 1);

        let library = binding.library("Scaler").unwrap();
        assert_eq!(library.live_instances(), 2);
        agent.destroy(&mut binding);
        assert_eq!(library.live_instances(), 0);
    }
}

// ── Observation network ───────────────────────────────────────────────────────

#[cfg(test)]
mod observation {
    use std::rc::Rc;

    use cg_core::{ObserverId, ParameterSet, RunResult, SimTime};

    use super::*;
    use crate::{ObservationBinding, ObservationInstance, ObservationNetwork, PluginError};

    fn network(loader: &Rc<StaticLoader>) -> ObservationNetwork {
        reset_hook_log();
        ObservationNetwork::new(ObservationBinding::new(PluginConfig::new("plugins"), loader.clone(), collaborators()))
    }

    #[test]
    fn lifecycle_fans_out_in_id_order() {
        let loader = loader();
        let mut net = network(&loader);
        net.instantiate(&[
            ObservationInstance::new(ObserverId(2), "Recorder").with_parameters(ParameterSet::new().with("end_at", 200)),
            ObservationInstance::new(ObserverId(1), "Recorder"),
        ])
        .unwrap();
        assert_eq!(loader.open_count("Recorder"), 1);
        let ids: Vec<_> = net.observers().iter().map(|o| o.id()).collect();
        assert_eq!(ids, [ObserverId(1), ObserverId(2)]);

        let dir = tempfile::tempdir().unwrap();
        net.master_pre().unwrap();
        net.init_all(dir.path()).unwrap();
        net.init_run().unwrap();
        let mut result = RunResult::new();
        net.update_time_step(SimTime(100), &mut result).unwrap();
        assert!(!result.is_end_condition());
        net.update_time_step(SimTime(200), &mut result).unwrap();
        assert!(result.is_end_condition());
        net.finalize_run(&result).unwrap();
        net.finalize_all().unwrap();

        let log = hook_log();
        assert_eq!(&log[..2], &[(1, "master_pre"), (2, "master_pre")]);
        assert!(log.contains(&(2, "slave_post_run:end")));
        assert_eq!(log.last(), Some(&(2, "slave_post")));

        let files = net.result_files().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].1.starts_with(&*dir.path().to_string_lossy()));
        assert!(files[0].1.ends_with("observer_1.xml"));
    }

    #[test]
    fn first_failure_stops_fan_out() {
        let loader = loader();
        let mut net = network(&loader);
        net.instantiate(&[
            ObservationInstance::new(ObserverId(1), "Recorder")
                .with_parameters(ParameterSet::new().with("fail_update", true)),
            ObservationInstance::new(ObserverId(2), "Recorder"),
        ])
        .unwrap();
        let mut result = RunResult::new();
        assert!(matches!(
            net.update_time_step(SimTime(0), &mut result),
            Err(PluginError::Call { .. })
        ));
        let updates: Vec<_> = hook_log().into_iter().filter(|(_, h)| *h == "slave_update").collect();
        assert_eq!(updates, [(1, "slave_update")]);
    }

    #[test]
    fn duplicate_ids_create_nothing() {
        let loader = loader();
        let mut net = network(&loader);
        let err = net
            .instantiate(&[
                ObservationInstance::new(ObserverId(1), "Recorder"),
                ObservationInstance::new(ObserverId(1), "Recorder"),
            ])
            .unwrap_err();
        assert!(matches!(err, PluginError::DuplicateObserver(ObserverId(1))));
        assert!(net.is_empty());
    }

    #[test]
    fn components_can_reach_the_concrete_observer() {
        let loader = loader();
        let mut net = network(&loader);
        net.instantiate(&[ObservationInstance::new(ObserverId(5), "Recorder")]).unwrap();
        let observers = net.observers();
        let recorder = unsafe { crate::abi::observer_module::<Recorder>(&observers[0]) };
        assert_eq!(recorder.id, 5);
    }

    #[test]
    fn clear_releases_every_module() {
        let loader = loader();
        let mut net = network(&loader);
        net.instantiate(&[
            ObservationInstance::new(ObserverId(1), "Recorder"),
            ObservationInstance::new(ObserverId(2), "Recorder"),
        ])
        .unwrap();
        let library = Rc::clone(net.module(ObserverId(1)).unwrap().library());
        assert_eq!(library.live_instances(), 2);
        net.clear();
        assert!(net.is_empty());
        assert_eq!(library.live_instances(), 0);
    }
}
