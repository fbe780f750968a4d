//! Fan-out of lifecycle calls to every loaded observer.

use std::collections::BTreeMap;
use std::path::Path;

use cg_core::{ObserverId, ObserverRef, ParameterSet, RunResult, SimTime};
use cg_graph::ReleaseOutcome;
use tracing::{debug, error, warn};

use crate::{ObservationBinding, ObservationModule, PluginError, PluginResult};

/// One configured observer: which library provides it and with which
/// parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservationInstance {
    pub id:         ObserverId,
    pub library:    String,
    pub parameters: ParameterSet,
}

impl ObservationInstance {
    pub fn new(id: ObserverId, library: impl Into<String>) -> Self {
        Self { id, library: library.into(), parameters: ParameterSet::default() }
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Every observer of an experiment, keyed and called in ascending id order.
pub struct ObservationNetwork {
    binding: ObservationBinding,
    modules: BTreeMap<ObserverId, ObservationModule>,
}

impl ObservationNetwork {
    pub fn new(binding: ObservationBinding) -> Self {
        Self { binding, modules: BTreeMap::new() }
    }

    /// Create one module per configured observer.  On failure the modules
    /// created by this call are released again.
    pub fn instantiate(&mut self, instances: &[ObservationInstance]) -> PluginResult<()> {
        let mut created = Vec::with_capacity(instances.len());
        for instance in instances {
            if self.modules.contains_key(&instance.id) || created.iter().any(|m: &ObservationModule| m.id() == instance.id) {
                self.release_all(created);
                return Err(PluginError::DuplicateObserver(instance.id));
            }
            match self
                .binding
                .create_observation_module(instance.id, &instance.library, &instance.parameters)
            {
                Ok(module) => created.push(module),
                Err(err) => {
                    error!(observer = %instance.id, library = %instance.library, error = %err, "observer creation failed");
                    self.release_all(created);
                    return Err(err);
                }
            }
        }
        for module in created {
            self.modules.insert(module.id(), module);
        }
        debug!(observers = self.modules.len(), "observation network instantiated");
        Ok(())
    }

    fn release_all(&mut self, modules: Vec<ObservationModule>) {
        for module in modules {
            self.binding.release_observation_module(module);
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, id: ObserverId) -> Option<&ObservationModule> {
        self.modules.get(&id)
    }

    /// Handles given to every component at creation.
    pub fn observers(&self) -> Vec<ObserverRef> {
        self.modules.values().map(ObservationModule::as_observer).collect()
    }

    /// Call `f` on every module; the first failure stops the fan-out.
    fn each(&self, hook: &'static str, mut f: impl FnMut(&ObservationModule) -> PluginResult<()>) -> PluginResult<()> {
        for module in self.modules.values() {
            if let Err(err) = f(module) {
                error!(observer = %module.id(), hook, error = %err, "observer hook failed");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Once per experiment, before the first invocation.
    pub fn master_pre(&self) -> PluginResult<()> {
        self.each("master_pre", ObservationModule::master_pre)
    }

    /// Once per experiment, after the last invocation.
    pub fn master_post(&self, filename: &str) -> PluginResult<()> {
        self.each("master_post", |m| m.master_post(filename))
    }

    /// Once per experiment; `path` is the result directory.
    pub fn init_all(&self, path: &Path) -> PluginResult<()> {
        self.each("slave_pre", |m| m.slave_pre(path))
    }

    /// Before every invocation.
    pub fn init_run(&self) -> PluginResult<()> {
        self.each("slave_pre_run", ObservationModule::slave_pre_run)
    }

    /// After every time step.  Observers may set the end condition or record
    /// collisions on `run_result`.
    pub fn update_time_step(&self, time: SimTime, run_result: &mut RunResult) -> PluginResult<()> {
        self.each("slave_update", |m| m.slave_update(time, run_result))
    }

    /// After every invocation.
    pub fn finalize_run(&self, run_result: &RunResult) -> PluginResult<()> {
        self.each("slave_post_run", |m| m.slave_post_run(run_result))
    }

    /// Once per experiment, after the last invocation.
    pub fn finalize_all(&self) -> PluginResult<()> {
        self.each("slave_post", ObservationModule::slave_post)
    }

    /// Result file of every observer that wrote one.
    pub fn result_files(&self) -> PluginResult<Vec<(ObserverId, String)>> {
        let mut files = Vec::new();
        for module in self.modules.values() {
            if let Some(file) = module.result_file()? {
                files.push((module.id(), file));
            }
        }
        Ok(files)
    }

    /// Release every module, then unload the libraries.
    pub fn clear(&mut self) {
        for (id, module) in std::mem::take(&mut self.modules) {
            if self.binding.release_observation_module(module) == ReleaseOutcome::NotTracked {
                warn!(observer = %id, "observer was not tracked by its library");
            }
        }
        self.binding.unload();
    }
}

impl Drop for ObservationNetwork {
    fn drop(&mut self) {
        self.clear();
    }
}
