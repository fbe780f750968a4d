//! Observation libraries, modules and their registry.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{CStr, CString, c_void};
use std::path::Path;
use std::ptr::NonNull;
use std::rc::Rc;

use cg_core::{Collaborators, ObserverId, ObserverRef, ParameterSet, RunResult, SimTime};
use cg_graph::ReleaseOutcome;
use tracing::{debug, error, info, warn};

use crate::abi::{self, OBSERVATION_ABI_VERSION, ObservationInit, symbols};
use crate::loader::{LibraryLoader, SymbolTable, resolve};
use crate::model::read_version;
use crate::{PluginConfig, PluginError, PluginResult};

struct ObservationEntryPoints {
    create:         abi::ObservationCreateFn,
    destroy:        abi::DestroyInstanceFn,
    master_pre:     abi::HookFn,
    master_post:    abi::PathHookFn,
    slave_pre:      abi::PathHookFn,
    slave_pre_run:  abi::HookFn,
    slave_update:   abi::UpdateHookFn,
    slave_post_run: abi::PostRunHookFn,
    slave_post:     abi::HookFn,
    result_file:    abi::ResultFileFn,
}

/// A loaded observation library with every entry point resolved.
pub struct ObservationLibrary {
    name:      String,
    version:   String,
    entry:     ObservationEntryPoints,
    instances: RefCell<BTreeSet<usize>>,
    _table:    Box<dyn SymbolTable>,
}

impl ObservationLibrary {
    pub fn load(name: &str, path: &Path, loader: &dyn LibraryLoader) -> PluginResult<Self> {
        let table = loader.open(name, path)?;
        // SAFETY: every symbol is resolved with the type the ABI assigns it.
        let get_version: abi::GetVersionFn = unsafe { resolve(&*table, name, symbols::OBSERVATION_GET_VERSION)? };
        let version = read_version(name, get_version)?;
        if !abi::compatible(&version, OBSERVATION_ABI_VERSION) {
            return Err(PluginError::IncompatibleVersion {
                library:  name.to_owned(),
                found:    version,
                expected: OBSERVATION_ABI_VERSION,
            });
        }
        let entry = unsafe {
            ObservationEntryPoints {
                create:         resolve(&*table, name, symbols::OBSERVATION_CREATE_INSTANCE)?,
                destroy:        resolve(&*table, name, symbols::OBSERVATION_DESTROY_INSTANCE)?,
                master_pre:     resolve(&*table, name, symbols::OBSERVATION_MASTER_PRE_HOOK)?,
                master_post:    resolve(&*table, name, symbols::OBSERVATION_MASTER_POST_HOOK)?,
                slave_pre:      resolve(&*table, name, symbols::OBSERVATION_SLAVE_PRE_HOOK)?,
                slave_pre_run:  resolve(&*table, name, symbols::OBSERVATION_SLAVE_PRE_RUN_HOOK)?,
                slave_update:   resolve(&*table, name, symbols::OBSERVATION_SLAVE_UPDATE_HOOK)?,
                slave_post_run: resolve(&*table, name, symbols::OBSERVATION_SLAVE_POST_RUN_HOOK)?,
                slave_post:     resolve(&*table, name, symbols::OBSERVATION_SLAVE_POST_HOOK)?,
                result_file:    resolve(&*table, name, symbols::OBSERVATION_SLAVE_RESULT_FILE)?,
            }
        };
        info!(library = name, %version, path = %path.display(), "observation library loaded");
        Ok(Self {
            name: name.to_owned(),
            version,
            entry,
            instances: RefCell::default(),
            _table: table,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn live_instances(&self) -> usize {
        self.instances.borrow().len()
    }

    fn is_tracked(&self, handle: NonNull<c_void>) -> bool {
        self.instances.borrow().contains(&(handle.as_ptr() as usize))
    }

    fn create_instance(&self, init: &ObservationInit<'_>) -> PluginResult<NonNull<c_void>> {
        // SAFETY: `init` outlives the call.
        let raw = abi::barrier("ObservationCreateInstance", || unsafe { (self.entry.create)(init) })
            .map_err(|source| PluginError::Call { library: self.name.clone(), source })?;
        let handle = NonNull::new(raw).ok_or_else(|| PluginError::CreateFailed {
            library:  self.name.clone(),
            instance: init.id.to_string(),
        })?;
        self.instances.borrow_mut().insert(handle.as_ptr() as usize);
        Ok(handle)
    }

    fn destroy_instance(&self, handle: NonNull<c_void>) -> bool {
        if !self.instances.borrow_mut().remove(&(handle.as_ptr() as usize)) {
            return false;
        }
        // SAFETY: the handle was created by this library and is destroyed once.
        if let Err(err) =
            abi::barrier("ObservationDestroyInstance", || unsafe { (self.entry.destroy)(handle.as_ptr()) })
        {
            error!(library = %self.name, error = %err, "destroy-instance failed");
        }
        true
    }
}

impl std::fmt::Debug for ObservationLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationLibrary")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("live_instances", &self.live_instances())
            .finish()
    }
}

// ── Modules ───────────────────────────────────────────────────────────────────

/// One observer instance living inside an [`ObservationLibrary`].
pub struct ObservationModule {
    id:       ObserverId,
    library:  Rc<ObservationLibrary>,
    handle:   NonNull<c_void>,
    released: bool,
}

impl ObservationModule {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn library(&self) -> &Rc<ObservationLibrary> {
        &self.library
    }

    /// Read-only handle passed to components.
    pub fn as_observer(&self) -> ObserverRef {
        ObserverRef::new(self.id, self.handle)
    }

    fn hook(&self, entry_point: &'static str, f: impl FnOnce(*mut c_void) -> bool) -> PluginResult<()> {
        let handle = self.handle.as_ptr();
        abi::checked(entry_point, || f(handle)).map_err(|source| PluginError::Call {
            library: self.library.name.clone(),
            source,
        })
    }

    pub fn master_pre(&self) -> PluginResult<()> {
        let entry = self.library.entry.master_pre;
        // SAFETY: the handle is live while `self` exists.
        self.hook("ObservationMasterPreHook", |h| unsafe { entry(h) })
    }

    pub fn master_post(&self, filename: &str) -> PluginResult<()> {
        let entry = self.library.entry.master_post;
        let filename = c_string(filename)?;
        // SAFETY: as above; `filename` outlives the call.
        self.hook("ObservationMasterPostHook", |h| unsafe { entry(h, filename.as_ptr()) })
    }

    pub fn slave_pre(&self, path: &Path) -> PluginResult<()> {
        let entry = self.library.entry.slave_pre;
        let path = c_string(&path.to_string_lossy())?;
        // SAFETY: as above; `path` outlives the call.
        self.hook("ObservationSlavePreHook", |h| unsafe { entry(h, path.as_ptr()) })
    }

    pub fn slave_pre_run(&self) -> PluginResult<()> {
        let entry = self.library.entry.slave_pre_run;
        // SAFETY: the handle is live while `self` exists.
        self.hook("ObservationSlavePreRunHook", |h| unsafe { entry(h) })
    }

    pub fn slave_update(&self, time: SimTime, run_result: &mut RunResult) -> PluginResult<()> {
        let entry = self.library.entry.slave_update;
        // SAFETY: as above; `run_result` is exclusively borrowed for the call.
        self.hook("ObservationSlaveUpdateHook", |h| unsafe { entry(h, time.as_millis(), run_result) })
    }

    pub fn slave_post_run(&self, run_result: &RunResult) -> PluginResult<()> {
        let entry = self.library.entry.slave_post_run;
        // SAFETY: as above.
        self.hook("ObservationSlavePostRunHook", |h| unsafe { entry(h, run_result) })
    }

    pub fn slave_post(&self) -> PluginResult<()> {
        let entry = self.library.entry.slave_post;
        // SAFETY: the handle is live while `self` exists.
        self.hook("ObservationSlavePostHook", |h| unsafe { entry(h) })
    }

    /// Path of the file the module wrote, if any.
    pub fn result_file(&self) -> PluginResult<Option<String>> {
        let entry = self.library.entry.result_file;
        let handle = self.handle.as_ptr();
        // SAFETY: the returned string stays valid until the next call on the
        // handle; it is copied before returning.
        abi::barrier("ObservationSlaveResultFile", || unsafe {
            let raw = entry(handle);
            (!raw.is_null()).then(|| CStr::from_ptr(raw).to_string_lossy().into_owned())
        })
        .map_err(|source| PluginError::Call { library: self.library.name.clone(), source })
    }
}

impl Drop for ObservationModule {
    fn drop(&mut self) {
        if !self.released {
            warn!(library = %self.library.name, observer = %self.id, "observer dropped without being released");
        }
        self.library.destroy_instance(self.handle);
    }
}

impl std::fmt::Debug for ObservationModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationModule")
            .field("id", &self.id)
            .field("library", &self.library.name)
            .finish()
    }
}

fn c_string(s: &str) -> PluginResult<CString> {
    CString::new(s).map_err(|_| PluginError::InvalidArgument(format!("'{s}' contains a nul byte")))
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Load-once registry of observation libraries.
pub struct ObservationBinding {
    config:        PluginConfig,
    loader:        Rc<dyn LibraryLoader>,
    collaborators: Collaborators,
    libraries:     BTreeMap<String, Rc<ObservationLibrary>>,
}

impl ObservationBinding {
    pub fn new(config: PluginConfig, loader: Rc<dyn LibraryLoader>, collaborators: Collaborators) -> Self {
        Self { config, loader, collaborators, libraries: BTreeMap::new() }
    }

    /// The cached library for `name`, loading it on first use.
    pub fn library(&mut self, name: &str) -> PluginResult<Rc<ObservationLibrary>> {
        if let Some(library) = self.libraries.get(name) {
            return Ok(Rc::clone(library));
        }
        let path = self.config.library_path(name);
        let library = Rc::new(ObservationLibrary::load(name, &path, &*self.loader)?);
        self.libraries.insert(name.to_owned(), Rc::clone(&library));
        Ok(library)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    pub fn create_observation_module(
        &mut self,
        id:         ObserverId,
        library:    &str,
        parameters: &ParameterSet,
    ) -> PluginResult<ObservationModule> {
        let library = self.library(library)?;
        let init = ObservationInit { id, parameters, collaborators: &self.collaborators };
        let handle = library.create_instance(&init)?;
        debug!(library = %library.name, observer = %id, "observer created");
        Ok(ObservationModule { id, library, handle, released: false })
    }

    pub fn release_observation_module(&mut self, mut module: ObservationModule) -> ReleaseOutcome {
        module.released = true;
        if module.library.is_tracked(module.handle) {
            debug!(library = %module.library.name, observer = %module.id, "observer released");
            drop(module);
            ReleaseOutcome::Released
        } else {
            warn!(library = %module.library.name, observer = %module.id, "observer not tracked by its library");
            ReleaseOutcome::NotTracked
        }
    }

    /// Drop every cached library; see [`ModelBinding::unload`](crate::ModelBinding::unload).
    pub fn unload(&mut self) {
        for (name, library) in std::mem::take(&mut self.libraries) {
            let live = library.live_instances();
            if live > 0 {
                warn!(library = %name, live, "unloading library with live instances; deferred until released");
            } else {
                debug!(library = %name, "observation library unloaded");
            }
        }
    }
}

impl Drop for ObservationBinding {
    fn drop(&mut self) {
        self.unload();
    }
}
