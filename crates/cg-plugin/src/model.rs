//! Model libraries and the registry that binds components to them.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{CStr, c_void};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use cg_core::{Collaborators, LinkId, Signal, SimTime};
use cg_graph::{
    ComponentFactory, ComponentRequest, GraphError, GraphResult, ModelCallError, ModelInstance, ReleaseOutcome,
};
use tracing::{debug, error, info, warn};

use crate::abi::{self, MODEL_ABI_VERSION, ModelInit, symbols};
use crate::loader::{LibraryLoader, SymbolTable, resolve};
use crate::{PluginConfig, PluginError, PluginResult};

/// Model library name that receives the event network on creation.
pub const COMPONENT_CONTROLLER: &str = "ComponentController";

struct ModelEntryPoints {
    create:        abi::ModelCreateFn,
    destroy:       abi::DestroyInstanceFn,
    update_input:  abi::ModelUpdateInputFn,
    update_output: abi::ModelUpdateOutputFn,
    trigger:       abi::ModelTriggerFn,
}

/// A loaded model library with every entry point resolved.
pub struct ModelLibrary {
    name:      String,
    version:   String,
    entry:     ModelEntryPoints,
    /// Addresses of the handles this library created and has not destroyed.
    instances: RefCell<BTreeSet<usize>>,
    // Declared last so it is dropped last: unmaps the code behind `entry`.
    _table:    Box<dyn SymbolTable>,
}

impl ModelLibrary {
    /// Open the library, check its ABI version and resolve every symbol.
    /// Nothing is kept if any step fails.
    pub fn load(name: &str, path: &Path, loader: &dyn LibraryLoader) -> PluginResult<Self> {
        let table = loader.open(name, path)?;
        // SAFETY: every symbol is resolved with the type the ABI assigns it.
        let get_version: abi::GetVersionFn = unsafe { resolve(&*table, name, symbols::MODEL_GET_VERSION)? };
        let version = read_version(name, get_version)?;
        if !abi::compatible(&version, MODEL_ABI_VERSION) {
            return Err(PluginError::IncompatibleVersion {
                library:  name.to_owned(),
                found:    version,
                expected: MODEL_ABI_VERSION,
            });
        }
        let entry = unsafe {
            ModelEntryPoints {
                create:        resolve(&*table, name, symbols::MODEL_CREATE_INSTANCE)?,
                destroy:       resolve(&*table, name, symbols::MODEL_DESTROY_INSTANCE)?,
                update_input:  resolve(&*table, name, symbols::MODEL_UPDATE_INPUT)?,
                update_output: resolve(&*table, name, symbols::MODEL_UPDATE_OUTPUT)?,
                trigger:       resolve(&*table, name, symbols::MODEL_TRIGGER)?,
            }
        };
        info!(library = name, %version, path = %path.display(), "model library loaded");
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

    /// Number of created instances not yet destroyed.
    pub fn live_instances(&self) -> usize {
        self.instances.borrow().len()
    }

    fn is_tracked(&self, handle: NonNull<c_void>) -> bool {
        self.instances.borrow().contains(&(handle.as_ptr() as usize))
    }

    fn create_instance(&self, init: &ModelInit<'_>) -> PluginResult<NonNull<c_void>> {
        // SAFETY: `init` outlives the call.
        let raw = abi::barrier("ModelCreateInstance", || unsafe { (self.entry.create)(init) }).map_err(|source| {
            PluginError::Call { library: self.name.clone(), source }
        })?;
        let handle = NonNull::new(raw).ok_or_else(|| PluginError::CreateFailed {
            library:  self.name.clone(),
            instance: init.component_name.to_owned(),
        })?;
        self.instances.borrow_mut().insert(handle.as_ptr() as usize);
        Ok(handle)
    }

    /// Destroy `handle` if this library created it.  Returns `false` for an
    /// unknown handle, which is left alone.
    fn destroy_instance(&self, handle: NonNull<c_void>) -> bool {
        if !self.instances.borrow_mut().remove(&(handle.as_ptr() as usize)) {
            return false;
        }
        // SAFETY: the handle was created by this library and is destroyed once.
        if let Err(err) = abi::barrier("ModelDestroyInstance", || unsafe { (self.entry.destroy)(handle.as_ptr()) }) {
            error!(library = %self.name, error = %err, "destroy-instance failed");
        }
        true
    }
}

impl std::fmt::Debug for ModelLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLibrary")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("live_instances", &self.live_instances())
            .finish()
    }
}

/// Call a library's get-version entry point.
pub(crate) fn read_version(library: &str, get_version: abi::GetVersionFn) -> PluginResult<String> {
    // SAFETY: get-version takes no arguments and returns a static string.
    let raw = abi::barrier("GetVersion", || unsafe { get_version() }).map_err(|source| PluginError::Call {
        library: library.to_owned(),
        source,
    })?;
    if raw.is_null() {
        return Ok(String::new());
    }
    // SAFETY: non-null version strings are nul-terminated and static.
    Ok(unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
}

// ── Bound instances ───────────────────────────────────────────────────────────

/// One component implementation living inside a [`ModelLibrary`].
///
/// Holds a shared handle to its library, so the library stays mapped for as
/// long as the instance exists even after the registry dropped it.
pub struct BoundModel {
    library:   Rc<ModelLibrary>,
    handle:    NonNull<c_void>,
    component: String,
    released:  bool,
}

impl BoundModel {
    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn library(&self) -> &Rc<ModelLibrary> {
        &self.library
    }

    /// Raw handle as returned by the library.
    pub fn handle(&self) -> *const c_void {
        self.handle.as_ptr().cast_const()
    }
}

impl ModelInstance for BoundModel {
    fn library_name(&self) -> &str {
        self.library.name()
    }

    fn trigger(&mut self, time: SimTime) -> Result<(), ModelCallError> {
        let entry = self.library.entry.trigger;
        let handle = self.handle.as_ptr();
        // SAFETY: the handle is live while `self` exists.
        abi::checked("ModelTrigger", || unsafe { entry(handle, time.as_millis()) })
    }

    fn update_input(&mut self, link: LinkId, signal: Option<&Signal>, time: SimTime) -> Result<(), ModelCallError> {
        let entry = self.library.entry.update_input;
        let handle = self.handle.as_ptr();
        let signal = signal.map_or(ptr::null(), |s| s as *const Signal);
        // SAFETY: the handle is live and `signal` outlives the call.
        abi::checked("ModelUpdateInput", || unsafe { entry(handle, link.0, signal, time.as_millis()) })
    }

    fn update_output(&mut self, link: LinkId, time: SimTime) -> Result<Option<Signal>, ModelCallError> {
        let entry = self.library.entry.update_output;
        let handle = self.handle.as_ptr();
        let mut signal: Option<Signal> = None;
        // SAFETY: the handle is live and `signal` is a valid out-slot.
        abi::checked("ModelUpdateOutput", || unsafe {
            entry(handle, link.0, &mut signal, time.as_millis())
        })?;
        Ok(signal)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Drop for BoundModel {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                library = %self.library.name(),
                component = %self.component,
                "implementation dropped without being released",
            );
        }
        self.library.destroy_instance(self.handle);
    }
}

impl std::fmt::Debug for BoundModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundModel")
            .field("library", &self.library.name())
            .field("component", &self.component)
            .finish()
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Load-once registry of model libraries.
///
/// `library` (get-or-load) is the only way a library enters the registry;
/// [`unload`](Self::unload) is the only way one leaves it.
pub struct ModelBinding {
    config:        PluginConfig,
    loader:        Rc<dyn LibraryLoader>,
    collaborators: Collaborators,
    libraries:     BTreeMap<String, Rc<ModelLibrary>>,
}

impl ModelBinding {
    pub fn new(config: PluginConfig, loader: Rc<dyn LibraryLoader>, collaborators: Collaborators) -> Self {
        Self { config, loader, collaborators, libraries: BTreeMap::new() }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// The cached library for `name`, loading it on first use.
    pub fn library(&mut self, name: &str) -> PluginResult<Rc<ModelLibrary>> {
        if let Some(library) = self.libraries.get(name) {
            return Ok(Rc::clone(library));
        }
        let path = self.config.library_path(name);
        let library = Rc::new(ModelLibrary::load(name, &path, &*self.loader)?);
        self.libraries.insert(name.to_owned(), Rc::clone(&library));
        Ok(library)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    /// Create one component implementation.
    pub fn create(&mut self, request: &ComponentRequest<'_>) -> PluginResult<BoundModel> {
        let component_type = request.component_type;
        let library = self.library(component_type.model_library())?;
        let event_network =
            (component_type.model_library() == COMPONENT_CONTROLLER).then_some(&self.collaborators.event_network);
        let init = ModelInit {
            component_name: request.name,
            agent:          request.agent,
            schedule:       component_type.schedule(),
            parameters:     component_type.parameters(),
            observers:      request.observers,
            collaborators:  &self.collaborators,
            event_network,
        };
        let handle = library.create_instance(&init)?;
        debug!(library = %library.name(), component = request.name, agent = %request.agent, "component created");
        Ok(BoundModel {
            library,
            handle,
            component: request.name.to_owned(),
            released: false,
        })
    }

    /// Destroy an implementation through the library that created it.
    pub fn release(&mut self, mut model: BoundModel) -> ReleaseOutcome {
        model.released = true;
        if model.library.is_tracked(model.handle) {
            debug!(library = %model.library.name(), component = %model.component, "component released");
            drop(model);
            ReleaseOutcome::Released
        } else {
            warn!(
                library = %model.library.name(),
                component = %model.component,
                "implementation not tracked by its library",
            );
            ReleaseOutcome::NotTracked
        }
    }

    /// Drop every cached library.
    ///
    /// A library that still has live instances stays mapped until the last
    /// of them is released; a warning names it.
    pub fn unload(&mut self) {
        for (name, library) in std::mem::take(&mut self.libraries) {
            let live = library.live_instances();
            if live > 0 {
                warn!(library = %name, live, "unloading library with live instances; deferred until released");
            } else {
                debug!(library = %name, "model library unloaded");
            }
        }
    }
}

impl ComponentFactory for ModelBinding {
    fn create_component(&mut self, request: &ComponentRequest<'_>) -> GraphResult<Box<dyn ModelInstance>> {
        match self.create(request) {
            Ok(model) => Ok(Box::new(model)),
            Err(err) => {
                error!(agent = %request.agent, component = request.name, error = %err, "component creation failed");
                Err(GraphError::ComponentCreation {
                    agent:     request.agent,
                    component: request.name.to_owned(),
                    reason:    err.to_string(),
                })
            }
        }
    }

    fn release_component(&mut self, instance: Box<dyn ModelInstance>) -> ReleaseOutcome {
        match instance.into_any().downcast::<BoundModel>() {
            Ok(model) => self.release(*model),
            Err(_) => ReleaseOutcome::NotTracked,
        }
    }
}

impl Drop for ModelBinding {
    fn drop(&mut self) {
        self.unload();
    }
}
