//! Opening libraries and resolving symbols.
//!
//! [`LibraryLoader`] is the seam between the registries and the operating
//! system.  [`DynamicLoader`] maps real shared objects through `libloading`;
//! [`StaticLoader`] serves libraries compiled into the host process, which is
//! how tests and statically linked deployments bind plugins.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ffi::c_void;
use std::mem;
use std::path::Path;
use std::ptr::NonNull;

use tracing::debug;

use crate::abi::{self, ModelImplementation, ObservationImplementation, symbols};
use crate::{PluginError, PluginResult};

/// An opened library.  Dropping it unmaps the library.
pub trait SymbolTable {
    fn address(&self, symbol: &str) -> Option<NonNull<c_void>>;
}

/// Opens libraries by name and resolved path.
pub trait LibraryLoader {
    fn open(&self, name: &str, path: &Path) -> PluginResult<Box<dyn SymbolTable>>;
}

/// Resolve `symbol` and reinterpret its address as the entry-point type `F`.
///
/// # Safety
/// `F` must be the function-pointer type the ABI assigns to `symbol`.
pub(crate) unsafe fn resolve<F: Copy>(table: &dyn SymbolTable, library: &str, symbol: &'static str) -> PluginResult<F> {
    debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<*mut c_void>());
    let address = table.address(symbol).ok_or_else(|| PluginError::MissingSymbol {
        library: library.to_owned(),
        symbol,
    })?;
    // SAFETY: guaranteed by the caller.
    Ok(unsafe { mem::transmute_copy::<*mut c_void, F>(&address.as_ptr()) })
}

// ── Shared objects ────────────────────────────────────────────────────────────

/// Loads shared objects from disk.
#[derive(Copy, Clone, Debug, Default)]
pub struct DynamicLoader;

struct SharedLibrary(libloading::Library);

impl SymbolTable for SharedLibrary {
    fn address(&self, symbol: &str) -> Option<NonNull<c_void>> {
        // SAFETY: the symbol is only read as an address here; its type is
        // fixed later by `resolve`.
        let symbol = unsafe { self.0.get::<*mut c_void>(symbol.as_bytes()) }.ok()?;
        NonNull::new(*symbol)
    }
}

impl LibraryLoader for DynamicLoader {
    fn open(&self, name: &str, path: &Path) -> PluginResult<Box<dyn SymbolTable>> {
        debug!(library = name, path = %path.display(), "opening shared library");
        // SAFETY: loading runs the library's initialisers; plugin libraries
        // are trusted configuration.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| PluginError::Load {
            library: name.to_owned(),
            path:    path.to_path_buf(),
            reason:  e.to_string(),
        })?;
        Ok(Box::new(SharedLibrary(library)))
    }
}

// ── In-process libraries ──────────────────────────────────────────────────────

/// Symbol table of a library compiled into the host.
#[derive(Clone, Debug, Default)]
pub struct StaticLibrary {
    symbols: BTreeMap<&'static str, NonNull<c_void>>,
}

impl StaticLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` (a function pointer cast to `*const ()`) under `name`.
    pub fn with_symbol(mut self, name: &'static str, address: *const ()) -> Self {
        if let Some(address) = NonNull::new(address.cast_mut().cast::<c_void>()) {
            self.symbols.insert(name, address);
        }
        self
    }

    pub fn without_symbol(mut self, name: &str) -> Self {
        self.symbols.remove(name);
        self
    }

    /// Every model entry point for `M`.
    pub fn model<M: ModelImplementation>() -> Self {
        Self::new()
            .with_symbol(symbols::MODEL_GET_VERSION, abi::model_get_version as abi::GetVersionFn as *const ())
            .with_symbol(symbols::MODEL_CREATE_INSTANCE, abi::model_create::<M> as abi::ModelCreateFn as *const ())
            .with_symbol(
                symbols::MODEL_DESTROY_INSTANCE,
                abi::model_destroy::<M> as abi::DestroyInstanceFn as *const (),
            )
            .with_symbol(
                symbols::MODEL_UPDATE_INPUT,
                abi::model_update_input::<M> as abi::ModelUpdateInputFn as *const (),
            )
            .with_symbol(
                symbols::MODEL_UPDATE_OUTPUT,
                abi::model_update_output::<M> as abi::ModelUpdateOutputFn as *const (),
            )
            .with_symbol(symbols::MODEL_TRIGGER, abi::model_trigger::<M> as abi::ModelTriggerFn as *const ())
    }

    /// Every observation entry point for `O`.
    pub fn observation<O: ObservationImplementation>() -> Self {
        Self::new()
            .with_symbol(
                symbols::OBSERVATION_GET_VERSION,
                abi::observation_get_version as abi::GetVersionFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_CREATE_INSTANCE,
                abi::observation_create::<O> as abi::ObservationCreateFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_DESTROY_INSTANCE,
                abi::observation_destroy::<O> as abi::DestroyInstanceFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_MASTER_PRE_HOOK,
                abi::observation_master_pre::<O> as abi::HookFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_MASTER_POST_HOOK,
                abi::observation_master_post::<O> as abi::PathHookFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_SLAVE_PRE_HOOK,
                abi::observation_slave_pre::<O> as abi::PathHookFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_SLAVE_PRE_RUN_HOOK,
                abi::observation_slave_pre_run::<O> as abi::HookFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_SLAVE_UPDATE_HOOK,
                abi::observation_slave_update::<O> as abi::UpdateHookFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_SLAVE_POST_RUN_HOOK,
                abi::observation_slave_post_run::<O> as abi::PostRunHookFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_SLAVE_POST_HOOK,
                abi::observation_slave_post::<O> as abi::HookFn as *const (),
            )
            .with_symbol(
                symbols::OBSERVATION_SLAVE_RESULT_FILE,
                abi::observation_slave_result_file::<O> as abi::ResultFileFn as *const (),
            )
    }
}

impl SymbolTable for StaticLibrary {
    fn address(&self, symbol: &str) -> Option<NonNull<c_void>> {
        self.symbols.get(symbol).copied()
    }
}

/// Serves [`StaticLibrary`]s by name and counts every open.
#[derive(Default)]
pub struct StaticLoader {
    libraries: BTreeMap<String, StaticLibrary>,
    opens:     RefCell<BTreeMap<String, usize>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, name: impl Into<String>, library: StaticLibrary) -> Self {
        self.libraries.insert(name.into(), library);
        self
    }

    /// How often `name` was opened, successful or not.
    pub fn open_count(&self, name: &str) -> usize {
        self.opens.borrow().get(name).copied().unwrap_or(0)
    }
}

impl LibraryLoader for StaticLoader {
    fn open(&self, name: &str, path: &Path) -> PluginResult<Box<dyn SymbolTable>> {
        *self.opens.borrow_mut().entry(name.to_owned()).or_default() += 1;
        match self.libraries.get(name) {
            Some(library) => Ok(Box::new(library.clone())),
            None => Err(PluginError::Load {
                library: name.to_owned(),
                path:    path.to_path_buf(),
                reason:  "no such in-process library".into(),
            }),
        }
    }
}
