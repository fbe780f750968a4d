//! The fixed plugin ABI.
//!
//! Host and plugins are built with the same toolchain against this crate, so
//! the create arguments are plain Rust structs passed by pointer.  Every
//! entry point is `extern "C-unwind"`: a panic that escapes plugin code
//! unwinds into the host's barrier instead of aborting the process.
//!
//! Plugin authors implement [`ModelImplementation`] or
//! [`ObservationImplementation`] and invoke [`export_model_library!`] or
//! [`export_observation_library!`](crate::export_observation_library) once per
//! library.  The generated symbols forward to the generic entry points in
//! this module.  These turn a returned error into `false` and log a panic
//! before letting it unwind on into the host, which reports it as
//! [`ModelCallError::Panicked`].

#![allow(improper_ctypes, improper_ctypes_definitions)]

use std::any::Any;
use std::ffi::{CStr, CString, c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::Arc;

use cg_core::{
    AgentId, CbkLogLevel, Collaborators, EventNetwork, LinkId, ObserverId, ObserverRef, ParameterSet,
    RunResult, ScheduleMetadata, Signal, SimTime,
};
use cg_graph::ModelCallError;
use tracing::error;

// ── Versions & symbol names ───────────────────────────────────────────────────

/// ABI version spoken by this host.  A library must report the same major.
pub const MODEL_ABI_VERSION: &str = "1.0.0";
pub const OBSERVATION_ABI_VERSION: &str = "1.0.0";

const MODEL_ABI_VERSION_C: &CStr = c"1.0.0";
const OBSERVATION_ABI_VERSION_C: &CStr = c"1.0.0";

/// Exported symbol names.
pub mod symbols {
    pub const MODEL_GET_VERSION: &str = "ModelGetVersion";
    pub const MODEL_CREATE_INSTANCE: &str = "ModelCreateInstance";
    pub const MODEL_DESTROY_INSTANCE: &str = "ModelDestroyInstance";
    pub const MODEL_UPDATE_INPUT: &str = "ModelUpdateInput";
    pub const MODEL_UPDATE_OUTPUT: &str = "ModelUpdateOutput";
    pub const MODEL_TRIGGER: &str = "ModelTrigger";

    pub const OBSERVATION_GET_VERSION: &str = "ObservationGetVersion";
    pub const OBSERVATION_CREATE_INSTANCE: &str = "ObservationCreateInstance";
    pub const OBSERVATION_DESTROY_INSTANCE: &str = "ObservationDestroyInstance";
    pub const OBSERVATION_MASTER_PRE_HOOK: &str = "ObservationMasterPreHook";
    pub const OBSERVATION_MASTER_POST_HOOK: &str = "ObservationMasterPostHook";
    pub const OBSERVATION_SLAVE_PRE_HOOK: &str = "ObservationSlavePreHook";
    pub const OBSERVATION_SLAVE_PRE_RUN_HOOK: &str = "ObservationSlavePreRunHook";
    pub const OBSERVATION_SLAVE_UPDATE_HOOK: &str = "ObservationSlaveUpdateHook";
    pub const OBSERVATION_SLAVE_POST_RUN_HOOK: &str = "ObservationSlavePostRunHook";
    pub const OBSERVATION_SLAVE_POST_HOOK: &str = "ObservationSlavePostHook";
    pub const OBSERVATION_SLAVE_RESULT_FILE: &str = "ObservationSlaveResultFile";
}

// ── Entry-point signatures ────────────────────────────────────────────────────

pub type GetVersionFn = unsafe extern "C-unwind" fn() -> *const c_char;
pub type DestroyInstanceFn = unsafe extern "C-unwind" fn(handle: *mut c_void);

pub type ModelCreateFn = unsafe extern "C-unwind" fn(init: *const ModelInit<'_>) -> *mut c_void;
/// `signal` is null when the input buffer holds no value.
pub type ModelUpdateInputFn =
    unsafe extern "C-unwind" fn(handle: *mut c_void, link: u32, signal: *const Signal, time: i32) -> bool;
pub type ModelUpdateOutputFn =
    unsafe extern "C-unwind" fn(handle: *mut c_void, link: u32, signal: *mut Option<Signal>, time: i32) -> bool;
pub type ModelTriggerFn = unsafe extern "C-unwind" fn(handle: *mut c_void, time: i32) -> bool;

pub type ObservationCreateFn = unsafe extern "C-unwind" fn(init: *const ObservationInit<'_>) -> *mut c_void;
pub type HookFn = unsafe extern "C-unwind" fn(handle: *mut c_void) -> bool;
pub type PathHookFn = unsafe extern "C-unwind" fn(handle: *mut c_void, path: *const c_char) -> bool;
pub type UpdateHookFn = unsafe extern "C-unwind" fn(handle: *mut c_void, time: i32, run_result: *mut RunResult) -> bool;
pub type PostRunHookFn = unsafe extern "C-unwind" fn(handle: *mut c_void, run_result: *const RunResult) -> bool;
/// Returns null when the module wrote no result file.  The string stays
/// valid until the next call on the same handle.
pub type ResultFileFn = unsafe extern "C-unwind" fn(handle: *mut c_void) -> *const c_char;

// ── Create arguments ──────────────────────────────────────────────────────────

/// Everything a model library receives when asked for a new component.
#[repr(C)]
pub struct ModelInit<'a> {
    pub component_name: &'a str,
    pub agent:          AgentId,
    pub schedule:       ScheduleMetadata,
    pub parameters:     &'a ParameterSet,
    pub observers:      &'a [ObserverRef],
    pub collaborators:  &'a Collaborators,
    /// Only set for the component controller.
    pub event_network:  Option<&'a Arc<dyn EventNetwork>>,
}

/// Everything an observation library receives when asked for a new module.
#[repr(C)]
pub struct ObservationInit<'a> {
    pub id:            ObserverId,
    pub parameters:    &'a ParameterSet,
    pub collaborators: &'a Collaborators,
}

// ── Plugin-author traits ──────────────────────────────────────────────────────

/// A component implementation living inside a model library.
///
/// Errors are reported as strings; the entry points turn them into a `false`
/// return, which the host surfaces as a failed component cycle.
pub trait ModelImplementation: Sized + 'static {
    fn create(init: &ModelInit<'_>) -> Result<Self, String>;

    fn update_input(&mut self, link: LinkId, signal: Option<&Signal>, time: SimTime) -> Result<(), String>;

    fn update_output(&mut self, link: LinkId, time: SimTime) -> Result<Option<Signal>, String>;

    fn trigger(&mut self, time: SimTime) -> Result<(), String>;
}

/// An observer living inside an observation library.  Every hook defaults
/// to a no-op.
pub trait ObservationImplementation: Sized + 'static {
    fn create(init: &ObservationInit<'_>) -> Result<Self, String>;

    fn master_pre(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn master_post(&mut self, _filename: &str) -> Result<(), String> {
        Ok(())
    }

    fn slave_pre(&mut self, _path: &str) -> Result<(), String> {
        Ok(())
    }

    fn slave_pre_run(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn slave_update(&mut self, _time: SimTime, _run_result: &mut RunResult) -> Result<(), String> {
        Ok(())
    }

    fn slave_post_run(&mut self, _run_result: &RunResult) -> Result<(), String> {
        Ok(())
    }

    fn slave_post(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn result_file(&self) -> Option<String> {
        None
    }
}

/// Heap cell behind an observation handle.
struct ObservationCell<O> {
    module:      O,
    result_file: Option<CString>,
}

/// Borrow the concrete observer behind a handle a component received.
///
/// # Safety
/// `observer` must have been created by a library exporting
/// `O` through [`export_observation_library!`](crate::export_observation_library),
/// and the observation network that owns it must still be alive.
pub unsafe fn observer_module<O: ObservationImplementation>(observer: &ObserverRef) -> &O {
    // SAFETY: guaranteed by the caller.
    unsafe { &(*observer.instance().cast::<ObservationCell<O>>()).module }
}

// ── Generic plugin-side entry points ──────────────────────────────────────────

pub extern "C-unwind" fn model_get_version() -> *const c_char {
    MODEL_ABI_VERSION_C.as_ptr()
}

pub extern "C-unwind" fn observation_get_version() -> *const c_char {
    OBSERVATION_ABI_VERSION_C.as_ptr()
}

/// # Safety
/// `init` must be null or point to a live `ModelInit`.
pub unsafe extern "C-unwind" fn model_create<M: ModelImplementation>(init: *const ModelInit<'_>) -> *mut c_void {
    // SAFETY: guaranteed by the caller.
    let Some(init) = (unsafe { init.as_ref() }) else {
        return ptr::null_mut();
    };
    match panic::catch_unwind(AssertUnwindSafe(|| M::create(init))) {
        Ok(Ok(model)) => Box::into_raw(Box::new(model)).cast(),
        Ok(Err(reason)) => {
            let message = format!("component '{}': {reason}", init.component_name);
            init.collaborators.callbacks.log(CbkLogLevel::Error, file!(), line!(), &message);
            ptr::null_mut()
        }
        Err(payload) => {
            let message = format!("component '{}' panicked: {}", init.component_name, panic_message(&*payload));
            init.collaborators.callbacks.log(CbkLogLevel::Error, file!(), line!(), &message);
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `handle` must be null or a handle returned by `model_create::<M>` that
/// was not destroyed yet.
pub unsafe extern "C-unwind" fn model_destroy<M: ModelImplementation>(handle: *mut c_void) {
    if !handle.is_null() {
        // SAFETY: guaranteed by the caller.
        drop(unsafe { Box::from_raw(handle.cast::<M>()) });
    }
}

/// # Safety
/// `handle` as for [`model_destroy`]; `signal` null or valid for the call.
pub unsafe extern "C-unwind" fn model_update_input<M: ModelImplementation>(
    handle: *mut c_void,
    link:   u32,
    signal: *const Signal,
    time:   i32,
) -> bool {
    // SAFETY: guaranteed by the caller.
    let (Some(model), signal) = (unsafe { handle.cast::<M>().as_mut() }, unsafe { signal.as_ref() }) else {
        return false;
    };
    succeeded(symbols::MODEL_UPDATE_INPUT, || model.update_input(LinkId(link), signal, SimTime(time)))
}

/// # Safety
/// `handle` as for [`model_destroy`]; `signal` valid for writes.
pub unsafe extern "C-unwind" fn model_update_output<M: ModelImplementation>(
    handle: *mut c_void,
    link:   u32,
    signal: *mut Option<Signal>,
    time:   i32,
) -> bool {
    // SAFETY: guaranteed by the caller.
    let (Some(model), Some(out)) = (unsafe { handle.cast::<M>().as_mut() }, unsafe { signal.as_mut() }) else {
        return false;
    };
    succeeded(symbols::MODEL_UPDATE_OUTPUT, || {
        *out = model.update_output(LinkId(link), SimTime(time))?;
        Ok(())
    })
}

/// # Safety
/// As for [`model_destroy`].
pub unsafe extern "C-unwind" fn model_trigger<M: ModelImplementation>(handle: *mut c_void, time: i32) -> bool {
    // SAFETY: guaranteed by the caller.
    let Some(model) = (unsafe { handle.cast::<M>().as_mut() }) else {
        return false;
    };
    succeeded(symbols::MODEL_TRIGGER, || model.trigger(SimTime(time)))
}

/// # Safety
/// `init` must be null or point to a live `ObservationInit`.
pub unsafe extern "C-unwind" fn observation_create<O: ObservationImplementation>(
    init: *const ObservationInit<'_>,
) -> *mut c_void {
    // SAFETY: guaranteed by the caller.
    let Some(init) = (unsafe { init.as_ref() }) else {
        return ptr::null_mut();
    };
    match panic::catch_unwind(AssertUnwindSafe(|| O::create(init))) {
        Ok(Ok(module)) => Box::into_raw(Box::new(ObservationCell { module, result_file: None })).cast(),
        Ok(Err(reason)) => {
            let message = format!("observer {}: {reason}", init.id);
            init.collaborators.callbacks.log(CbkLogLevel::Error, file!(), line!(), &message);
            ptr::null_mut()
        }
        Err(payload) => {
            let message = format!("observer {} panicked: {}", init.id, panic_message(&*payload));
            init.collaborators.callbacks.log(CbkLogLevel::Error, file!(), line!(), &message);
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `handle` must be null or a handle returned by `observation_create::<O>`
/// that was not destroyed yet.
pub unsafe extern "C-unwind" fn observation_destroy<O: ObservationImplementation>(handle: *mut c_void) {
    if !handle.is_null() {
        // SAFETY: guaranteed by the caller.
        drop(unsafe { Box::from_raw(handle.cast::<ObservationCell<O>>()) });
    }
}

/// Run `f` against the module behind `handle`.
///
/// # Safety
/// As for [`observation_destroy`].
unsafe fn with_observer<O: ObservationImplementation>(
    handle:      *mut c_void,
    entry_point: &'static str,
    f:           impl FnOnce(&mut O) -> Result<(), String>,
) -> bool {
    // SAFETY: guaranteed by the caller.
    match unsafe { handle.cast::<ObservationCell<O>>().as_mut() } {
        Some(cell) => succeeded(entry_point, || f(&mut cell.module)),
        None => false,
    }
}

/// # Safety
/// As for [`observation_destroy`].
pub unsafe extern "C-unwind" fn observation_master_pre<O: ObservationImplementation>(handle: *mut c_void) -> bool {
    unsafe { with_observer::<O>(handle, symbols::OBSERVATION_MASTER_PRE_HOOK, O::master_pre) }
}

/// # Safety
/// As for [`observation_destroy`]; `filename` a valid C string.
pub unsafe extern "C-unwind" fn observation_master_post<O: ObservationImplementation>(
    handle:   *mut c_void,
    filename: *const c_char,
) -> bool {
    let Some(filename) = (unsafe { c_str(filename) }) else {
        return false;
    };
    unsafe { with_observer::<O>(handle, symbols::OBSERVATION_MASTER_POST_HOOK, |o| o.master_post(&filename)) }
}

/// # Safety
/// As for [`observation_destroy`]; `path` a valid C string.
pub unsafe extern "C-unwind" fn observation_slave_pre<O: ObservationImplementation>(
    handle: *mut c_void,
    path:   *const c_char,
) -> bool {
    let Some(path) = (unsafe { c_str(path) }) else {
        return false;
    };
    unsafe { with_observer::<O>(handle, symbols::OBSERVATION_SLAVE_PRE_HOOK, |o| o.slave_pre(&path)) }
}

/// # Safety
/// As for [`observation_destroy`].
pub unsafe extern "C-unwind" fn observation_slave_pre_run<O: ObservationImplementation>(handle: *mut c_void) -> bool {
    unsafe { with_observer::<O>(handle, symbols::OBSERVATION_SLAVE_PRE_RUN_HOOK, O::slave_pre_run) }
}

/// # Safety
/// As for [`observation_destroy`]; `run_result` valid for writes.
pub unsafe extern "C-unwind" fn observation_slave_update<O: ObservationImplementation>(
    handle:     *mut c_void,
    time:       i32,
    run_result: *mut RunResult,
) -> bool {
    let Some(run_result) = (unsafe { run_result.as_mut() }) else {
        return false;
    };
    unsafe {
        with_observer::<O>(handle, symbols::OBSERVATION_SLAVE_UPDATE_HOOK, |o| {
            o.slave_update(SimTime(time), run_result)
        })
    }
}

/// # Safety
/// As for [`observation_destroy`]; `run_result` valid for reads.
pub unsafe extern "C-unwind" fn observation_slave_post_run<O: ObservationImplementation>(
    handle:     *mut c_void,
    run_result: *const RunResult,
) -> bool {
    let Some(run_result) = (unsafe { run_result.as_ref() }) else {
        return false;
    };
    unsafe {
        with_observer::<O>(handle, symbols::OBSERVATION_SLAVE_POST_RUN_HOOK, |o| o.slave_post_run(run_result))
    }
}

/// # Safety
/// As for [`observation_destroy`].
pub unsafe extern "C-unwind" fn observation_slave_post<O: ObservationImplementation>(handle: *mut c_void) -> bool {
    unsafe { with_observer::<O>(handle, symbols::OBSERVATION_SLAVE_POST_HOOK, O::slave_post) }
}

/// # Safety
/// As for [`observation_destroy`].
pub unsafe extern "C-unwind" fn observation_slave_result_file<O: ObservationImplementation>(
    handle: *mut c_void,
) -> *const c_char {
    // SAFETY: guaranteed by the caller.
    let Some(cell) = (unsafe { handle.cast::<ObservationCell<O>>().as_mut() }) else {
        return ptr::null();
    };
    let file = panic::catch_unwind(AssertUnwindSafe(|| cell.module.result_file())).ok().flatten();
    cell.result_file = file.and_then(|f| CString::new(f).ok());
    cell.result_file.as_ref().map_or(ptr::null(), |f| f.as_ptr())
}

/// # Safety
/// `s` must be null or a valid nul-terminated string.
unsafe fn c_str(s: *const c_char) -> Option<String> {
    if s.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    Some(unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned())
}

/// `true` only if `f` returned `Ok`.
///
/// A panic is logged with its message and resumed, so it crosses the
/// `C-unwind` boundary and reaches the host-side [`barrier`].
fn succeeded(entry_point: &'static str, f: impl FnOnce() -> Result<(), String>) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.is_ok(),
        Err(payload) => {
            error!(entry_point, panic = %panic_message(&*payload), "plugin entry point panicked");
            panic::resume_unwind(payload)
        }
    }
}

// ── Host-side barrier ─────────────────────────────────────────────────────────

/// Call into a library, turning a panic into [`ModelCallError::Panicked`].
pub(crate) fn barrier<T>(entry_point: &'static str, f: impl FnOnce() -> T) -> Result<T, ModelCallError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| ModelCallError::Panicked {
        entry_point,
        message: panic_message(&*payload),
    })
}

/// [`barrier`] for entry points that report success as `bool`.
pub(crate) fn checked(entry_point: &'static str, f: impl FnOnce() -> bool) -> Result<(), ModelCallError> {
    if barrier(entry_point, f)? {
        Ok(())
    } else {
        Err(ModelCallError::Rejected { entry_point })
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// `true` when both versions share the same major component.
pub fn compatible(found: &str, expected: &str) -> bool {
    let major = |v: &str| v.trim().split('.').next().map(str::to_owned);
    matches!((major(found), major(expected)), (Some(a), Some(b)) if !a.is_empty() && a == b)
}

// ── Export macros ─────────────────────────────────────────────────────────────

/// Export the model entry points for one [`ModelImplementation`].
#[macro_export]
macro_rules! export_model_library {
    ($model:ty) => {
        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub extern "C-unwind" fn ModelGetVersion() -> *const ::std::ffi::c_char {
            $crate::abi::model_get_version()
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case, improper_ctypes_definitions)]
        pub unsafe extern "C-unwind" fn ModelCreateInstance(
            init: *const $crate::abi::ModelInit<'_>,
        ) -> *mut ::std::ffi::c_void {
            unsafe { $crate::abi::model_create::<$model>(init) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn ModelDestroyInstance(handle: *mut ::std::ffi::c_void) {
            unsafe { $crate::abi::model_destroy::<$model>(handle) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case, improper_ctypes_definitions)]
        pub unsafe extern "C-unwind" fn ModelUpdateInput(
            handle: *mut ::std::ffi::c_void,
            link: u32,
            signal: *const $crate::cg_core::Signal,
            time: i32,
        ) -> bool {
            unsafe { $crate::abi::model_update_input::<$model>(handle, link, signal, time) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case, improper_ctypes_definitions)]
        pub unsafe extern "C-unwind" fn ModelUpdateOutput(
            handle: *mut ::std::ffi::c_void,
            link: u32,
            signal: *mut ::std::option::Option<$crate::cg_core::Signal>,
            time: i32,
        ) -> bool {
            unsafe { $crate::abi::model_update_output::<$model>(handle, link, signal, time) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn ModelTrigger(handle: *mut ::std::ffi::c_void, time: i32) -> bool {
            unsafe { $crate::abi::model_trigger::<$model>(handle, time) }
        }
    };
}

/// Export the observation entry points for one [`ObservationImplementation`].
#[macro_export]
macro_rules! export_observation_library {
    ($observer:ty) => {
        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub extern "C-unwind" fn ObservationGetVersion() -> *const ::std::ffi::c_char {
            $crate::abi::observation_get_version()
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case, improper_ctypes_definitions)]
        pub unsafe extern "C-unwind" fn ObservationCreateInstance(
            init: *const $crate::abi::ObservationInit<'_>,
        ) -> *mut ::std::ffi::c_void {
            unsafe { $crate::abi::observation_create::<$observer>(init) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn ObservationDestroyInstance(handle: *mut ::std::ffi::c_void) {
            unsafe { $crate::abi::observation_destroy::<$observer>(handle) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn ObservationMasterPreHook(handle: *mut ::std::ffi::c_void) -> bool {
            unsafe { $crate::abi::observation_master_pre::<$observer>(handle) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn ObservationMasterPostHook(
            handle: *mut ::std::ffi::c_void,
            filename: *const ::std::ffi::c_char,
        ) -> bool {
            unsafe { $crate::abi::observation_master_post::<$observer>(handle, filename) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn ObservationSlavePreHook(
            handle: *mut ::std::ffi::c_void,
            path: *const ::std::ffi::c_char,
        ) -> bool {
            unsafe { $crate::abi::observation_slave_pre::<$observer>(handle, path) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn ObservationSlavePreRunHook(handle: *mut ::std::ffi::c_void) -> bool {
            unsafe { $crate::abi::observation_slave_pre_run::<$observer>(handle) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case, improper_ctypes_definitions)]
        pub unsafe extern "C-unwind" fn ObservationSlaveUpdateHook(
            handle: *mut ::std::ffi::c_void,
            time: i32,
            run_result: *mut $crate::cg_core::RunResult,
        ) -> bool {
            unsafe { $crate::abi::observation_slave_update::<$observer>(handle, time, run_result) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case, improper_ctypes_definitions)]
        pub unsafe extern "C-unwind" fn ObservationSlavePostRunHook(
            handle: *mut ::std::ffi::c_void,
            run_result: *const $crate::cg_core::RunResult,
        ) -> bool {
            unsafe { $crate::abi::observation_slave_post_run::<$observer>(handle, run_result) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn ObservationSlavePostHook(handle: *mut ::std::ffi::c_void) -> bool {
            unsafe { $crate::abi::observation_slave_post::<$observer>(handle) }
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn ObservationSlaveResultFile(
            handle: *mut ::std::ffi::c_void,
        ) -> *const ::std::ffi::c_char {
            unsafe { $crate::abi::observation_slave_result_file::<$observer>(handle) }
        }
    };
}
