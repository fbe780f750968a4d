//! Read-only handles to loaded observation modules.

use std::ffi::c_void;
use std::ptr::NonNull;

use crate::ObserverId;

/// Non-owning reference to an observation module's implementation.
///
/// Components receive the full set of observers at creation and may pass the
/// raw instance to plugin code that knows its concrete type.  The handle
/// stays valid for as long as the owning observation network keeps the
/// module loaded, which spans every agent of every invocation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ObserverRef {
    id:       ObserverId,
    instance: NonNull<c_void>,
}

impl ObserverRef {
    pub fn new(id: ObserverId, instance: NonNull<c_void>) -> Self {
        Self { id, instance }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Raw implementation pointer as created by the observation library.
    pub fn instance(&self) -> *const c_void {
        self.instance.as_ptr().cast_const()
    }
}
