//! Seams between the graph and the plugin binding layer.
//!
//! The graph never talks to a shared library directly.  It holds a boxed
//! [`ModelInstance`] per component and asks a [`ComponentFactory`] to create
//! and release them, which keeps this crate free of FFI and lets tests bind
//! plain Rust implementations.

use std::any::Any;
use std::sync::Arc;

use cg_core::{AgentId, LinkId, ObserverRef, Signal, SimTime};

use crate::{ComponentType, GraphResult, ModelCallError};

/// A live implementation bound to exactly one model library.
pub trait ModelInstance {
    /// Name of the library that created this instance.
    fn library_name(&self) -> &str;

    /// Run the compute step.
    fn trigger(&mut self, time: SimTime) -> Result<(), ModelCallError>;

    /// Consume the current value of an input link.
    fn update_input(&mut self, link: LinkId, signal: Option<&Signal>, time: SimTime) -> Result<(), ModelCallError>;

    /// Produce a fresh value for an output link.
    fn update_output(&mut self, link: LinkId, time: SimTime) -> Result<Option<Signal>, ModelCallError>;

    /// Recover the concrete type when the instance is handed back for release.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Everything a factory needs to create one component implementation.
pub struct ComponentRequest<'a> {
    pub agent:          AgentId,
    pub name:           &'a str,
    pub component_type: &'a Arc<ComponentType>,
    pub observers:      &'a [ObserverRef],
}

/// Result of handing an instance back to its factory.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ReleaseOutcome {
    Released,
    /// The instance was not created by this factory; it was dropped without
    /// calling into any library.
    NotTracked,
}

/// Creates and releases component implementations.
pub trait ComponentFactory {
    fn create_component(&mut self, request: &ComponentRequest<'_>) -> GraphResult<Box<dyn ModelInstance>>;

    fn release_component(&mut self, instance: Box<dyn ModelInstance>) -> ReleaseOutcome;
}
