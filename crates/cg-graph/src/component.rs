//! Runtime graph node and its cycle operations.

use std::collections::BTreeMap;
use std::sync::Arc;

use cg_core::{AgentId, ChannelId, LinkId, ObserverRef, ScheduleMetadata, Signal, SimTime};
use tracing::{error, trace};

use crate::{
    BufferRef, ChannelBuffer, ComponentIndex, ComponentType, CycleError, CycleResult, GraphError,
    GraphResult, ModelInstance,
};

/// One live node of an agent's graph.
///
/// Every cycle operation returns a [`CycleError`] (after logging it) instead
/// of panicking when no implementation is bound, the link has no buffer, or
/// the plugin call fails.
pub struct Component {
    name:           String,
    agent:          AgentId,
    index:          ComponentIndex,
    component_type: Arc<ComponentType>,
    implementation: Option<Box<dyn ModelInstance>>,
    inputs:         BTreeMap<LinkId, ChannelId>,
    outputs:        BTreeMap<LinkId, ChannelId>,
    output_buffers: BTreeMap<LinkId, ChannelBuffer>,
    input_buffers:  BTreeMap<LinkId, BufferRef>,
    observers:      Vec<ObserverRef>,
}

impl Component {
    pub fn new(
        name:           impl Into<String>,
        agent:          AgentId,
        index:          ComponentIndex,
        component_type: Arc<ComponentType>,
        observers:      &[ObserverRef],
    ) -> Self {
        Self {
            name: name.into(),
            agent,
            index,
            component_type,
            implementation: None,
            inputs:         BTreeMap::new(),
            outputs:        BTreeMap::new(),
            output_buffers: BTreeMap::new(),
            input_buffers:  BTreeMap::new(),
            observers:      observers.to_vec(),
        }
    }

    // ── Implementation binding ────────────────────────────────────────────

    pub fn set_implementation(&mut self, implementation: Box<dyn ModelInstance>) {
        self.implementation = Some(implementation);
    }

    /// Detach the implementation so its library can release it.
    pub fn take_implementation(&mut self) -> Option<Box<dyn ModelInstance>> {
        self.implementation.take()
    }

    pub fn has_implementation(&self) -> bool {
        self.implementation.is_some()
    }

    // ── Wiring ────────────────────────────────────────────────────────────

    pub fn add_input_link(&mut self, link: LinkId, channel: ChannelId) -> GraphResult<()> {
        if self.inputs.contains_key(&link) {
            return Err(GraphError::DuplicateLink { component: self.name.clone(), link });
        }
        self.inputs.insert(link, channel);
        Ok(())
    }

    pub fn add_output_link(&mut self, link: LinkId, channel: ChannelId) -> GraphResult<()> {
        if self.outputs.contains_key(&link) {
            return Err(GraphError::DuplicateLink { component: self.name.clone(), link });
        }
        self.outputs.insert(link, channel);
        Ok(())
    }

    /// Create the owned buffer for an output link and return its address.
    pub fn create_output_buffer(&mut self, link: LinkId) -> GraphResult<BufferRef> {
        let Some(&channel) = self.outputs.get(&link) else {
            return Err(GraphError::UnknownOutputLink { component: self.name.clone(), link });
        };
        if self.output_buffers.contains_key(&link) {
            return Err(GraphError::BufferAlreadyAttached(channel));
        }
        self.output_buffers.insert(link, ChannelBuffer::new(channel));
        Ok(BufferRef { channel, component: self.index, link })
    }

    /// Bind a buffer owned by another component to one of our input links.
    pub fn set_input_buffer(&mut self, link: LinkId, buffer: BufferRef) -> GraphResult<()> {
        if !self.inputs.contains_key(&link) {
            return Err(GraphError::UnknownInputLink { component: self.name.clone(), link });
        }
        if self.input_buffers.contains_key(&link) {
            return Err(GraphError::BufferAlreadyAttached(buffer.channel));
        }
        self.input_buffers.insert(link, buffer);
        Ok(())
    }

    pub fn output_buffer(&self, link: LinkId) -> Option<&ChannelBuffer> {
        self.output_buffers.get(&link)
    }

    pub fn input_buffer(&self, link: LinkId) -> Option<BufferRef> {
        self.input_buffers.get(&link).copied()
    }

    /// Drop every owned buffer.  First step of teardown.
    pub(crate) fn clear_buffers(&mut self) {
        self.output_buffers.clear();
        self.input_buffers.clear();
    }

    // ── Cycle operations ──────────────────────────────────────────────────

    /// Invoke the implementation's compute step.
    pub fn trigger_cycle(&mut self, time: SimTime) -> CycleResult {
        let name = &self.name;
        let Some(implementation) = self.implementation.as_mut() else {
            return Err(fail(CycleError::NoImplementation(name.clone())));
        };
        trace!(component = %name, %time, "trigger");
        implementation
            .trigger(time)
            .map_err(|source| fail(CycleError::Model { component: name.clone(), source }))
    }

    /// Ask the implementation for a fresh value and overwrite the link's buffer.
    pub fn acquire_output_data(&mut self, link: LinkId, time: SimTime) -> CycleResult {
        let name = &self.name;
        let Some(implementation) = self.implementation.as_mut() else {
            return Err(fail(CycleError::NoImplementation(name.clone())));
        };
        let Some(buffer) = self.output_buffers.get_mut(&link) else {
            return Err(fail(CycleError::NoBuffer { component: name.clone(), link }));
        };
        let data = implementation
            .update_output(link, time)
            .map_err(|source| fail(CycleError::Model { component: name.clone(), source }))?;
        buffer.set(data);
        Ok(())
    }

    /// End the visibility of the link's current value.  The buffer survives.
    pub fn release_output_data(&mut self, link: LinkId) -> CycleResult {
        if self.implementation.is_none() {
            return Err(fail(CycleError::NoImplementation(self.name.clone())));
        }
        match self.output_buffers.get_mut(&link) {
            Some(buffer) => {
                buffer.clear();
                Ok(())
            }
            None => Err(fail(CycleError::NoBuffer { component: self.name.clone(), link })),
        }
    }

    /// Hand `signal` (the current content of the input link's buffer) to the
    /// implementation.  The owning [`Agent`][crate::Agent] resolves the buffer.
    pub(crate) fn consume_input(&mut self, link: LinkId, signal: Option<&Signal>, time: SimTime) -> CycleResult {
        let name = &self.name;
        let Some(implementation) = self.implementation.as_mut() else {
            return Err(fail(CycleError::NoImplementation(name.clone())));
        };
        if !self.input_buffers.contains_key(&link) {
            return Err(fail(CycleError::NoBuffer { component: name.clone(), link }));
        }
        implementation
            .update_input(link, signal, time)
            .map_err(|source| fail(CycleError::Model { component: name.clone(), source }))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn index(&self) -> ComponentIndex {
        self.index
    }

    pub fn component_type(&self) -> &Arc<ComponentType> {
        &self.component_type
    }

    pub fn model_library(&self) -> &str {
        self.component_type.model_library()
    }

    pub fn inputs(&self) -> &BTreeMap<LinkId, ChannelId> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeMap<LinkId, ChannelId> {
        &self.outputs
    }

    pub fn observers(&self) -> &[ObserverRef] {
        &self.observers
    }

    // ── Schedule metadata for the external scheduler ──────────────────────

    fn schedule(&self) -> ScheduleMetadata {
        self.component_type.schedule()
    }

    pub fn init(&self) -> bool {
        self.schedule().is_init()
    }

    pub fn priority(&self) -> i32 {
        self.schedule().priority()
    }

    pub fn offset_time(&self) -> i32 {
        self.schedule().offset_time()
    }

    pub fn response_time(&self) -> i32 {
        self.schedule().response_time()
    }

    pub fn cycle_time(&self) -> i32 {
        self.schedule().cycle_time()
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("agent", &self.agent)
            .field("library", &self.model_library())
            .field("bound", &self.implementation.is_some())
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

fn fail(err: CycleError) -> CycleError {
    error!(error = %err, "component cycle failed");
    err
}
