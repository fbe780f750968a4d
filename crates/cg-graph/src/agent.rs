//! One live component graph.
//!
//! # Instantiation
//!
//! ```text
//! 1. channels     one Channel per id listed by the AgentType
//! 2. components   create each Component, bind an implementation through the
//!                 ComponentFactory, register it as source / target of the
//!                 channels its links name
//! 3. wiring       per channel: the source creates its owned buffer, every
//!                 target receives the same BufferRef
//! ```
//!
//! Any failure releases whatever was already created and returns the error;
//! a partially wired agent never escapes.

use std::collections::BTreeMap;
use std::sync::Arc;

use cg_core::{AgentId, ChannelId, LinkId, ObserverRef, SimTime};
use tracing::{debug, error, warn};

use crate::{
    AgentType, Channel, Component, ComponentFactory, ComponentRequest, ComponentType, CycleError,
    CycleResult, Endpoint, GraphError, GraphResult, ReleaseOutcome,
};

/// Position of a component inside its agent's arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ComponentIndex(pub u32);

impl ComponentIndex {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A simulated entity: owns its components and channels.
pub struct Agent {
    id:         AgentId,
    spawn_time: SimTime,
    components: Vec<Component>,
    by_name:    BTreeMap<String, ComponentIndex>,
    channels:   BTreeMap<ChannelId, Channel>,
}

impl Agent {
    /// An empty agent.  Most callers want [`Agent::instantiate`].
    pub fn new(id: AgentId, spawn_time: SimTime) -> Self {
        Self {
            id,
            spawn_time,
            components: Vec::new(),
            by_name:    BTreeMap::new(),
            channels:   BTreeMap::new(),
        }
    }

    /// Build, bind, and wire a complete agent from its blueprint.
    pub fn instantiate(
        id:         AgentId,
        spawn_time: SimTime,
        agent_type: &AgentType,
        factory:    &mut dyn ComponentFactory,
        observers:  &[ObserverRef],
    ) -> GraphResult<Agent> {
        let mut agent = Agent::new(id, spawn_time);
        match agent.build(agent_type, factory, observers) {
            Ok(()) => {
                debug!(agent = %id, components = agent.components.len(), channels = agent.channels.len(), "agent instantiated");
                Ok(agent)
            }
            Err(e) => {
                error!(agent = %id, error = %e, "agent instantiation failed");
                agent.destroy(factory);
                Err(e)
            }
        }
    }

    fn build(
        &mut self,
        agent_type: &AgentType,
        factory:    &mut dyn ComponentFactory,
        observers:  &[ObserverRef],
    ) -> GraphResult<()> {
        for &channel in agent_type.channels() {
            self.add_channel(channel)?;
        }
        for (name, component_type) in agent_type.components() {
            let index = self.add_component(name, Arc::clone(component_type), observers)?;
            let request = ComponentRequest {
                agent: self.id,
                name,
                component_type,
                observers,
            };
            let implementation = factory.create_component(&request)?;
            self.components[index.index()].set_implementation(implementation);
            self.link_component(index)?;
        }
        self.wire()
    }

    pub fn add_channel(&mut self, id: ChannelId) -> GraphResult<()> {
        if self.channels.contains_key(&id) {
            return Err(GraphError::DuplicateChannel(id));
        }
        self.channels.insert(id, Channel::new(id, self.id));
        Ok(())
    }

    /// Add an unbound, unlinked component.
    pub fn add_component(
        &mut self,
        name:           &str,
        component_type: Arc<ComponentType>,
        observers:      &[ObserverRef],
    ) -> GraphResult<ComponentIndex> {
        if self.by_name.contains_key(name) {
            return Err(GraphError::DuplicateComponent(name.to_owned()));
        }
        let index = ComponentIndex(self.components.len() as u32);
        self.components
            .push(Component::new(name, self.id, index, component_type, observers));
        self.by_name.insert(name.to_owned(), index);
        Ok(index)
    }

    /// Register the component as source/target of the channels its blueprint
    /// links name.
    pub fn link_component(&mut self, index: ComponentIndex) -> GraphResult<()> {
        let component_type = Arc::clone(self.components[index.index()].component_type());
        let component = &mut self.components[index.index()];

        for (&link, &channel_id) in component_type.output_links() {
            let channel = self.channels.get_mut(&channel_id).ok_or_else(|| GraphError::MissingChannel {
                component: component.name().to_owned(),
                link,
                channel:   channel_id,
            })?;
            channel.set_source(Endpoint::new(index, link))?;
            component.add_output_link(link, channel_id)?;
        }

        for (&link, &channel_id) in component_type.input_links() {
            let channel = self.channels.get_mut(&channel_id).ok_or_else(|| GraphError::MissingChannel {
                component: component.name().to_owned(),
                link,
                channel:   channel_id,
            })?;
            channel.add_target(Endpoint::new(index, link))?;
            component.add_input_link(link, channel_id)?;
        }
        Ok(())
    }

    /// Two-pass buffer wiring: the source creates the buffer, every target
    /// receives the same reference.
    pub fn wire(&mut self) -> GraphResult<()> {
        for channel in self.channels.values_mut() {
            let Some(source) = channel.source() else {
                if channel.targets().is_empty() {
                    continue;
                }
                return Err(GraphError::ChannelWithoutSource(channel.id()));
            };
            let buffer = self.components[source.component.index()].create_output_buffer(source.link)?;
            channel.attach_buffer(buffer)?;
            for target in channel.targets() {
                self.components[target.component.index()].set_input_buffer(target.link, buffer)?;
            }
        }
        Ok(())
    }

    /// Tear the agent down: buffers first, then each component's
    /// implementation goes back to the library that created it.
    pub fn destroy(mut self, factory: &mut dyn ComponentFactory) {
        for component in &mut self.components {
            component.clear_buffers();
        }
        for channel in self.channels.values_mut() {
            channel.detach_buffer();
        }
        for component in self.components.iter_mut().rev() {
            let Some(implementation) = component.take_implementation() else {
                continue;
            };
            if factory.release_component(implementation) == ReleaseOutcome::NotTracked {
                warn!(agent = %self.id, component = component.name(), "implementation was not tracked by its library");
            }
        }
        debug!(agent = %self.id, "agent destroyed");
    }

    // ── Cycle operations (called by the external scheduler) ───────────────

    fn component_mut(&mut self, index: ComponentIndex) -> Result<&mut Component, CycleError> {
        self.components
            .get_mut(index.index())
            .ok_or(CycleError::UnknownComponent(index))
    }

    pub fn trigger_cycle(&mut self, index: ComponentIndex, time: SimTime) -> CycleResult {
        self.component_mut(index)?.trigger_cycle(time)
    }

    pub fn acquire_output_data(&mut self, index: ComponentIndex, link: LinkId, time: SimTime) -> CycleResult {
        self.component_mut(index)?.acquire_output_data(link, time)
    }

    pub fn release_output_data(&mut self, index: ComponentIndex, link: LinkId) -> CycleResult {
        self.component_mut(index)?.release_output_data(link)
    }

    /// Feed the current value of the input link's buffer to the component.
    ///
    /// The consumer receives a clone of the producer's `Arc`, i.e. the very
    /// same signal value, not a copy.
    pub fn update_input_data(&mut self, index: ComponentIndex, link: LinkId, time: SimTime) -> CycleResult {
        let component = self
            .components
            .get(index.index())
            .ok_or(CycleError::UnknownComponent(index))?;
        let Some(buffer) = component.input_buffer(link) else {
            let err = CycleError::NoBuffer { component: component.name().to_owned(), link };
            error!(error = %err, "component cycle failed");
            return Err(err);
        };
        let signal = self.components[buffer.component.index()]
            .output_buffer(buffer.link)
            .and_then(|b| b.get().cloned());
        self.components[index.index()].consume_input(link, signal.as_ref(), time)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn spawn_time(&self) -> SimTime {
        self.spawn_time
    }

    pub fn component_index(&self, name: &str) -> Option<ComponentIndex> {
        self.by_name.get(name).copied()
    }

    pub fn component(&self, index: ComponentIndex) -> Option<&Component> {
        self.components.get(index.index())
    }

    pub fn component_by_name(&self, name: &str) -> Option<&Component> {
        self.component_index(name).and_then(|i| self.component(i))
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("spawn_time", &self.spawn_time)
            .field("components", &self.by_name.keys().collect::<Vec<_>>())
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish()
    }
}
