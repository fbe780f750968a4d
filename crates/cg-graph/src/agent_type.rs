//! Blueprint of a whole agent graph.

use std::collections::BTreeMap;
use std::sync::Arc;

use cg_core::ChannelId;

use crate::{ComponentType, GraphError, GraphResult};

/// Ordered channel ids plus named component blueprints.
///
/// Component blueprints are held behind `Arc` so that several agents (and
/// several agent types) can share identical nodes.
#[derive(Clone, Debug, Default)]
pub struct AgentType {
    channels:   Vec<ChannelId>,
    components: BTreeMap<String, Arc<ComponentType>>,
}

impl AgentType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&mut self, id: ChannelId) -> GraphResult<()> {
        if self.channels.contains(&id) {
            return Err(GraphError::DuplicateChannel(id));
        }
        self.channels.push(id);
        Ok(())
    }

    /// Register `id` unless it is already present.  Used by generators that
    /// merge blueprints sharing channels.
    pub fn ensure_channel(&mut self, id: ChannelId) {
        if !self.channels.contains(&id) {
            self.channels.push(id);
        }
    }

    pub fn add_component(&mut self, component: Arc<ComponentType>) -> GraphResult<()> {
        let name = component.name().to_owned();
        if self.components.contains_key(&name) {
            return Err(GraphError::DuplicateComponent(name));
        }
        self.components.insert(name, component);
        Ok(())
    }

    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    pub fn contains_channel(&self, id: ChannelId) -> bool {
        self.channels.contains(&id)
    }

    pub fn components(&self) -> &BTreeMap<String, Arc<ComponentType>> {
        &self.components
    }

    pub fn component(&self, name: &str) -> Option<&Arc<ComponentType>> {
        self.components.get(name)
    }

    /// Highest channel id used anywhere in the blueprint, including links
    /// whose channel is not (yet) registered.
    pub fn max_channel_id(&self) -> Option<ChannelId> {
        let linked = self
            .components
            .values()
            .flat_map(|c| c.input_links().values().chain(c.output_links().values()));
        self.channels.iter().chain(linked).copied().max()
    }
}
