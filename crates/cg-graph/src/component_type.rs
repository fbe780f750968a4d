//! Static blueprint of one graph node.

use std::collections::BTreeMap;
use std::sync::Arc;

use cg_core::{ChannelId, LinkId, ParameterSet, ScheduleMetadata};

use crate::{GraphError, GraphResult};

/// Blueprint from which [`Component`][crate::Component]s are instantiated.
///
/// Schedule metadata and model library are fixed at construction.  Links can
/// still be added while an [`AgentType`][crate::AgentType] is being assembled;
/// once a blueprint is shared behind an `Arc` it is effectively immutable.
#[derive(Clone, Debug)]
pub struct ComponentType {
    name:          String,
    schedule:      ScheduleMetadata,
    model_library: String,
    input_links:   BTreeMap<LinkId, ChannelId>,
    output_links:  BTreeMap<LinkId, ChannelId>,
    parameters:    Arc<ParameterSet>,
}

impl ComponentType {
    pub fn new(name: impl Into<String>, schedule: ScheduleMetadata, model_library: impl Into<String>) -> Self {
        Self {
            name:          name.into(),
            schedule,
            model_library: model_library.into(),
            input_links:   BTreeMap::new(),
            output_links:  BTreeMap::new(),
            parameters:    Arc::new(ParameterSet::new()),
        }
    }

    /// A copy of this blueprint registered under a different component name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self.clone() }
    }

    pub fn add_input_link(&mut self, link: LinkId, channel: ChannelId) -> GraphResult<()> {
        Self::insert_link(&self.name, &mut self.input_links, link, channel)
    }

    pub fn add_output_link(&mut self, link: LinkId, channel: ChannelId) -> GraphResult<()> {
        Self::insert_link(&self.name, &mut self.output_links, link, channel)
    }

    /// Builder-style [`add_input_link`](Self::add_input_link).
    pub fn with_input(mut self, link: u32, channel: u32) -> GraphResult<Self> {
        self.add_input_link(LinkId(link), ChannelId(channel))?;
        Ok(self)
    }

    pub fn with_output(mut self, link: u32, channel: u32) -> GraphResult<Self> {
        self.add_output_link(LinkId(link), ChannelId(channel))?;
        Ok(self)
    }

    pub fn remove_input_link(&mut self, link: LinkId) -> Option<ChannelId> {
        self.input_links.remove(&link)
    }

    /// Repoint an existing output link to another channel.
    pub fn replace_output_channel(&mut self, link: LinkId, channel: ChannelId) -> GraphResult<()> {
        match self.output_links.get_mut(&link) {
            Some(slot) => {
                *slot = channel;
                Ok(())
            }
            None => Err(GraphError::UnknownOutputLink { component: self.name.clone(), link }),
        }
    }

    pub fn set_parameters(&mut self, parameters: Arc<ParameterSet>) {
        self.parameters = parameters;
    }

    fn insert_link(
        component: &str,
        links:     &mut BTreeMap<LinkId, ChannelId>,
        link:      LinkId,
        channel:   ChannelId,
    ) -> GraphResult<()> {
        if links.contains_key(&link) {
            return Err(GraphError::DuplicateLink { component: component.to_owned(), link });
        }
        links.insert(link, channel);
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schedule(&self) -> ScheduleMetadata {
        self.schedule
    }

    pub fn model_library(&self) -> &str {
        &self.model_library
    }

    pub fn input_links(&self) -> &BTreeMap<LinkId, ChannelId> {
        &self.input_links
    }

    pub fn output_links(&self) -> &BTreeMap<LinkId, ChannelId> {
        &self.output_links
    }

    pub fn parameters(&self) -> &Arc<ParameterSet> {
        &self.parameters
    }
}
