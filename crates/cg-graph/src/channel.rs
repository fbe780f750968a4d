//! Single-writer, multi-reader edge between components.

use cg_core::{AgentId, ChannelId, LinkId};

use crate::{BufferRef, ComponentIndex, GraphError, GraphResult};

/// One end of a channel: a component and its local link id.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Endpoint {
    pub component: ComponentIndex,
    pub link:      LinkId,
}

impl Endpoint {
    pub fn new(component: ComponentIndex, link: LinkId) -> Self {
        Self { component, link }
    }
}

/// Typed edge of an agent's component graph.
#[derive(Debug)]
pub struct Channel {
    id:      ChannelId,
    agent:   AgentId,
    source:  Option<Endpoint>,
    targets: Vec<Endpoint>,
    buffer:  Option<BufferRef>,
}

impl Channel {
    pub fn new(id: ChannelId, agent: AgentId) -> Self {
        Self {
            id,
            agent,
            source:  None,
            targets: Vec::new(),
            buffer:  None,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Set the producing endpoint.  Fails without mutating state if a source
    /// is already set.
    pub fn set_source(&mut self, source: Endpoint) -> GraphResult<()> {
        if self.source.is_some() {
            return Err(GraphError::SourceAlreadySet(self.id));
        }
        self.source = Some(source);
        Ok(())
    }

    /// Register a consumer.  A component may be a target at most once.
    pub fn add_target(&mut self, target: Endpoint) -> GraphResult<()> {
        if self.targets.iter().any(|t| t.component == target.component) {
            return Err(GraphError::DuplicateTarget {
                channel:   self.id,
                component: target.component,
            });
        }
        self.targets.push(target);
        Ok(())
    }

    /// Attach the source's buffer.  At most one buffer per channel.
    pub fn attach_buffer(&mut self, buffer: BufferRef) -> GraphResult<()> {
        if self.buffer.is_some() {
            return Err(GraphError::BufferAlreadyAttached(self.id));
        }
        self.buffer = Some(buffer);
        Ok(())
    }

    pub fn source(&self) -> Option<Endpoint> {
        self.source
    }

    pub fn targets(&self) -> &[Endpoint] {
        &self.targets
    }

    pub fn buffer(&self) -> Option<BufferRef> {
        self.buffer
    }

    pub(crate) fn detach_buffer(&mut self) {
        self.buffer = None;
    }
}
