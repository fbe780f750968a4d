//! Holder of the value most recently published on a channel.

use cg_core::{ChannelId, LinkId, Signal};

use crate::ComponentIndex;

/// The last value published on one channel.
///
/// Owned exclusively by the source component.  Consumers never hold the
/// buffer itself; they hold a [`BufferRef`] and read the shared `Signal`
/// through the agent.
#[derive(Debug)]
pub struct ChannelBuffer {
    id:   ChannelId,
    data: Option<Signal>,
}

impl ChannelBuffer {
    pub fn new(id: ChannelId) -> Self {
        Self { id, data: None }
    }

    /// Same as the id of the channel the buffer is attached to.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Overwrite the stored value.
    pub fn set(&mut self, data: Option<Signal>) {
        self.data = data;
    }

    /// Drop the stored reference; the buffer itself stays attached.
    pub fn clear(&mut self) {
        self.data = None;
    }

    pub fn get(&self) -> Option<&Signal> {
        self.data.as_ref()
    }
}

/// Non-owning address of a buffer: the source component and its output link.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct BufferRef {
    pub channel:   ChannelId,
    pub component: ComponentIndex,
    pub link:      LinkId,
}
