use cg_core::{AgentId, ChannelId, CoreError, LinkId};
use thiserror::Error;

use crate::ComponentIndex;

/// Construction and wiring errors.  Any of these aborts the agent being
/// built; no partially wired agent is ever returned.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate component '{0}'")]
    DuplicateComponent(String),

    #[error("duplicate channel {0}")]
    DuplicateChannel(ChannelId),

    #[error("component '{component}' link {link}: channel {channel} does not exist")]
    MissingChannel {
        component: String,
        link:      LinkId,
        channel:   ChannelId,
    },

    #[error("component '{component}' declares link {link} twice")]
    DuplicateLink {
        component: String,
        link:      LinkId,
    },

    #[error("channel {0} already has a source")]
    SourceAlreadySet(ChannelId),

    #[error("component {component:?} is already a target of channel {channel}")]
    DuplicateTarget {
        channel:   ChannelId,
        component: ComponentIndex,
    },

    #[error("channel {0} already has a buffer")]
    BufferAlreadyAttached(ChannelId),

    #[error("channel {0} has targets but no source")]
    ChannelWithoutSource(ChannelId),

    #[error("component '{component}' has no output link {link}")]
    UnknownOutputLink {
        component: String,
        link:      LinkId,
    },

    #[error("component '{component}' has no input link {link}")]
    UnknownInputLink {
        component: String,
        link:      LinkId,
    },

    #[error("agent {agent}: could not create component '{component}': {reason}")]
    ComponentCreation {
        agent:     AgentId,
        component: String,
        reason:    String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Failure of one plugin call made through a [`ModelInstance`][crate::ModelInstance].
#[derive(Debug, Error)]
pub enum ModelCallError {
    #[error("entry point {entry_point} reported failure")]
    Rejected { entry_point: &'static str },

    #[error("entry point {entry_point} panicked: {message}")]
    Panicked {
        entry_point: &'static str,
        message:     String,
    },

    #[error("implementation handle already released")]
    Released,
}

/// Failure of one component cycle.  The scheduler treats this as "this
/// component cycle failed"; it never tears down the process.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("component '{0}' has no bound implementation")]
    NoImplementation(String),

    #[error("component '{component}' has no buffer for link {link}")]
    NoBuffer {
        component: String,
        link:      LinkId,
    },

    #[error("no component at index {0:?}")]
    UnknownComponent(ComponentIndex),

    #[error("component '{component}': {source}")]
    Model {
        component: String,
        #[source]
        source:    ModelCallError,
    },
}

pub type CycleResult = Result<(), CycleError>;
