//! The bundle of framework services every plugin instance is created with.

use std::sync::Arc;

use crate::{Callbacks, EventNetwork, Stochastics, World};

/// Shared framework services.
///
/// Cloning is cheap (four `Arc` bumps); plugins may keep a clone for their
/// whole lifetime.
#[derive(Clone)]
pub struct Collaborators {
    pub stochastics:   Arc<dyn Stochastics>,
    pub world:         Arc<dyn World>,
    pub event_network: Arc<dyn EventNetwork>,
    pub callbacks:     Arc<dyn Callbacks>,
}

impl Collaborators {
    pub fn new(
        stochastics:   Arc<dyn Stochastics>,
        world:         Arc<dyn World>,
        event_network: Arc<dyn EventNetwork>,
        callbacks:     Arc<dyn Callbacks>,
    ) -> Self {
        Self { stochastics, world, event_network, callbacks }
    }
}
