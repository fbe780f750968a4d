//! World and event-network collaborators.
//!
//! Both are external to the runtime: the physics/world model and the event
//! bus are supplied by the host application.  The runtime only needs to
//! reset them between invocations and hand them to plugins, which downcast
//! through `as_any` to the concrete type they were built against.

use std::any::Any;

/// The simulated world (road network, traffic objects, physics).
pub trait World: Send + Sync {
    /// Prepare the world for a new invocation.  Returning `false` fails the
    /// invocation's initialisation.
    fn instantiate(&self) -> bool {
        true
    }

    /// Drop per-invocation state (agents, objects) but keep the scenery.
    fn reset(&self);

    /// Drop everything.
    fn clear(&self);

    fn as_any(&self) -> &dyn Any;
}

/// Event bus shared between the component controller and the scheduler.
pub trait EventNetwork: Send + Sync {
    /// Forget all events of the finished invocation.
    fn clear(&self);

    fn as_any(&self) -> &dyn Any;
}
