//! `cg-graph` — per-agent component graphs and the cycle protocol.
//!
//! # Crate layout
//!
//! | Module             | Contents                                                   |
//! |--------------------|------------------------------------------------------------|
//! | [`buffer`]         | `ChannelBuffer` (owned by the source), `BufferRef`         |
//! | [`channel`]        | `Channel`, `Endpoint`                                      |
//! | [`component_type`] | `ComponentType` blueprint                                  |
//! | [`agent_type`]     | `AgentType` blueprint                                      |
//! | [`instance`]       | `ModelInstance`, `ComponentFactory` seams to plugin code   |
//! | [`component`]      | `Component` runtime node and its four cycle operations     |
//! | [`agent`]          | `Agent` — owns components and channels, wires buffers      |
//! | [`error`]          | `GraphError`, `CycleError`, `ModelCallError`               |
//!
//! # Ownership
//!
//! Ownership is strictly tree-shaped.  An [`Agent`] owns its components and
//! channels; a [`Component`] owns the buffers of its output links.  Every
//! back-reference (channel → component, input link → buffer) is a plain index
//! pair, never a pointer, so teardown is a simple drop in leaf-to-root order.
//!
//! # Cycle protocol
//!
//! ```text
//! producer.acquire_output_data(link)   → buffer := implementation.update_output(link)
//! consumer.update_input_data(link)     → implementation.update_input(link, buffer)
//! producer.release_output_data(link)   → buffer := none
//! ```
//!
//! The external scheduler decides the order; this crate only guarantees that
//! every consumer of a channel sees the very same `Signal` the producer
//! published.

pub mod agent;
pub mod agent_type;
pub mod buffer;
pub mod channel;
pub mod component;
pub mod component_type;
pub mod error;
pub mod instance;


pub use agent::{Agent, ComponentIndex};
pub use agent_type::AgentType;
pub use buffer::{BufferRef, ChannelBuffer};
pub use channel::{Channel, Endpoint};
pub use component::Component;
pub use component_type::ComponentType;
pub use error::{CycleError, CycleResult, GraphError, GraphResult, ModelCallError};
pub use instance::{ComponentFactory, ComponentRequest, ModelInstance, ReleaseOutcome};
