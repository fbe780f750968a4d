//! `cg-plugin` — binding of model and observation plugins.
//!
//! # Layout
//!
//! | Module          | Contents                                                        |
//! |-----------------|-----------------------------------------------------------------|
//! | [`abi`]         | Symbol names, entry-point types, create arguments, plugin-author traits and export macros |
//! | [`loader`]      | `LibraryLoader` / `SymbolTable` seam, `DynamicLoader`, `StaticLoader` |
//! | [`model`]       | `ModelLibrary`, `BoundModel`, `ModelBinding` (a `ComponentFactory`) |
//! | [`observation`] | `ObservationLibrary`, `ObservationModule`, `ObservationBinding`  |
//! | [`network`]     | `ObservationNetwork` lifecycle fan-out                          |
//! | [`config`]      | `PluginConfig` (library directory, debug postfix)               |
//!
//! # Library lifetime
//!
//! A registry loads each library once, on first use, and caches it by name.
//! Every instance created from a library holds a shared handle to it, so
//! unloading the registry while instances are alive only logs a warning and
//! the library stays mapped until the last of them is released.
//!
//! # Failure containment
//!
//! Every call across the library boundary runs inside `catch_unwind`.  A
//! panic or a `false` / null return becomes a typed error; plugin failures
//! never unwind into the simulation.

pub mod abi;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod network;
pub mod observation;

#[cfg(test)]
mod tests;

// Plugin crates reach core types through the export macros.
pub use cg_core;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use abi::{ModelImplementation, ModelInit, ObservationImplementation, ObservationInit};
pub use config::PluginConfig;
pub use error::{PluginError, PluginResult};
pub use loader::{DynamicLoader, LibraryLoader, StaticLibrary, StaticLoader, SymbolTable};
pub use model::{BoundModel, COMPONENT_CONTROLLER, ModelBinding, ModelLibrary};
pub use network::{ObservationInstance, ObservationNetwork};
pub use observation::{ObservationBinding, ObservationLibrary, ObservationModule};
