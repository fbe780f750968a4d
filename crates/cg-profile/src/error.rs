use cg_core::CoreError;
use cg_graph::GraphError;
use thiserror::Error;

/// Agent-build failures.  Each one is fatal to the agent being built; no
/// partially assembled agent type escapes.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("agent profile '{0}' not found")]
    UnknownAgentProfile(String),

    #[error("{kind} profile '{name}' not found")]
    UnknownProfile {
        kind: String,
        name: String,
    },

    #[error("blueprint system has no component '{0}'")]
    UnknownBlueprint(String),

    #[error("vehicle model '{0}' not found")]
    UnknownVehicleModel(String),

    #[error("system config '{file}' has no system {system_id}")]
    UnknownSystemConfig {
        file:      String,
        system_id: i32,
    },

    #[error("profile '{profile}' is missing required field '{field}'")]
    MissingField {
        profile: String,
        field:   &'static str,
    },

    #[error("no selectable option for {0}")]
    NoOptions(String),

    #[error("vehicle profile '{vehicle}' fits component type '{component_type}' more than once")]
    DuplicateVehicleComponent {
        vehicle:        String,
        component_type: String,
    },

    #[error("{0} id space exhausted")]
    IdSpaceExhausted(&'static str),

    #[error("agent type '{0}' is not dynamic")]
    NotDynamic(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ProfileResult<T> = Result<T, ProfileError>;
