use cg_graph::GraphError;
use cg_plugin::PluginError;
use cg_profile::ProfileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("run configuration error: {0}")]
    Config(String),

    #[error("world failed to initialise for invocation {invocation}")]
    WorldInit { invocation: u32 },

    #[error("spawn point network failed to initialise for invocation {invocation}")]
    SpawnPointInit { invocation: u32 },

    #[error("simulation aborted by the scheduler during invocation {invocation}")]
    Aborted { invocation: u32 },

    #[error("invocation {invocation} still failing after {retries} retries")]
    RetriesExhausted { invocation: u32, retries: u32 },

    #[error("stop requested before invocation {invocation}")]
    Stopped { invocation: u32 },

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),
}

pub type ExecResult<T> = Result<T, RunError>;
