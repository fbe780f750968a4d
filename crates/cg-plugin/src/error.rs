use std::path::PathBuf;

use cg_core::ObserverId;
use cg_graph::ModelCallError;
use thiserror::Error;

/// Binding failures.  Load, symbol and version errors are configuration
/// errors: the bind is abandoned and nothing is cached.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("could not load library '{library}' from {path}: {reason}")]
    Load {
        library: String,
        path:    PathBuf,
        reason:  String,
    },

    #[error("library '{library}' does not export {symbol}")]
    MissingSymbol {
        library: String,
        symbol:  &'static str,
    },

    #[error("library '{library}' reports ABI version {found}, host expects {expected}")]
    IncompatibleVersion {
        library:  String,
        found:    String,
        expected: &'static str,
    },

    #[error("library '{library}' could not create '{instance}'")]
    CreateFailed {
        library:  String,
        instance: String,
    },

    #[error("library '{library}': {source}")]
    Call {
        library: String,
        #[source]
        source:  ModelCallError,
    },

    #[error("argument cannot cross the plugin boundary: {0}")]
    InvalidArgument(String),

    #[error("observer {0} is already registered")]
    DuplicateObserver(ObserverId),
}

pub type PluginResult<T> = Result<T, PluginError>;
