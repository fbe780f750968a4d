//! Where plugin libraries live on disk.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};

/// Library lookup settings shared by model and observation bindings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PluginConfig {
    /// Directory searched for every library.
    pub library_dir:   PathBuf,
    /// Inserted between the library name and the platform suffix, e.g. `"d"`
    /// for debug builds.
    pub debug_postfix: Option<String>,
}

impl PluginConfig {
    pub fn new(library_dir: impl Into<PathBuf>) -> Self {
        Self { library_dir: library_dir.into(), debug_postfix: None }
    }

    pub fn with_debug_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.debug_postfix = Some(postfix.into());
        self
    }

    /// `<library_dir>/<prefix><name><debug_postfix><suffix>` using the
    /// platform conventions (`libfoo.so`, `foo.dll`, `libfoo.dylib`).
    pub fn library_path(&self, name: &str) -> PathBuf {
        let postfix = self.debug_postfix.as_deref().unwrap_or("");
        self.library_dir
            .join(format!("{DLL_PREFIX}{name}{postfix}{DLL_SUFFIX}"))
    }

    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }
}
