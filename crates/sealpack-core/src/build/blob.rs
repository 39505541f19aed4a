use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::tools::Compiler;
use crate::{BLOB_FILE, BUILD_CONFIG_FILE, STAGED_SCRIPT_FILE};

/// Declarative input for the blob compiler.
///
/// Written fresh on every build. It is never checksummed itself; only the
/// blob it produces is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Staged script, relative to the workspace.
    pub main: String,
    /// Blob output, relative to the workspace.
    pub output: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            main: STAGED_SCRIPT_FILE.to_string(),
            output: BLOB_FILE.to_string(),
        }
    }
}

/// Writes the build config and drives a [`Compiler`] over it.
pub struct BlobBuilder<'a> {
    compiler: &'a dyn Compiler,
}

impl<'a> BlobBuilder<'a> {
    pub fn new(compiler: &'a dyn Compiler) -> Self {
        Self { compiler }
    }

    /// Produce the blob described by `config` inside `workspace`.
    ///
    /// Assumes the environment gate has already passed.
    pub fn build(&self, workspace: &Path, config: &BuildConfig) -> Result<()> {
        let config_path = workspace.join(BUILD_CONFIG_FILE);
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| Error::io("failed to serialize build config", e.into()))?;
        fs::write(&config_path, json).map_err(|e| Error::io_at("write", &config_path, e))?;

        self.compiler.compile(workspace, BUILD_CONFIG_FILE)
    }
}
