use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::STAGED_SCRIPT_FILE;
use crate::error::{Error, Result};

/// Name the bootstrap object is bound to at the top of the staged script.
pub const BOOTSTRAP_BINDING: &str = "__sealpack";

/// Explicit startup configuration handed to the packaged script.
///
/// Serialized into a single frozen object at the top of the staged script,
/// so the script reads one well-known binding instead of ambient globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    /// Always `true` inside a packaged artifact.
    pub packaged: bool,

    /// Absolute directory of the original script, so sibling resources
    /// still resolve at their pre-packaging location.
    pub source_root: String,
}

impl BootstrapConfig {
    pub fn for_script(script: &Path) -> Result<Self> {
        let absolute =
            std::path::absolute(script).map_err(|e| Error::io_at("resolve", script, e))?;
        let source_root = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(absolute);

        Ok(Self {
            packaged: true,
            source_root: source_root.to_string_lossy().into_owned(),
        })
    }

    /// Script text declaring the bootstrap binding.
    pub fn preamble(&self) -> Result<String> {
        let json = serde_json::to_string(self)
            .map_err(|e| Error::io("failed to serialize bootstrap config", e.into()))?;
        Ok(format!("const {BOOTSTRAP_BINDING} = Object.freeze({json});\n"))
    }
}

/// Write the staged script into `workspace`, creating the workspace if needed.
///
/// The staged file is always overwritten; only the blob compiled from it
/// takes part in change detection.
pub fn stage(workspace: &Path, script: &Path) -> Result<PathBuf> {
    fs::create_dir_all(workspace).map_err(|e| Error::io_at("create workspace", workspace, e))?;

    let source = fs::read_to_string(script).map_err(|e| Error::io_at("read script", script, e))?;
    let bootstrap = BootstrapConfig::for_script(script)?;

    let staged = workspace.join(STAGED_SCRIPT_FILE);
    let mut contents = bootstrap.preamble()?;
    contents.push_str(&source);

    fs::write(&staged, contents).map_err(|e| Error::io_at("write", &staged, e))?;
    debug!(staged = %staged.display(), source_root = %bootstrap.source_root, "staged script");

    Ok(staged)
}
