//! Project configuration.
//!
//! Read from a TOML file (`sealpack.toml` by default). Every field has a
//! default, so an empty or missing file describes a conventional project:
//! `index.js` packaged into `dist/` with the `node` runtime.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::env::Requirements;
use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "sealpack.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Script to package.
    pub script: PathBuf,

    /// Build workspace, reused across runs.
    pub workspace: PathBuf,

    /// Runtime executable: compiles the blob and serves as the host binary.
    pub runtime: String,

    /// Arguments placed before the build config filename when compiling.
    pub compiler_args: Vec<String>,

    /// Patcher command line prefix.
    pub patcher: Vec<String>,

    pub target_os: String,
    pub min_runtime_major: u64,

    pub registrar: RegistrarSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrarSettings {
    /// Packaging command line prefix.
    pub command: Vec<String>,

    /// Package manifest, relative to the current directory.
    pub manifest: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            script: PathBuf::from("index.js"),
            workspace: PathBuf::from("dist"),
            runtime: "node".to_string(),
            compiler_args: vec!["--experimental-sea-config".to_string()],
            patcher: vec!["npx".to_string(), "postject".to_string()],
            target_os: "windows".to_string(),
            min_runtime_major: 20,
            registrar: RegistrarSettings::default(),
        }
    }
}

impl Default for RegistrarSettings {
    fn default() -> Self {
        Self {
            command: vec![
                "powershell".to_string(),
                "-NoProfile".to_string(),
                "-Command".to_string(),
                "Add-AppxPackage".to_string(),
            ],
            manifest: PathBuf::from("AppxManifest.xml"),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io_at("read", path, e))?;
        Self::from_toml(&text)
    }

    /// Load `path` when given, else `sealpack.toml` under `dir` if present,
    /// else the defaults.
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn requirements(&self) -> Requirements {
        Requirements {
            target_os: self.target_os.clone(),
            min_runtime_major: self.min_runtime_major,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.patcher.is_empty() {
            return Err(Error::Config("`patcher` must name a command".into()));
        }
        if self.registrar.command.is_empty() {
            return Err(Error::Config("`registrar.command` must name a command".into()));
        }
        if self.runtime.trim().is_empty() {
            return Err(Error::Config("`runtime` must not be empty".into()));
        }
        Ok(())
    }
}
