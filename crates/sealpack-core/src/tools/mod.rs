//! Seams to the external tools the pipeline drives.
//!
//! Each collaborator sits behind a small trait so the orchestrator can be
//! exercised with deterministic fakes; the `Command*`/`Process*` types are
//! the real subprocess-backed implementations.

mod command;
pub mod compiler;
pub mod launcher;
pub mod patcher;
pub mod registrar;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use compiler::RuntimeCompiler;
pub use launcher::ProcessLauncher;
pub use patcher::CommandPatcher;
pub use registrar::CommandRegistrar;

/// Turns the staged script into a blob, driven by a build config file.
pub trait Compiler {
    /// Compile inside `workspace` using the config at `workspace/config_file`.
    fn compile(&self, workspace: &Path, config_file: &str) -> Result<()>;
}

/// Embeds a blob into a copied host binary.
pub trait Patcher {
    fn patch(&self, workspace: &Path, request: &PatchRequest<'_>) -> Result<()>;
}

/// Registers the final artifact with the OS package identity system.
pub trait Registrar {
    fn register(&self, context: &ManifestContext) -> Result<()>;
}

/// Runs the final artifact and reports how it exited.
pub trait Launcher {
    /// Returns `Ok(0)` on a clean exit and [`crate::Error::ChildProcess`] otherwise.
    fn run(&self, artifact: &Path, args: &[OsString]) -> Result<i32>;
}

/// Positional inputs for one patcher invocation. Filenames are relative to
/// the workspace the patcher runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest<'a> {
    pub artifact: &'a str,
    pub resource_id: &'a str,
    pub blob: &'a str,
    pub sentinel: &'a str,
}

impl PatchRequest<'_> {
    /// `<artifact> <resource_id> <blob> --sentinel-fuse <sentinel>`
    pub fn args(&self) -> Vec<&str> {
        vec![
            self.artifact,
            self.resource_id,
            self.blob,
            "--sentinel-fuse",
            self.sentinel,
        ]
    }
}

/// Everything the registrar needs to locate the package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestContext {
    pub manifest: PathBuf,
}
