//! Package identity registration through the OS packaging command.
//!
//! Runs only after a fresh embed. A failure is reported but leaves the
//! already-built artifact in place.

use std::process::Command;

use tracing::info;

use super::command::{run_captured, split_command_line};
use super::{ManifestContext, Registrar};
use crate::error::{Error, Result, status_message};

/// Force re-registration even when the installed package version differs.
const FORCE_UPDATE_FLAG: &str = "-ForceUpdateFromAnyVersion";

/// Registers the package by running the configured packaging command:
/// `<command...> -Register <manifest> -ForceUpdateFromAnyVersion`.
#[derive(Debug, Clone)]
pub struct CommandRegistrar {
    program: String,
    args: Vec<String>,
}

impl CommandRegistrar {
    pub fn new(command_line: &[String]) -> Result<Self> {
        let (program, args) = split_command_line(command_line, "registrar")?;
        Ok(Self { program, args })
    }
}

impl Registrar for CommandRegistrar {
    fn register(&self, context: &ManifestContext) -> Result<()> {
        // Package identity needs a manifest; without one the OS command
        // fails with an opaque error, so report it up front.
        if !context.manifest.is_file() {
            return Err(Error::Registration {
                message: format!("package manifest {} not found", context.manifest.display()),
                stderr: String::new(),
            });
        }

        info!(manifest = %context.manifest.display(), "registering package identity");

        let output = run_captured(
            Command::new(&self.program)
                .args(&self.args)
                .arg("-Register")
                .arg(&context.manifest)
                .arg(FORCE_UPDATE_FLAG),
        )
        .map_err(|e| Error::Registration {
            message: format!("cannot spawn `{}`: {e}", self.program),
            stderr: String::new(),
        })?;

        if !output.status.success() {
            return Err(Error::Registration {
                message: status_message(&self.program, output.status),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}
