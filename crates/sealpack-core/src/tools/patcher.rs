//! Subprocess-backed patcher that embeds the blob into the host copy.

use std::path::Path;
use std::process::Command;

use tracing::info;

use super::command::{run_captured, split_command_line};
use super::{PatchRequest, Patcher};
use crate::error::{Error, Result, status_message};

/// Runs a configured patcher command with the request's positional args
/// appended, inside the workspace.
#[derive(Debug, Clone)]
pub struct CommandPatcher {
    program: String,
    args: Vec<String>,
}

impl CommandPatcher {
    pub fn new(command_line: &[String]) -> Result<Self> {
        let (program, args) = split_command_line(command_line, "patcher")?;
        Ok(Self { program, args })
    }
}

impl Patcher for CommandPatcher {
    fn patch(&self, workspace: &Path, request: &PatchRequest<'_>) -> Result<()> {
        info!(
            artifact = request.artifact,
            resource = request.resource_id,
            "embedding blob"
        );

        let output = run_captured(
            Command::new(&self.program)
                .args(&self.args)
                .args(request.args())
                .current_dir(workspace),
        )
        .map_err(|e| Error::PatchTool {
            message: format!("cannot spawn `{}`: {e}", self.program),
            stderr: String::new(),
        })?;

        if !output.status.success() {
            return Err(Error::PatchTool {
                message: status_message(&self.program, output.status),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}
