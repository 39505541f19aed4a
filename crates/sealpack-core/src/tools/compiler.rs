//! Blob compiler backed by the runtime executable.
//!
//! Output is captured so a failure carries the compiler's diagnostics.
//! A run that exits 0 but prints the runtime's "not supported" notice is
//! still a failure.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use super::Compiler;
use super::command::run_captured;
use crate::error::{Error, Result, status_message};

/// Marker the runtime prints when it cannot build blobs on this host.
const UNSUPPORTED_MARKER: &str = "is not supported";

/// Compiles blobs by invoking the runtime itself:
/// `<runtime> <args...> <config_file>` inside the workspace.
#[derive(Debug, Clone)]
pub struct RuntimeCompiler {
    runtime: PathBuf,
    args: Vec<String>,
}

impl RuntimeCompiler {
    pub fn new(runtime: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            runtime: runtime.into(),
            args,
        }
    }
}

impl Compiler for RuntimeCompiler {
    fn compile(&self, workspace: &Path, config_file: &str) -> Result<()> {
        let program = self.runtime.display().to_string();
        info!(runtime = %program, config = config_file, "compiling blob");

        let output = run_captured(
            Command::new(&self.runtime)
                .args(&self.args)
                .arg(config_file)
                .current_dir(workspace),
        )
        .map_err(|e| Error::BuildTool {
            message: format!("cannot spawn `{program}`: {e}"),
            stderr: String::new(),
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(Error::BuildTool {
                message: status_message(&program, output.status),
                stderr,
            });
        }

        // Older runtimes accept the flag, print a notice and exit 0.
        if stderr.contains(UNSUPPORTED_MARKER) {
            return Err(Error::BuildTool {
                message: format!("`{program}` reports blob building as unsupported on this host"),
                stderr,
            });
        }

        Ok(())
    }
}
