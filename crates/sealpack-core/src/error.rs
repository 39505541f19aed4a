//! Error taxonomy for the packaging pipeline.
//!
//! Every component returns [`Error`]. The orchestrator wraps whatever a
//! step returns in a [`PipelineError`] naming the step, so the top level
//! can print one diagnostic per failing stage.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Host OS or runtime does not meet the packaging requirements.
    #[error("unsupported environment: {0}")]
    Environment(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// External compiler failed, could not be spawned, or rejected the host.
    #[error("compiler failed: {message}{}", diagnostic(.stderr))]
    BuildTool { message: String, stderr: String },

    #[error("patcher failed: {message}{}", diagnostic(.stderr))]
    PatchTool { message: String, stderr: String },

    #[error("registration failed: {message}{}", diagnostic(.stderr))]
    Registration { message: String, stderr: String },

    /// The launched artifact terminated with anything but exit code 0.
    /// `code` is `None` when the child was killed by a signal.
    #[error("{}", describe_exit(.code))]
    ChildProcess { code: Option<i32> },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Shorthand for an I/O failure tied to a specific path.
    pub fn io_at(action: &str, path: &Path, source: io::Error) -> Self {
        Self::io(format!("failed to {action} {}", path.display()), source)
    }
}

fn diagnostic(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("artifact exited with code {code}"),
        None => "artifact was terminated by a signal".to_string(),
    }
}

/// Human-readable summary of a finished subprocess, e.g. `"`postject` exited with code 2"`.
pub fn status_message(program: &str, status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("`{program}` exited with code {code}"),
        None => format!("`{program}` was terminated by a signal"),
    }
}

/// Pipeline step a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Environment,
    Staging,
    Assemble,
    Register,
    Launch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Environment => "environment check",
            Self::Staging => "script staging",
            Self::Assemble => "artifact assembly",
            Self::Register => "identity registration",
            Self::Launch => "artifact launch",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl PipelineError {
    pub fn new(stage: Stage, source: Error) -> Self {
        Self { stage, source }
    }

    /// Exit code of the launched artifact, when that is what failed.
    pub fn child_exit_code(&self) -> Option<i32> {
        match self.source {
            Error::ChildProcess { code } => code,
            _ => None,
        }
    }
}
