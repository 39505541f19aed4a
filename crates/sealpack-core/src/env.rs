//! Host environment gate.
//!
//! Packaging only works on the target OS and with a runtime recent enough
//! to understand the blob build config. Both are checked before the
//! pipeline touches the filesystem.

use std::path::Path;
use std::process::Command;

pub use semver::Version;
use tracing::debug;

use crate::error::{Error, Result};

/// What the pipeline requires of the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirements {
    pub target_os: String,
    pub min_runtime_major: u64,
}

impl Requirements {
    /// OS half of the gate. Needs no runtime, so it can run before the
    /// runtime is even looked up.
    pub fn check_os(&self, os: &str) -> Result<()> {
        if os != self.target_os {
            return Err(Error::Environment(format!(
                "packaging targets {}, but this host runs {os}",
                self.target_os
            )));
        }
        Ok(())
    }

    /// [`Requirements::check_os`] against the OS this process runs on.
    pub fn check_host_os(&self) -> Result<()> {
        self.check_os(std::env::consts::OS)
    }
}

/// What the host actually provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    pub os: String,
    pub runtime_version: Version,
}

impl HostEnvironment {
    /// Probe the current OS and ask `runtime --version` for its version.
    pub fn detect(runtime: &Path) -> Result<Self> {
        let output = Command::new(runtime).arg("--version").output().map_err(|e| {
            Error::Environment(format!("cannot run `{} --version`: {e}", runtime.display()))
        })?;

        if !output.status.success() {
            return Err(Error::Environment(format!(
                "`{} --version` exited with {}",
                runtime.display(),
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let runtime_version = parse_runtime_version(&stdout)?;
        debug!(runtime = %runtime.display(), version = %runtime_version, "detected runtime");

        Ok(Self {
            os: std::env::consts::OS.to_string(),
            runtime_version,
        })
    }

    /// Fail with [`Error::Environment`] unless the host satisfies `req`.
    pub fn check(&self, req: &Requirements) -> Result<()> {
        req.check_os(&self.os)?;

        if self.runtime_version.major < req.min_runtime_major {
            return Err(Error::Environment(format!(
                "runtime {} is too old; major version {} or newer is required",
                self.runtime_version, req.min_runtime_major
            )));
        }

        Ok(())
    }
}

/// Parse version output such as `v22.11.0\n`.
pub fn parse_runtime_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);

    Version::parse(bare)
        .map_err(|e| Error::Environment(format!("unrecognized runtime version {trimmed:?}: {e}")))
}
