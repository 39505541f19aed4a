//! Shared subprocess plumbing for the captured-output tools.

use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::error::Error;

/// Split a configured command line into program and leading arguments.
pub(crate) fn split_command_line(line: &[String], what: &str) -> Result<(String, Vec<String>), Error> {
    match line.split_first() {
        Some((program, args)) => Ok((program.clone(), args.to_vec())),
        None => Err(Error::Config(format!("{what} command is empty"))),
    }
}

/// Run a tool to completion with captured output.
///
/// stdin is closed so a tool waiting for input fails instead of hanging.
pub(crate) fn run_captured(cmd: &mut Command) -> std::io::Result<Output> {
    debug!(command = ?cmd, "spawning tool");

    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!("{line}");
    }

    Ok(output)
}
