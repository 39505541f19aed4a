//! Runs the final artifact as a child process.
//!
//! stdout and stderr are piped and relayed chunk by chunk, flushing after
//! every write, so output reaches the parent's streams as soon as the
//! child produces it. stdin is inherited. There is no timeout.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use super::Launcher;
use crate::error::{Error, Result};

const RELAY_BUF_SIZE: usize = 8 * 1024;

/// Destination for one relayed stream.
pub type Sink = Arc<Mutex<dyn Write + Send>>;

pub struct ProcessLauncher {
    stdout: Sink,
    stderr: Sink,
}

impl ProcessLauncher {
    /// Relay to this process's own stdout and stderr.
    pub fn new() -> Self {
        Self::with_sinks(Arc::new(Mutex::new(io::stdout())), Arc::new(Mutex::new(io::stderr())))
    }

    pub fn with_sinks(stdout: Sink, stderr: Sink) -> Self {
        Self { stdout, stderr }
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher for ProcessLauncher {
    fn run(&self, artifact: &Path, args: &[OsString]) -> Result<i32> {
        info!(artifact = %artifact.display(), "launching artifact");

        let mut child = Command::new(artifact)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::io_at("launch", artifact, e))?;

        let relays = [
            child.stdout.take().map(|out| relay(out, Arc::clone(&self.stdout))),
            child.stderr.take().map(|err| relay(err, Arc::clone(&self.stderr))),
        ];

        let status = child
            .wait()
            .map_err(|e| Error::io_at("wait for", artifact, e))?;

        for handle in relays.into_iter().flatten() {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("output relay stopped early: {e}"),
                Err(_) => warn!("output relay thread panicked"),
            }
        }

        match status.code() {
            Some(0) => Ok(0),
            code => Err(Error::ChildProcess { code }),
        }
    }
}

/// Copy `source` into `sink` until EOF, flushing after every chunk.
fn relay(mut source: impl Read + Send + 'static, sink: Sink) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || {
        let mut buf = [0u8; RELAY_BUF_SIZE];
        loop {
            let n = match source.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            let mut out = sink
                .lock()
                .map_err(|_| io::Error::other("relay sink poisoned"))?;
            out.write_all(&buf[..n])?;
            out.flush()?;
        }
    })
}
