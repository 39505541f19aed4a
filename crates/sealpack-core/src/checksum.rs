//! Content digests for change detection.
//!
//! Responsibilities:
//! - Stream a file through SHA-256 without loading it whole
//! - Encode the result as lowercase hex
//! - Tell "no previous artifact" apart from a read failure
//!
//! Non-responsibilities:
//! - Deciding what a changed digest means (handled in `build::decision`)

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};

/// Read buffer size used while streaming a file through the hasher.
const CHUNK_SIZE: usize = 64 * 1024;

/// Content fingerprint of a build artifact.
///
/// Lowercase hex-encoded SHA-256 of the file bytes. Two equal digests are
/// treated as byte-identical content by the pipeline; collision resistance
/// only matters as far as change detection does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the content digest of the file at `path`.
///
/// The file is streamed in fixed-size chunks, so artifacts of any size
/// are hashed without being loaded into memory. The result depends
/// **only** on the file bytes; timestamps and permissions are ignored.
pub fn digest(path: &Path) -> Result<ContentDigest> {
    let file = File::open(path).map_err(|e| Error::io_at("open", path, e))?;
    digest_reader(BufReader::new(file)).map_err(|e| Error::io_at("read", path, e))
}

/// Digest an already-open byte stream.
pub fn digest_reader(mut reader: impl Read) -> std::io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ContentDigest(hex::encode(hasher.finalize())))
}

/// Digest of `path` if it exists, `None` if there is nothing there yet.
///
/// Any other failure (permissions, unreadable file) is still an error.
pub fn digest_if_exists(path: &Path) -> Result<Option<ContentDigest>> {
    match File::open(path) {
        Ok(file) => digest_reader(BufReader::new(file))
            .map(Some)
            .map_err(|e| Error::io_at("read", path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io_at("open", path, e)),
    }
}
