//! Artifact assembly: the incremental core of the pipeline.
//!
//! The blob is rebuilt on every run. Embedding it (host binary copy plus
//! patcher invocation) is skipped whenever the fresh blob has the same
//! digest as the one left behind by the previous run and the final
//! artifact is still present. A failed embed removes the blob, so the
//! next run starts from "no previous digest" and retries wholesale.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::blob::{BlobBuilder, BuildConfig};
use super::decision::should_embed;
use crate::checksum::{self, ContentDigest};
use crate::error::{Error, Result};
use crate::tools::{Compiler, PatchRequest, Patcher};
use crate::{ARTIFACT_FILE, BLOB_FILE, RESOURCE_ID, SENTINEL_FUSE};

/// Outcome of one assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// `true` when a new final artifact was written.
    pub rebuilt: bool,
    pub previous: Option<ContentDigest>,
    pub current: ContentDigest,
}

pub struct Assembler<'a> {
    compiler: &'a dyn Compiler,
    patcher: &'a dyn Patcher,
}

impl<'a> Assembler<'a> {
    pub fn new(compiler: &'a dyn Compiler, patcher: &'a dyn Patcher) -> Self {
        Self { compiler, patcher }
    }

    /// Rebuild the blob in `workspace` and embed it into a copy of
    /// `host_binary` unless its content is unchanged and the final artifact
    /// from the previous embed is still on disk.
    ///
    /// A compiler failure aborts before the final artifact is touched.
    /// A copy or patcher failure leaves the unpatched host copy behind but
    /// discards the fresh blob, so the next run embeds again.
    pub fn assemble(&self, workspace: &Path, host_binary: &Path) -> Result<Assembly> {
        let blob = workspace.join(BLOB_FILE);
        let artifact = workspace.join(ARTIFACT_FILE);

        let previous = checksum::digest_if_exists(&blob)?;
        debug!(previous = ?previous.as_ref().map(ContentDigest::as_str), "previous blob digest");

        BlobBuilder::new(self.compiler).build(workspace, &BuildConfig::default())?;

        let current = checksum::digest(&blob)?;

        if !should_embed(previous.as_ref(), &current, artifact.is_file()) {
            info!(digest = %current, "blob unchanged, skipping embed");
            return Ok(Assembly {
                rebuilt: false,
                previous,
                current,
            });
        }

        if let Err(err) = self.embed(workspace, host_binary, &artifact) {
            discard_blob(&blob);
            return Err(err);
        }

        info!(digest = %current, artifact = %artifact.display(), "embedded blob");

        Ok(Assembly {
            rebuilt: true,
            previous,
            current,
        })
    }

    fn embed(&self, workspace: &Path, host_binary: &Path, artifact: &Path) -> Result<()> {
        fs::copy(host_binary, artifact).map_err(|e| {
            Error::io(
                format!(
                    "failed to copy host binary {} to {}",
                    host_binary.display(),
                    artifact.display()
                ),
                e,
            )
        })?;

        self.patcher.patch(
            workspace,
            &PatchRequest {
                artifact: ARTIFACT_FILE,
                resource_id: RESOURCE_ID,
                blob: BLOB_FILE,
                sentinel: SENTINEL_FUSE,
            },
        )
    }
}

/// Drop the blob after a failed embed so its digest cannot match next time.
fn discard_blob(blob: &Path) {
    match fs::remove_file(blob) {
        Ok(()) => debug!(blob = %blob.display(), "discarded blob after failed embed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(blob = %blob.display(), "cannot discard blob after failed embed: {e}"),
    }
}
