//! Embedding decision.
//!
//! The whole cost-avoidance rule of the pipeline:
//!
//!   - no previous blob             → embed
//!   - no final artifact on disk    → embed
//!   - previous digest ≠ new digest → embed
//!   - previous digest = new digest → skip
//!
//! Kept free of I/O so it can be tested on its own.

use crate::checksum::ContentDigest;

/// Whether the freshly built blob must be embedded into a new artifact.
///
/// `artifact_present` reports whether a final artifact from an earlier
/// embed is still on disk; without one there is nothing to keep.
pub fn should_embed(
    previous: Option<&ContentDigest>,
    current: &ContentDigest,
    artifact_present: bool,
) -> bool {
    !artifact_present || previous != Some(current)
}
