//! Build steps that produce the final artifact.
//!
//! - `stage`    → write the staged script with its bootstrap preamble
//! - `blob`     → write the build config and compile the blob
//! - `decision` → pure rule deciding whether to embed
//! - `assemble` → digest comparison and conditional embedding

pub mod assemble;
pub mod blob;
pub mod decision;
pub mod stage;

pub use assemble::{Assembler, Assembly};
pub use blob::{BlobBuilder, BuildConfig};
pub use decision::should_embed;
pub use stage::{BootstrapConfig, stage};
