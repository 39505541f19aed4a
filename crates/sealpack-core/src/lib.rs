pub mod build;
pub mod checksum;
pub mod env;
pub mod error;
pub mod pipeline;
pub mod settings;
pub mod tools;

pub use error::{Error, PipelineError, Result, Stage};

pub const TOOL_NAME: &str = "sealpack";

/// Fixed filenames inside the build workspace.
pub const STAGED_SCRIPT_FILE: &str = "main.bundle.js";
pub const BUILD_CONFIG_FILE: &str = "sea-config.json";
pub const BLOB_FILE: &str = "sea-prep.blob";
pub const ARTIFACT_FILE: &str = "app.exe";

/// Resource identifier the blob is embedded under.
pub const RESOURCE_ID: &str = "NODE_SEA_BLOB";

/// Verification sentinel passed to the patcher.
/// Downstream tooling checks for it to confirm the embedding format version.
pub const SENTINEL_FUSE: &str = "fce680ab2cc467b6e072b8b5df1996b2";
