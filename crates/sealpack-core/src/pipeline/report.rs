use serde::Serialize;

use super::state::State;
use crate::TOOL_NAME;
use crate::checksum::ContentDigest;

/// Summary of a successful pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub rebuilt: bool,
    pub registered: bool,
    pub previous_digest: Option<String>,
    pub digest: String,
    pub exit_code: i32,
    /// Every state visited, starting at `Idle`.
    pub states: Vec<State>,
}

impl PipelineReport {
    pub(crate) fn new(previous: Option<&ContentDigest>, current: &ContentDigest) -> Self {
        Self {
            rebuilt: false,
            registered: false,
            previous_digest: previous.map(|d| d.to_string()),
            digest: current.to_string(),
            exit_code: 0,
            states: Vec::new(),
        }
    }
}

/// One-line human summary, e.g. `sealpack: skipped embed (blob 1a2b3c4d…), artifact exited 0`.
pub fn render_summary(report: &PipelineReport) -> String {
    let action = if report.rebuilt {
        "rebuilt and registered artifact"
    } else {
        "skipped embed"
    };
    let short = report.digest.get(..12).unwrap_or(&report.digest);

    format!(
        "{TOOL_NAME}: {action} (blob {short}), artifact exited {}",
        report.exit_code
    )
}
