use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use posture_core::ledger::MergeOutcome;

/// Serialize a POA&M tree for writing to disk. Key order is preserved.
pub fn format_ledger(poam: &Value, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(poam)
    } else {
        serde_json::to_string_pretty(poam)
    };
    json.context("failed to serialize POA&M")
}

/// Counts from one ledger merge, as logged and printed after `generate-poam`.
#[derive(Debug, Serialize)]
pub struct MergeSummary {
    pub total: usize,
    pub created: usize,
    pub carried: usize,
    pub reopened: usize,
    pub closed: usize,
}

impl From<&MergeOutcome> for MergeSummary {
    fn from(outcome: &MergeOutcome) -> Self {
        Self {
            total: outcome.items.len(),
            created: outcome.created,
            carried: outcome.carried,
            reopened: outcome.reopened,
            closed: outcome.closed,
        }
    }
}

impl std::fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} item(s): {} new, {} carried, {} reopened, {} closed",
            self.total, self.created, self.carried, self.reopened, self.closed
        )
    }
}
