//! Run reports written after every lifecycle run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use tfprobe_common::teardown::TeardownOutcome;

use crate::error::HarnessResult;

/// Outcome of one forward phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseOutcome {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full record of one run: forward phases in execution order, then the
/// teardown actions in the order they ran.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub cluster_name: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub phases: Vec<PhaseOutcome>,
    pub teardown: Vec<TeardownOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// Write the report as pretty JSON under `dir` and return the path.
    pub fn write(&self, dir: &Path) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("run-report.json");
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!("run report written to {}", path.display());
        Ok(path)
    }
}
