use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::common::DiffError;
use crate::diff::DiffOptions;

/// Everything the review needs to know up front; built once at startup and
/// passed down instead of being read from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Path prefix under which snapshot images live, e.g. `"snapshots/"`.
    pub snapshots_dir: String,
    pub diff_dir: PathBuf,
    pub snapshot_suffix: String,
    pub branch_name: Option<String>,
    pub pr_number: Option<u64>,
    pub origin_url: Option<String>,
    pub review_repo_remote_path: String,
    pub threshold: f64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            snapshots_dir: String::new(),
            diff_dir: PathBuf::from("./snapshot-diff"),
            snapshot_suffix: "-snap".to_string(),
            branch_name: None,
            pr_number: None,
            origin_url: None,
            review_repo_remote_path: "[STORYBOOK_REMOTE]".to_string(),
            threshold: 0.0,
        }
    }
}

impl ReviewConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn diff_options(&self) -> Result<DiffOptions, DiffError> {
        let options = DiffOptions::with_threshold(self.threshold);
        options.validate()?;
        Ok(options)
    }

    /// Link to the pull request, or to the branch when there is no PR number.
    pub fn pr_link(&self) -> Option<String> {
        let origin = self.origin_url.as_deref()?;
        let origin = origin.split(".git").next().unwrap_or(origin);
        match (self.pr_number, &self.branch_name) {
            (Some(pr), _) => Some(format!("{}/pull/{}", origin, pr)),
            (None, Some(branch)) => Some(format!("{}/tree/{}", origin, branch)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// No baseline exists; the differ was not run.
    New,
    Updated { pixel_count: u64 },
    Unchanged,
    /// The comparison itself failed, e.g. a malformed image.
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReport {
    pub path: String,
    pub story_id: String,
    pub identifier: String,
    #[serde(flatten)]
    pub status: SnapshotStatus,
    /// Diff PNG for updated snapshots, the candidate PNG for new ones.
    #[serde(skip)]
    pub artifact: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewSummary {
    pub snapshots: Vec<SnapshotReport>,
}

impl ReviewSummary {
    pub fn push(&mut self, report: SnapshotReport) {
        self.snapshots.push(report);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn with_status<'a>(&'a self, matches: impl Fn(&SnapshotStatus) -> bool + 'a) -> impl Iterator<Item = &'a SnapshotReport> + 'a {
        self.snapshots.iter().filter(move |report| matches(&report.status))
    }

    pub fn new_snapshots(&self) -> impl Iterator<Item = &SnapshotReport> {
        self.with_status(|status| matches!(status, SnapshotStatus::New))
    }

    pub fn updated_snapshots(&self) -> impl Iterator<Item = &SnapshotReport> {
        self.with_status(|status| matches!(status, SnapshotStatus::Updated { .. }))
    }

    pub fn failed_snapshots(&self) -> impl Iterator<Item = &SnapshotReport> {
        self.with_status(|status| matches!(status, SnapshotStatus::Failed { .. }))
    }

    /// Errors naming every snapshot whose comparison failed.
    pub fn ensure_no_failures(&self) -> anyhow::Result<()> {
        let failed: Vec<_> = self.failed_snapshots().map(|report| report.path.as_str()).collect();
        if !failed.is_empty() {
            anyhow::bail!("{} snapshots failed to compare: {}", failed.len(), failed.join(", "));
        }
        Ok(())
    }
}
