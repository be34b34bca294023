use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{ReviewConfig, ReviewSummary, SnapshotReport, SnapshotStatus};
use crate::common::get_current_timestamp_str;

/// Consumes review results and decides where and how they are kept.
pub trait ResultSink: Send {
    fn record(&mut self, report: &SnapshotReport) -> Result<()>;

    fn finish(&mut self, summary: &ReviewSummary) -> Result<()>;
}

/// Writes one directory per story under `diff_dir`, each holding the diff
/// (or new) images and a README, plus an index README at the top.
pub struct DirSink {
    config: ReviewConfig,
    /// Story id -> whether the story holds a new snapshot.
    stories: BTreeMap<String, bool>,
}

impl DirSink {
    /// Clears any previous output in the configured diff directory. Fails
    /// instead when that directory holds the working directory or any of
    /// `protected`, e.g. the checkouts being reviewed.
    pub fn new(config: ReviewConfig, protected: &[&Path]) -> Result<Self> {
        let diff_dir = &config.diff_dir;
        if diff_dir.exists() {
            ensure_safe_to_clear(diff_dir, protected)?;
            std::fs::remove_dir_all(diff_dir)
                .with_context(|| format!("Failed to clear {}", diff_dir.display()))?;
        }
        std::fs::create_dir_all(diff_dir)
            .with_context(|| format!("Failed to create {}", diff_dir.display()))?;

        Ok(Self {
            config,
            stories: BTreeMap::new(),
        })
    }

    fn story_dir(&self, story_id: &str) -> PathBuf {
        self.config.diff_dir.join(story_id)
    }

    fn write_artifact(&mut self, report: &SnapshotReport, file_name: String, is_new: bool) -> Result<()> {
        let Some(bytes) = &report.artifact else {
            log::warn!("No image to write for {}", report.path);
            return Ok(());
        };

        let dir = self.story_dir(&report.story_id);
        std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(file_name);
        std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {}", path.display());

        *self.stories.entry(report.story_id.clone()).or_insert(false) |= is_new;
        Ok(())
    }

    fn story_readme(&self, story_id: &str) -> String {
        let mut lines = vec![format!("# {}", story_id)];
        if self.config.branch_name.is_some() {
            lines.push(String::new());
            lines.push(format!(
                "[View in storybook](https://raw.githack.com/{}/PR-{}-sb/index.html?path=/story/{})",
                self.config.review_repo_remote_path,
                self.config.pr_number.map(|pr| pr.to_string()).unwrap_or_default(),
                story_id
            ));
        }
        lines.join("\n")
    }

    fn index_readme(&self, summary: &ReviewSummary) -> String {
        let title = match (&self.config.branch_name, self.config.pr_link()) {
            (Some(branch), Some(link)) => format!("# Image snapshot diff files for [{}]({})", branch, link),
            (Some(branch), None) => format!("# Image snapshot diff files for {}", branch),
            _ => "# Image snapshot diff files".to_string(),
        };
        let mut lines = vec![title, String::new(), format!("Generated {}", get_current_timestamp_str()), String::new()];

        let link = |story_id: &String| format!("- [{}](./{})", story_id, story_id);
        let new_stories: Vec<_> = self.stories.iter().filter(|(_, is_new)| **is_new).map(|(id, _)| link(id)).collect();
        let updated_stories: Vec<_> = self.stories.iter().filter(|(_, is_new)| !**is_new).map(|(id, _)| link(id)).collect();

        if !new_stories.is_empty() {
            lines.push("## New snapshots".to_string());
            lines.extend(new_stories);
            lines.push(String::new());
        }

        if !updated_stories.is_empty() {
            lines.push("## Updated snapshots".to_string());
            lines.extend(updated_stories);
            lines.push(String::new());
        }

        let failures: Vec<_> = summary
            .failed_snapshots()
            .filter_map(|report| match &report.status {
                SnapshotStatus::Failed { error } => Some(format!("- `{}`: {}", report.path, error)),
                _ => None,
            })
            .collect();
        if !failures.is_empty() {
            lines.push("## Failed snapshots".to_string());
            lines.extend(failures);
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

fn ensure_safe_to_clear(diff_dir: &Path, protected: &[&Path]) -> Result<()> {
    let diff_dir = diff_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", diff_dir.display()))?;
    let current_dir = std::env::current_dir()?;

    for path in std::iter::once(current_dir.as_path()).chain(protected.iter().copied()) {
        let Ok(path) = path.canonicalize() else {
            continue;
        };
        if path.starts_with(&diff_dir) {
            anyhow::bail!(
                "Refusing to clear {}: it contains {}",
                diff_dir.display(),
                path.display()
            );
        }
    }
    Ok(())
}

impl ResultSink for DirSink {
    fn record(&mut self, report: &SnapshotReport) -> Result<()> {
        match &report.status {
            SnapshotStatus::New => self.write_artifact(report, format!("{}-new.png", report.identifier), true),
            SnapshotStatus::Updated { pixel_count } => {
                log::info!("{}: {} pixels differ", report.path, pixel_count);
                self.write_artifact(report, format!("{}-diff.png", report.identifier), false)
            }
            SnapshotStatus::Unchanged => {
                log::debug!("{}: no visual change", report.path);
                Ok(())
            }
            SnapshotStatus::Failed { error } => {
                log::error!("{}: {}", report.path, error);
                Ok(())
            }
        }
    }

    fn finish(&mut self, summary: &ReviewSummary) -> Result<()> {
        for story_id in self.stories.keys() {
            let path = self.story_dir(story_id).join("README.md");
            std::fs::write(&path, self.story_readme(story_id))
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        let path = self.config.diff_dir.join("README.md");
        std::fs::write(&path, self.index_readme(summary))
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!(
            "Wrote {} stories to {}",
            self.stories.len(),
            self.config.diff_dir.display()
        );
        Ok(())
    }
}
