use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Supplies the snapshot images under review.
pub trait SnapshotSource: Send + Sync {
    /// Snapshot paths changed between baseline and candidate.
    fn list_snapshots(&self) -> Result<Vec<String>>;

    /// `None` when the snapshot did not exist in the baseline.
    fn read_baseline(&self, path: &str) -> Result<Option<Vec<u8>>>;

    fn read_candidate(&self, path: &str) -> Result<Vec<u8>>;
}

/// Two checked-out trees on disk, one per ref.
pub struct DirSource {
    baseline_root: PathBuf,
    candidate_root: PathBuf,
    snapshots_dir: String,
}

impl DirSource {
    pub fn new(baseline_root: impl Into<PathBuf>, candidate_root: impl Into<PathBuf>, snapshots_dir: impl Into<String>) -> Self {
        Self {
            baseline_root: baseline_root.into(),
            candidate_root: candidate_root.into(),
            snapshots_dir: snapshots_dir.into(),
        }
    }

    fn is_changed(&self, path: &str) -> Result<bool> {
        let baseline = match self.read_baseline(path)? {
            Some(bytes) => bytes,
            None => return Ok(true),
        };
        Ok(baseline != self.read_candidate(path)?)
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

impl SnapshotSource for DirSource {
    fn list_snapshots(&self) -> Result<Vec<String>> {
        // glob hands back paths in the form of the pattern, so match against
        // the canonical root to strip it off reliably
        let root = self
            .candidate_root
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", self.candidate_root.display()))?;
        let pattern = format!("{}/**/*.png", glob::Pattern::escape(&root.to_string_lossy()));

        let mut paths = Vec::new();
        for entry in glob::glob(&pattern)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry {}: {}", e.path().display(), e.error());
                    continue;
                }
            };
            let Some(path) = relative_path(&root, &entry) else {
                continue;
            };
            if !path.starts_with(&self.snapshots_dir) {
                continue;
            }
            if self.is_changed(&path)? {
                paths.push(path);
            } else {
                log::debug!("{} unchanged, skipping", path);
            }
        }

        log::info!("Found {} changed snapshots", paths.len());
        Ok(paths)
    }

    fn read_baseline(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full_path = self.baseline_root.join(path);
        if !full_path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&full_path)
            .with_context(|| format!("Failed to read baseline {}", full_path.display()))?;
        Ok(Some(bytes))
    }

    fn read_candidate(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.candidate_root.join(path);
        std::fs::read(&full_path).with_context(|| format!("Failed to read candidate {}", full_path.display()))
    }
}
