use std::sync::Arc;

use anyhow::{Context, Result};

use super::{ResultSink, ReviewConfig, ReviewSummary, SnapshotReport, SnapshotSource, SnapshotStatus};
use crate::diff::{compare_with_options, DiffOptions};

/// File stem of a snapshot path with the snapshot suffix and anything after
/// it removed: `a/button-snap.png` -> `button`.
pub fn snapshot_identifier(path: &str, suffix: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    match stem.split_once(suffix) {
        Some((identifier, _)) if !suffix.is_empty() => identifier.to_string(),
        _ => stem.to_string(),
    }
}

/// Directory grouping a snapshot, relative to the snapshots dir. Snapshots
/// stored directly in the snapshots dir form a story of their own.
pub fn story_id(path: &str, snapshots_dir: &str, suffix: &str) -> String {
    let relative = path.strip_prefix(snapshots_dir).unwrap_or(path);
    let relative = relative.trim_start_matches('/');
    match relative.rsplit_once('/') {
        Some((dir, _)) => dir.rsplit('/').next().unwrap_or(dir).to_string(),
        None => snapshot_identifier(relative, suffix),
    }
}

fn review_snapshot(source: &dyn SnapshotSource, path: String, options: &DiffOptions, config: &ReviewConfig) -> Result<SnapshotReport> {
    let story_id = story_id(&path, &config.snapshots_dir, &config.snapshot_suffix);
    let identifier = snapshot_identifier(&path, &config.snapshot_suffix);
    let candidate = source.read_candidate(&path)?;

    let (status, artifact) = match source.read_baseline(&path)? {
        None => {
            log::info!("{} is a new snapshot", path);
            (SnapshotStatus::New, Some(candidate))
        }
        Some(baseline) => match compare_with_options(&baseline, &candidate, options) {
            Ok(result) if result.has_differences() => (
                SnapshotStatus::Updated {
                    pixel_count: result.pixel_count(),
                },
                Some(result.into_buffer()),
            ),
            Ok(_) => (SnapshotStatus::Unchanged, None),
            Err(e) => {
                log::error!("Failed to compare {}: {}", path, e);
                (SnapshotStatus::Failed { error: e.to_string() }, None)
            }
        },
    };

    Ok(SnapshotReport {
        path,
        story_id,
        identifier,
        status,
        artifact,
    })
}

/// Compares every changed snapshot from `source`, in parallel, and hands the
/// reports to `sink` in listing order.
pub async fn review_snapshots(
    source: Arc<dyn SnapshotSource>,
    sink: &mut dyn ResultSink,
    config: &ReviewConfig,
) -> Result<ReviewSummary> {
    let options = config.diff_options()?;

    let paths = {
        let source = source.clone();
        tokio::task::spawn_blocking(move || source.list_snapshots()).await??
    };
    log::info!("Reviewing {} snapshots", paths.len());

    let tasks: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let source = source.clone();
            let options = options.clone();
            let config = config.clone();
            tokio::task::spawn_blocking(move || review_snapshot(source.as_ref(), path, &options, &config))
        })
        .collect();

    let mut summary = ReviewSummary::default();
    for (i, task) in tasks.into_iter().enumerate() {
        let report = task.await.with_context(|| format!("Review task {} failed", i))??;
        sink.record(&report)?;
        summary.push(report);
    }

    sink.finish(&summary)?;
    Ok(summary)
}
