use anyhow::Result;
use clap::Parser;
use snapdiff::review::{review_snapshots, DirSink, DirSource, ReviewConfig};
use snapshot_review::common::utils::init_logger_exe;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(version, about = "Write visual diffs for every changed snapshot between two trees", long_about = None)]
struct Cli {
    #[arg(long, help = "checkout of the base branch")]
    baseline_dir: PathBuf,
    #[arg(long, help = "checkout of the branch under review")]
    candidate_dir: PathBuf,
    #[arg(long, help = "JSON file with review settings; flags override it")]
    config: Option<PathBuf>,
    #[arg(long, help = "path prefix of the snapshot images, e.g. snapshots/")]
    snapshots_dir: Option<String>,
    #[arg(long, help = "output directory for the diff tree")]
    diff_dir: Option<PathBuf>,
    #[arg(long)]
    branch_name: Option<String>,
    #[arg(long)]
    pr_number: Option<u64>,
    #[arg(long, help = "repository URL used for links in the README")]
    origin_url: Option<String>,
    #[arg(long, help = "owner/repo hosting the storybook builds")]
    review_repo_remote_path: Option<String>,
    #[arg(long, help = "matching threshold between 0 and 1")]
    threshold: Option<f64>,
    #[arg(long, help = "print the summary as JSON", default_value_t = false)]
    json: bool,
}

impl Cli {
    fn review_config(&self) -> Result<ReviewConfig> {
        let mut config = match &self.config {
            Some(path) => ReviewConfig::from_json_file(path)?,
            None => ReviewConfig::default(),
        };

        if let Some(snapshots_dir) = &self.snapshots_dir {
            config.snapshots_dir = snapshots_dir.clone();
        }
        if let Some(diff_dir) = &self.diff_dir {
            config.diff_dir = diff_dir.clone();
        }
        if self.branch_name.is_some() {
            config.branch_name = self.branch_name.clone();
        }
        if self.pr_number.is_some() {
            config.pr_number = self.pr_number;
        }
        if self.origin_url.is_some() {
            config.origin_url = self.origin_url.clone();
        }
        if let Some(remote) = &self.review_repo_remote_path {
            config.review_repo_remote_path = remote.clone();
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger_exe();
    let cli = Cli::parse();

    let config = cli.review_config()?;
    config.diff_options()?;
    log::info!("Writing snapshot diffs to {}", config.diff_dir.display());

    let source = Arc::new(DirSource::new(
        &cli.baseline_dir,
        &cli.candidate_dir,
        config.snapshots_dir.clone(),
    ));
    let mut sink = DirSink::new(
        config.clone(),
        &[cli.baseline_dir.as_path(), cli.candidate_dir.as_path()],
    )?;

    let summary = review_snapshots(source, &mut sink, &config).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        log::info!(
            "{} new, {} updated, {} failed",
            summary.new_snapshots().count(),
            summary.updated_snapshots().count(),
            summary.failed_snapshots().count()
        );
    }

    summary.ensure_no_failures()?;

    log::info!("Exiting...");
    Ok(())
}
