use anyhow::{Context, Result};
use clap::Parser;
use snapdiff::{compare_with_options, DiffOptions};
use snapshot_review::common::utils::init_logger_exe;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about = "Compare two PNG snapshots and write a visual diff", long_about = None)]
struct Cli {
    #[arg(long, help = "baseline (reference) image in PNG format")]
    baseline: PathBuf,
    #[arg(long, help = "candidate image in PNG format")]
    candidate: PathBuf,
    #[arg(long, help = "where to write the diff image")]
    output: Option<PathBuf>,
    #[arg(
        long,
        help = "matching threshold between 0 and 1, 0 requires exact equality",
        default_value_t = 0.0
    )]
    threshold: f64,
    #[arg(long, help = "ignore pixels that look like anti-aliasing", default_value_t = false)]
    detect_anti_aliasing: bool,
    #[arg(long, help = "draw only the differences on a transparent background", default_value_t = false)]
    diff_mask: bool,
    #[arg(long, help = "print the result as JSON", default_value_t = false)]
    json: bool,
}

fn run(cli: Cli) -> Result<bool> {
    let baseline = std::fs::read(&cli.baseline)
        .with_context(|| format!("Failed to read {}", cli.baseline.display()))?;
    let candidate = std::fs::read(&cli.candidate)
        .with_context(|| format!("Failed to read {}", cli.candidate.display()))?;

    let options = DiffOptions {
        threshold: cli.threshold,
        detect_anti_aliasing: cli.detect_anti_aliasing,
        diff_mask: cli.diff_mask,
        ..Default::default()
    };

    let result = compare_with_options(&baseline, &candidate, &options)?;
    log::info!(
        "{} vs {}: {} pixels differ",
        cli.baseline.display(),
        cli.candidate.display(),
        result.pixel_count()
    );

    if let Some(output) = &cli.output {
        std::fs::write(output, result.buffer())
            .with_context(|| format!("Failed to write {}", output.display()))?;
        log::info!("Saved diff to {}", output.display());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.pixel_count());
    }

    Ok(result.has_differences())
}

fn main() -> ExitCode {
    init_logger_exe();
    let cli = Cli::parse();

    match run(cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
