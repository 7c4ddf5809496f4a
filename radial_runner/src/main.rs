use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use colony_radial::pipeline::{FileOrder, RadialConfig};
use log::{info, warn};
use radial_runner::summary::DEFAULT_BIN_HOURS;
use radial_runner::tracking_pipeline::{Execution, TrackingPipeline};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// `offset_*/{spots,edges,tracks}` folders, one colony group.
    Wildtype,
    /// `offset_*/<group>/{spots,edges,tracks}` folders.
    TreatmentControl,
    /// Wildtype layout, engine run replicate by replicate.
    PerReplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Order {
    FirstAppearance,
    Lexicographic,
}

impl From<Order> for FileOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::FirstAppearance => FileOrder::FirstAppearance,
            Order::Lexicographic => FileOrder::Lexicographic,
        }
    }
}

/// Radial motion analysis of TrackMate exports.
#[derive(Parser, Debug)]
#[command(name = "radial_runner", version, about)]
struct Cli {
    /// Folder containing the `offset_*` replicate folders
    #[arg(long, env = "BASE_PATH")]
    base_path: PathBuf,

    /// Folder receiving the CSV results
    #[arg(long, env = "PICKLES_PATH")]
    output_path: PathBuf,

    #[arg(long, value_enum, default_value = "wildtype")]
    mode: Mode,

    /// Seconds between frames, used when spots carry no POSITION_T
    #[arg(long, default_value_t = colony_radial::pipeline::DEFAULT_FRAME_INTERVAL_SECONDS)]
    frame_interval_seconds: f64,

    #[arg(long, value_enum, default_value = "first-appearance")]
    file_order: Order,

    /// Width of the EDGE_TIME bins of the summary, hours
    #[arg(long, default_value_t = DEFAULT_BIN_HOURS)]
    bin_hours: f64,

    /// Spread files over a worker pool
    #[arg(long)]
    parallel: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --- 1. Argument Parsing & Setup ---
    let cli = Cli::parse();
    if !(cli.bin_hours.is_finite() && cli.bin_hours > 0.0) {
        bail!("--bin-hours must be positive, got {}", cli.bin_hours);
    }
    let config = RadialConfig {
        frame_interval_seconds: cli.frame_interval_seconds,
        file_order: cli.file_order.into(),
    };
    config.validate()?;

    let execution = if cli.parallel { Execution::Parallel } else { Execution::Sequential };
    let pipeline = TrackingPipeline::new(&cli.base_path, &cli.output_path, config).with_execution(execution);
    info!(
        "Running {:?} analysis on {} into {}",
        cli.mode,
        cli.base_path.display(),
        pipeline.output_path().display()
    );

    // --- 2. Loading & Radial Analysis ---
    let edges = match cli.mode {
        Mode::Wildtype => {
            let tables = pipeline.run_wildtype()?;
            pipeline.run_radial_analysis_combined(&tables).await?.edges
        }
        Mode::TreatmentControl => {
            let tables = pipeline.run_treatment_control()?;
            pipeline.run_radial_analysis_combined(&tables).await?.edges
        }
        Mode::PerReplicate => pipeline.run_radial_analysis_all().await?,
    };

    // --- 3. Summary ---
    if edges.is_empty() {
        warn!("No radial edges produced, summary skipped");
        return Ok(());
    }
    let summary = pipeline.summarize(&edges, cli.bin_hours)?;
    info!("Wrote {} summary rows", summary.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "radial_runner",
            "--base-path",
            "/data",
            "--output-path",
            "/out",
            "--mode",
            "treatment-control",
            "--file-order",
            "lexicographic",
            "--parallel",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::TreatmentControl);
        assert_eq!(FileOrder::from(cli.file_order), FileOrder::Lexicographic);
        assert_eq!(cli.frame_interval_seconds, 600.0);
        assert_eq!(cli.bin_hours, 0.5);
        assert!(cli.parallel);
    }
}
