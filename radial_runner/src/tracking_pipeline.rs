// THEORY:
// The `TrackingPipeline` is the thin glue between the folder layout on disk and
// the radial engine. It knows two layouts:
//
//   wildtype:           <base>/offset_27/{spots,edges,tracks}/*.csv
//   treatment/control:  <base>/offset_27/<group>/{spots,edges,tracks}/*.csv
//
// For each layout it loads every replicate, concatenates the tables, persists
// them, and hands the combined spots and edges to the engine. Failures of a
// single replicate are logged and skipped so one bad folder does not sink a
// whole experiment.

use crate::discovery::{capitalize, discover_group_folders, discover_offsets, parse_offset_hours};
use crate::loader::{BaseDataLoader, DataType, PreparedTables};
use crate::output::write_csv;
use crate::summary::{SummaryRow, summarize};
use anyhow::{Context, Result, bail};
use colony_radial::pipeline::{ProcessedEdge, RadialConfig, RadialReport};
use colony_radial::{ParallelRadialPipeline, RadialPipeline};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

pub const WILDTYPE: &str = "Wildtype";

/// How the radial engine is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Sequential,
    /// Files spread over a tokio worker pool.
    Parallel,
}

pub struct TrackingPipeline {
    base_data_path: PathBuf,
    output_path: PathBuf,
    config: RadialConfig,
    execution: Execution,
}

impl TrackingPipeline {
    pub fn new(base_data_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>, config: RadialConfig) -> Self {
        Self {
            base_data_path: base_data_path.into(),
            output_path: output_path.into(),
            config,
            execution: Execution::Sequential,
        }
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn discover_offsets(&self) -> Result<Vec<PathBuf>> {
        discover_offsets(&self.base_data_path)
    }

    fn require_offsets(&self) -> Result<Vec<PathBuf>> {
        let offsets = self.discover_offsets()?;
        if offsets.is_empty() {
            bail!("No offset folders found in {}", self.base_data_path.display());
        }
        Ok(offsets)
    }

    /// Loads one data type of one replicate.
    pub fn run_single_replicate(&self, offset_folder: &Path, data_type: DataType, group: &str) -> Result<PreparedTables> {
        let folder = if group.eq_ignore_ascii_case(WILDTYPE) {
            offset_folder.join(data_type.as_str())
        } else {
            offset_folder.join(group.to_lowercase()).join(data_type.as_str())
        };
        if !folder.is_dir() {
            bail!("Folder {} does not exist", folder.display());
        }
        let time_offset = parse_offset_hours(offset_folder)?;
        BaseDataLoader::new(folder, capitalize(group), data_type, time_offset).load_all()
    }

    fn save_tables(&self, prefix: &str, tables: &PreparedTables) -> Result<()> {
        write_csv(&self.output_path.join(format!("{prefix}_spots.csv")), &tables.spots)?;
        write_csv(&self.output_path.join(format!("{prefix}_edges.csv")), &tables.edges)?;
        write_csv(&self.output_path.join(format!("{prefix}_tracks.csv")), &tables.tracks)?;
        Ok(())
    }

    /// Loads every wildtype replicate and persists `wildtype_<type>.csv`.
    pub fn run_wildtype(&self) -> Result<PreparedTables> {
        let offsets = self.require_offsets()?;
        let mut combined = PreparedTables::default();
        for data_type in DataType::ALL {
            for offset_folder in &offsets {
                match self.run_single_replicate(offset_folder, data_type, WILDTYPE) {
                    Ok(tables) => combined.extend(tables),
                    Err(e) => error!("Error processing {} for {}: {:#}", offset_folder.display(), data_type, e),
                }
            }
            info!("Loaded {} {} rows", combined.len(data_type), data_type);
        }
        self.save_tables("wildtype", &combined)?;
        Ok(combined)
    }

    /// Loads every group of every replicate and persists `treatment_control_<type>.csv`.
    pub fn run_treatment_control(&self) -> Result<PreparedTables> {
        let offsets = self.require_offsets()?;
        let mut combined = PreparedTables::default();
        for offset_folder in &offsets {
            let groups = match discover_group_folders(offset_folder) {
                Ok(groups) => groups,
                Err(e) => {
                    error!("Error scanning {}: {:#}", offset_folder.display(), e);
                    continue;
                }
            };
            let time_offset = match parse_offset_hours(offset_folder) {
                Ok(hours) => hours,
                Err(e) => {
                    error!("Error processing {}: {:#}", offset_folder.display(), e);
                    continue;
                }
            };
            for (group, folders) in groups {
                for (data_type, folder) in folders {
                    let loader = BaseDataLoader::new(&folder, group.as_str(), data_type, time_offset);
                    match loader.load_all() {
                        Ok(tables) => combined.extend(tables),
                        Err(e) => error!("Error processing {} for {} {}: {:#}", folder.display(), group, data_type, e),
                    }
                }
            }
        }
        self.save_tables("treatment_control", &combined)?;
        Ok(combined)
    }

    async fn analyze(&self, tables: &PreparedTables) -> Result<RadialReport> {
        let report = match self.execution {
            Execution::Sequential => RadialPipeline::new(self.config.clone())?.run(&tables.spots, &tables.edges),
            Execution::Parallel => {
                ParallelRadialPipeline::new(self.config.clone())?
                    .run(&tables.spots, &tables.edges)
                    .await?
            }
        };
        info!(
            "Radial analysis: {} edges from {} files, {}",
            report.edges.len(),
            report.files.len(),
            report.skips
        );
        Ok(report)
    }

    /// Runs the engine over already combined tables and persists `radial_edges.csv`.
    pub async fn run_radial_analysis_combined(&self, tables: &PreparedTables) -> Result<RadialReport> {
        let report = self.analyze(tables).await?;
        let save_path = self.output_path.join("radial_edges.csv");
        write_csv(&save_path, &report.edges).context("saving radial edges")?;
        info!("Final radial processed data saved to {}", save_path.display());
        Ok(report)
    }

    /// Loads spots and edges of one wildtype replicate and runs the engine on them.
    pub async fn run_radial_analysis(&self, offset_folder: &Path) -> Result<RadialReport> {
        let mut tables = self.run_single_replicate(offset_folder, DataType::Spots, WILDTYPE)?;
        tables.extend(self.run_single_replicate(offset_folder, DataType::Edges, WILDTYPE)?);
        self.analyze(&tables).await
    }

    /// Runs the engine replicate by replicate and persists the concatenation.
    pub async fn run_radial_analysis_all(&self) -> Result<Vec<ProcessedEdge>> {
        let mut all_edges = Vec::new();
        for offset_folder in self.discover_offsets()? {
            info!("Processing radial analysis for replicate from folder: {}", offset_folder.display());
            match self.run_radial_analysis(&offset_folder).await {
                Ok(report) => all_edges.extend(report.edges),
                Err(e) => error!("Error processing {} for radial analysis: {:#}", offset_folder.display(), e),
            }
        }
        if all_edges.is_empty() {
            warn!("No edge data processed for radial analysis.");
            return Ok(all_edges);
        }
        let save_path = self.output_path.join("radial_edges.csv");
        write_csv(&save_path, &all_edges).context("saving radial edges")?;
        info!("Final radial processed data saved to {}", save_path.display());
        Ok(all_edges)
    }

    /// Bins the processed edges and persists `radial_summary.csv`.
    pub fn summarize(&self, edges: &[ProcessedEdge], bin_hours: f64) -> Result<Vec<SummaryRow>> {
        let summary = summarize(edges, bin_hours);
        write_csv(&self.output_path.join("radial_summary.csv"), &summary).context("saving radial summary")?;
        Ok(summary)
    }
}
