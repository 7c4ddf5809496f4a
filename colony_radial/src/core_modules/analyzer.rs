// THEORY:
// The `analyzer` module is the orchestrator of the engine. It turns the combined
// spot and edge tables into one processed-edge table, one imaging file at a
// time.
//
// Key architectural principles:
// 1.  **Per-file reference frame**: every file gets its own dynamic center,
//     computed from that file's spots only, before any of its edges are touched.
// 2.  **Borrowed input**: the analyzer holds shared references to the caller's
//     tables. Output rows are new records; the input is never written to.
// 3.  **Observable skips**: every dropped edge is counted per reason, and files
//     without spots or edges are reported as `EmptyGroup` instead of failing
//     the batch.
// 4.  **Deterministic order**: files are enumerated in an explicit `FileOrder`
//     and rows keep their table order within a file.

use crate::core_modules::centroid::DynamicCenter;
use crate::core_modules::edge::Edge;
use crate::core_modules::file_group::{FileGroup, FilePartition};
use crate::core_modules::persistence::derive_radial_persistence;
use crate::core_modules::radial::{ProcessedEdge, decompose_edge};
use crate::core_modules::skip::{SkipReason, SkipTally};
use crate::core_modules::spot::Spot;
use crate::pipeline::RadialConfig;
use log::{debug, info, warn};

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Center computed and edges decomposed (possibly all skipped).
    Processed,
    /// The file had no spots or no usable edges.
    EmptyGroup,
}

/// The result of processing a single file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_id: String,
    pub outcome: FileOutcome,
    pub center: Option<DynamicCenter>,
    pub edges: Vec<ProcessedEdge>,
    pub skips: SkipTally,
}

impl FileReport {
    fn empty(file_id: &str, center: Option<DynamicCenter>, skips: SkipTally) -> Self {
        Self {
            file_id: file_id.to_string(),
            outcome: FileOutcome::EmptyGroup,
            center,
            edges: Vec::new(),
            skips,
        }
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            file_id: self.file_id.clone(),
            outcome: self.outcome,
            center: self.center,
            retained: self.edges.len(),
            skips: self.skips,
        }
    }
}

/// Per-file bookkeeping kept in the batch report once rows are concatenated.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub file_id: String,
    pub outcome: FileOutcome,
    pub center: Option<DynamicCenter>,
    pub retained: usize,
    pub skips: SkipTally,
}

/// The result of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct RadialReport {
    /// Concatenated rows of every file, file order then row order.
    pub edges: Vec<ProcessedEdge>,
    pub files: Vec<FileSummary>,
    pub skips: SkipTally,
    /// Edges whose `File_ID` never appears in the spot table.
    pub orphan_edges: usize,
}

impl RadialReport {
    /// Concatenates per-file reports in the order given.
    pub fn from_file_reports(reports: Vec<FileReport>, orphan_edges: usize) -> Self {
        let mut report = RadialReport {
            orphan_edges,
            ..Default::default()
        };
        for file in reports {
            report.skips.merge(&file.skips);
            report.files.push(file.summary());
            report.edges.extend(file.edges);
        }
        report
    }

    /// No file produced a single row.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn empty_groups(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.outcome == FileOutcome::EmptyGroup)
            .count()
    }
}

/// Computes the center of `group` and decomposes each of its edges.
pub fn process_group(group: &FileGroup<'_>, config: &RadialConfig) -> FileReport {
    let mut skips = SkipTally::default();

    let edges: Vec<&Edge> = group
        .edges
        .iter()
        .copied()
        .filter(|edge| {
            if edge.is_sentinel() {
                skips.record(SkipReason::SentinelEdge);
                false
            } else {
                true
            }
        })
        .collect();

    let center = match DynamicCenter::from_spots(group.spots.iter().copied()) {
        Some(center) if !edges.is_empty() => center,
        center => {
            warn!("File {}: no spots or no edges, skipping", group.file_id);
            return FileReport::empty(group.file_id, center, skips);
        }
    };
    info!(
        "File {}: dynamic center ({:.2}, {:.2})",
        group.file_id, center.x, center.y
    );

    let index = group.spot_index();
    if index.duplicates() > 0 {
        debug!(
            "File {}: {} spot rows reuse an ID, first row kept",
            group.file_id,
            index.duplicates()
        );
    }

    let mut processed = Vec::with_capacity(edges.len());
    for edge in edges {
        let Some(source) = index.get(edge.spot_source_id) else {
            skips.record(SkipReason::MissingSource);
            continue;
        };
        let Some(target) = index.get(edge.spot_target_id) else {
            skips.record(SkipReason::MissingTarget);
            continue;
        };
        match decompose_edge(edge, source, target, center, config.frame_interval_seconds) {
            Ok(row) => processed.push(row),
            Err(reason) => skips.record(reason),
        }
    }

    debug!(
        "File {}: {} edges retained, {}",
        group.file_id,
        processed.len(),
        skips
    );

    FileReport {
        file_id: group.file_id.to_string(),
        outcome: FileOutcome::Processed,
        center: Some(center),
        edges: processed,
        skips,
    }
}

/// Runs the radial analysis over borrowed spot and edge tables.
pub struct RadialAnalyzer<'a> {
    spot_table: &'a [Spot],
    edge_table: &'a [Edge],
    config: RadialConfig,
}

impl<'a> RadialAnalyzer<'a> {
    pub fn new(spot_table: &'a [Spot], edge_table: &'a [Edge], config: RadialConfig) -> Self {
        Self {
            spot_table,
            edge_table,
            config,
        }
    }

    /// Processes a single `File_ID`.
    pub fn process_file(&self, file_id: &str) -> FileReport {
        let group = FileGroup::select(file_id, self.spot_table, self.edge_table);
        process_group(&group, &self.config)
    }

    /// Processes every file of the spot table and concatenates the results.
    pub fn process_all_files(&self) -> RadialReport {
        let partition = FilePartition::new(self.spot_table, self.edge_table, self.config.file_order);
        let orphan_edges = partition.orphan_edges();
        if orphan_edges > 0 {
            warn!("{} edges reference a File_ID with no spots", orphan_edges);
        }

        let reports = partition
            .groups()
            .iter()
            .map(|group| process_group(group, &self.config))
            .collect();
        let report = RadialReport::from_file_reports(reports, orphan_edges);
        if report.is_empty() {
            warn!("No edge data produced by the radial analysis");
        }
        report
    }

    /// Adds `radial_persistence` to already processed rows.
    pub fn calculate_radial_persistence(&self, edges: &mut [ProcessedEdge]) {
        derive_radial_persistence(edges);
    }
}
