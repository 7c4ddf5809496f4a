use crate::loader::Track;
use crate::summary::SummaryRow;
use anyhow::{Context, Result};
use colony_radial::pipeline::{Edge, ProcessedEdge, Spot};
use csv::WriterBuilder;
use log::info;
use serde::Serialize;
use std::path::Path;

/// A row type persisted as CSV. `COLUMNS` is the header written when a table
/// has no rows, and must match the serialized field names in order.
pub trait CsvTable: Serialize {
    const COLUMNS: &'static [&'static str];
}

impl CsvTable for Spot {
    const COLUMNS: &'static [&'static str] = &[
        "File_ID", "Group", "ID", "POSITION_X", "POSITION_Y", "POSITION_T", "FRAME", "SPOT_TIME",
    ];
}

impl CsvTable for Edge {
    const COLUMNS: &'static [&'static str] =
        &["File_ID", "Group", "SPOT_SOURCE_ID", "SPOT_TARGET_ID", "EDGE_TIME", "SPEED"];
}

impl CsvTable for Track {
    const COLUMNS: &'static [&'static str] = &[
        "File_ID",
        "Group",
        "TRACK_ID",
        "TRACK_START",
        "TRACK_STOP",
        "TRACK_DURATION",
        "TRACK_START_HOURS",
        "TRACK_STOP_HOURS",
        "TRACK_DURATION_HOURS",
    ];
}

impl CsvTable for ProcessedEdge {
    const COLUMNS: &'static [&'static str] = &[
        "File_ID",
        "Group",
        "SPOT_SOURCE_ID",
        "SPOT_TARGET_ID",
        "EDGE_TIME",
        "SPEED",
        "u",
        "v",
        "source_x",
        "source_y",
        "target_x",
        "target_y",
        "elapsed_minutes",
        "radial_distance",
        "radial_velocity",
        "radial_velocity_theta",
        "center_x",
        "center_y",
        "radial_persistence",
    ];
}

impl CsvTable for SummaryRow {
    const COLUMNS: &'static [&'static str] = &[
        "Group",
        "EDGE_TIME_BINNED",
        "n",
        "radial_velocity_mean",
        "radial_velocity_sem",
        "radial_persistence_mean",
        "radial_persistence_sem",
        "speed_mean",
        "speed_sem",
    ];
}

/// Writes `rows` as a headed CSV table, replacing any existing file.
///
/// An empty table still gets its header row.
pub fn write_csv<T: CsvTable>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    // Serde only emits a header along with the first row.
    let mut writer = WriterBuilder::new()
        .has_headers(!rows.is_empty())
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    if rows.is_empty() {
        writer
            .write_record(T::COLUMNS)
            .with_context(|| format!("writing header to {}", path.display()))?;
    }
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing row to {}", path.display()))?;
    }
    writer.flush().with_context(|| format!("flushing {}", path.display()))?;
    info!("Saved {} rows to {}", rows.len(), path.display());
    Ok(())
}
