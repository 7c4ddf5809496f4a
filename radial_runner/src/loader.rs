// THEORY:
// The loader is the data-preparation layer in front of the radial engine. It
// reads the CSV exports of one replicate folder and turns them into typed rows
// the engine can consume:
//
// 1.  **Identity**: every row gets a `File_ID` that is unique across replicates,
//     built from the file stem and the replicate folder names, and a `Group`
//     label.
// 2.  **Units**: TrackMate exports seconds; the analysis works in hours since
//     the start of the experiment, so each replicate's imaging start offset is
//     added after conversion.
// 3.  **Coercion**: unparsable numeric cells become `0`, matching how the
//     exports have always been read. Optional columns that are absent stay
//     `None` so the engine can fall back (e.g. `POSITION_T` -> `FRAME`).

use anyhow::{Context, Result, anyhow};
use colony_radial::pipeline::{Edge, Spot};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_MINUTE: f64 = 60.0;
/// TrackMate writes two descriptor rows (short name, unit) under the header.
const DESCRIPTOR_ROWS: usize = 2;

/// The three table kinds a tracking export contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    Spots,
    Edges,
    Tracks,
}

impl DataType {
    pub const ALL: [DataType; 3] = [DataType::Spots, DataType::Edges, DataType::Tracks];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Spots => "spots",
            DataType::Edges => "edges",
            DataType::Tracks => "tracks",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Track-level summary row. Not used by the radial engine; carried through to output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(rename = "File_ID")]
    pub file_id: String,
    #[serde(rename = "Group", default)]
    pub group: Option<String>,
    #[serde(rename = "TRACK_ID")]
    pub track_id: i64,
    #[serde(rename = "TRACK_START")]
    pub track_start: f64,
    #[serde(rename = "TRACK_STOP")]
    pub track_stop: f64,
    #[serde(rename = "TRACK_DURATION")]
    pub track_duration: f64,
    #[serde(rename = "TRACK_START_HOURS")]
    pub track_start_hours: f64,
    #[serde(rename = "TRACK_STOP_HOURS")]
    pub track_stop_hours: f64,
    #[serde(rename = "TRACK_DURATION_HOURS")]
    pub track_duration_hours: f64,
}

/// Spots, edges and tracks of one or more replicates.
#[derive(Debug, Clone, Default)]
pub struct PreparedTables {
    pub spots: Vec<Spot>,
    pub edges: Vec<Edge>,
    pub tracks: Vec<Track>,
}

impl PreparedTables {
    pub fn extend(&mut self, other: PreparedTables) {
        self.spots.extend(other.spots);
        self.edges.extend(other.edges);
        self.tracks.extend(other.tracks);
    }

    pub fn len(&self, data_type: DataType) -> usize {
        match data_type {
            DataType::Spots => self.spots.len(),
            DataType::Edges => self.edges.len(),
            DataType::Tracks => self.tracks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty() && self.edges.is_empty() && self.tracks.is_empty()
    }
}

/// Column lookup over one parsed CSV row.
struct RecordView<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
    path: &'a Path,
}

impl RecordView<'_> {
    fn cell(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .map(|&i| self.record.get(i).unwrap_or(""))
    }

    /// Required numeric column; an unparsable cell reads as `0`.
    fn number(&self, column: &str) -> Result<f64> {
        self.cell(column)
            .map(coerce_number)
            .ok_or_else(|| anyhow!("column {} missing in {}", column, self.path.display()))
    }

    /// Optional numeric column; `None` only when the column does not exist.
    fn optional_number(&self, column: &str) -> Option<f64> {
        self.cell(column).map(coerce_number)
    }

    fn integer(&self, column: &str) -> Result<i64> {
        Ok(self.number(column)? as i64)
    }
}

fn coerce_number(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Loads every CSV of one data-type folder of one replicate.
#[derive(Debug, Clone)]
pub struct BaseDataLoader {
    pub folder: PathBuf,
    pub group_label: String,
    pub data_type: DataType,
    /// Hours between treatment and the start of imaging for this replicate.
    pub time_offset: f64,
}

impl BaseDataLoader {
    pub fn new(folder: impl Into<PathBuf>, group_label: impl Into<String>, data_type: DataType, time_offset: f64) -> Self {
        Self {
            folder: folder.into(),
            group_label: group_label.into(),
            data_type,
            time_offset,
        }
    }

    fn is_wildtype(&self) -> bool {
        self.group_label.eq_ignore_ascii_case("wildtype")
    }

    /// `offset_27` for `offset_27/spots`, `offset_27_control` for
    /// `offset_27/control/spots`.
    pub fn replicate_id(&self) -> Result<String> {
        let group_dir = self
            .folder
            .parent()
            .ok_or_else(|| anyhow!("{} has no parent folder", self.folder.display()))?;
        let group_name = folder_name(group_dir)?;
        if self.is_wildtype() {
            return Ok(group_name);
        }
        let offset_dir = group_dir
            .parent()
            .ok_or_else(|| anyhow!("{} has no offset folder", group_dir.display()))?;
        Ok(format!("{}_{}", folder_name(offset_dir)?, group_name))
    }

    /// `<stem without _<data_type>>_<replicate id>`.
    pub fn file_id(&self, file_path: &Path) -> Result<String> {
        let stem = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("{} has no usable file stem", file_path.display()))?;
        let suffix = format!("_{}", self.data_type);
        let base_id = stem.strip_suffix(&suffix).unwrap_or(stem);
        Ok(format!("{}_{}", base_id, self.replicate_id()?))
    }

    /// CSV files of the folder in path order.
    pub fn csv_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let entries = std::fs::read_dir(&self.folder)
            .with_context(|| format!("reading folder {}", self.folder.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_rows<T>(&self, file_path: &Path, parse: impl Fn(&RecordView<'_>, &str) -> Result<T>) -> Result<Vec<T>> {
        info!("Loading data from {}", file_path.display());
        let file_id = self.file_id(file_path)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(file_path)
            .with_context(|| format!("opening {}", file_path.display()))?;
        let columns: HashMap<String, usize> = reader
            .headers()
            .with_context(|| format!("reading header of {}", file_path.display()))?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();

        let mut rows = Vec::new();
        for record in reader.records().skip(DESCRIPTOR_ROWS) {
            let record = record.with_context(|| format!("parsing {}", file_path.display()))?;
            let view = RecordView {
                columns: &columns,
                record: &record,
                path: file_path,
            };
            rows.push(parse(&view, &file_id)?);
        }
        debug!("{}: {} rows as {}", file_path.display(), rows.len(), file_id);
        Ok(rows)
    }

    fn parse_spot(&self, row: &RecordView<'_>, file_id: &str) -> Result<Spot> {
        let position_t = row.optional_number("POSITION_T");
        Ok(Spot {
            file_id: file_id.to_string(),
            group: Some(self.group_label.clone()),
            id: row.integer("ID")?,
            position_x: row.number("POSITION_X")?,
            position_y: row.number("POSITION_Y")?,
            position_t,
            frame: row.optional_number("FRAME").map(|f| f as i64),
            spot_time: position_t.map(|t| t / SECONDS_PER_HOUR + self.time_offset),
        })
    }

    fn parse_edge(&self, row: &RecordView<'_>, file_id: &str) -> Result<Edge> {
        Ok(Edge {
            file_id: file_id.to_string(),
            group: Some(self.group_label.clone()),
            spot_source_id: row.integer("SPOT_SOURCE_ID")?,
            spot_target_id: row.integer("SPOT_TARGET_ID")?,
            edge_time: row.number("EDGE_TIME")? / SECONDS_PER_HOUR + self.time_offset,
            // µm/s -> µm/min
            speed: row.optional_number("SPEED").map(|s| s * SECONDS_PER_MINUTE),
        })
    }

    fn parse_track(&self, row: &RecordView<'_>, file_id: &str) -> Result<Track> {
        let track_start = row.number("TRACK_START")?;
        let track_stop = row.number("TRACK_STOP")?;
        let track_duration = row.number("TRACK_DURATION")?;
        Ok(Track {
            file_id: file_id.to_string(),
            group: Some(self.group_label.clone()),
            track_id: row.integer("TRACK_ID")?,
            track_start,
            track_stop,
            track_duration,
            track_start_hours: track_start / SECONDS_PER_HOUR + self.time_offset,
            track_stop_hours: track_stop / SECONDS_PER_HOUR + self.time_offset,
            track_duration_hours: track_duration / SECONDS_PER_HOUR,
        })
    }

    /// Loads every CSV of the folder into the table matching `data_type`.
    pub fn load_all(&self) -> Result<PreparedTables> {
        let mut tables = PreparedTables::default();
        for file_path in self.csv_files()? {
            match self.data_type {
                DataType::Spots => tables
                    .spots
                    .extend(self.read_rows(&file_path, |row, id| self.parse_spot(row, id))?),
                DataType::Edges => tables
                    .edges
                    .extend(self.read_rows(&file_path, |row, id| self.parse_edge(row, id))?),
                DataType::Tracks => tables
                    .tracks
                    .extend(self.read_rows(&file_path, |row, id| self.parse_track(row, id))?),
            }
        }
        Ok(tables)
    }
}

fn folder_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{} has no usable folder name", path.display()))
}

/// Runs several loaders (e.g. every replicate of one data type) and concatenates their rows.
#[derive(Debug, Default)]
pub struct CombinedDataLoader {
    loaders: Vec<BaseDataLoader>,
}

impl CombinedDataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_loader(&mut self, loader: BaseDataLoader) {
        self.loaders.push(loader);
    }

    pub fn load_all(&self) -> Result<PreparedTables> {
        let mut combined = PreparedTables::default();
        for loader in &self.loaders {
            combined.extend(loader.load_all()?);
        }
        Ok(combined)
    }
}
