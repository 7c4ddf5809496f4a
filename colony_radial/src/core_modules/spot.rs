// THEORY:
// A `Spot` is the most fundamental unit of the analysis: one detected object in
// one frame of one imaging file. It is a "dumb" data container. It knows its
// position and, when the tracker exported it, its acquisition time or frame
// number. It has no knowledge of the links (edges) that connect it to other
// spots, nor of the colony it belongs to beyond its `File_ID` key.
//
// The serde renames mirror the TrackMate column names so that prepared tables
// can be read and written without a translation layer.

use serde::{Deserialize, Serialize};

/// One detected object at a point in time and space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    /// Replicate/acquisition identity shared by every row of one imaging run.
    #[serde(rename = "File_ID")]
    pub file_id: String,
    /// Experimental group label (e.g. `Wildtype`, `Control`), when tagged upstream.
    #[serde(rename = "Group", default)]
    pub group: Option<String>,
    /// Object identifier, unique within a `File_ID`.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Planar position in µm.
    #[serde(rename = "POSITION_X")]
    pub position_x: f64,
    #[serde(rename = "POSITION_Y")]
    pub position_y: f64,
    /// Acquisition time in seconds, if the export carried it.
    #[serde(rename = "POSITION_T", default)]
    pub position_t: Option<f64>,
    /// Frame index, used when `POSITION_T` is unavailable.
    #[serde(rename = "FRAME", default)]
    pub frame: Option<i64>,
    /// Acquisition time in hours with the replicate offset applied.
    #[serde(rename = "SPOT_TIME", default)]
    pub spot_time: Option<f64>,
}

impl Spot {
    pub fn new(file_id: impl Into<String>, id: i64, position_x: f64, position_y: f64) -> Self {
        Self {
            file_id: file_id.into(),
            group: None,
            id,
            position_x,
            position_y,
            position_t: None,
            frame: None,
            spot_time: None,
        }
    }

    pub fn with_time(mut self, seconds: f64) -> Self {
        self.position_t = Some(seconds);
        self
    }

    pub fn with_frame(mut self, frame: i64) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn position(&self) -> (f64, f64) {
        (self.position_x, self.position_y)
    }
}
