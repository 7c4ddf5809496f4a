use serde::{Deserialize, Serialize};

/// A directed link between two spots of the same file, representing the
/// inferred motion of one tracked object between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "File_ID")]
    pub file_id: String,
    #[serde(rename = "Group", default)]
    pub group: Option<String>,
    #[serde(rename = "SPOT_SOURCE_ID")]
    pub spot_source_id: i64,
    #[serde(rename = "SPOT_TARGET_ID")]
    pub spot_target_id: i64,
    /// Edge time in hours, offset already applied upstream.
    #[serde(rename = "EDGE_TIME")]
    pub edge_time: f64,
    /// Tracker-reported speed in µm/min, when present.
    #[serde(rename = "SPEED", default)]
    pub speed: Option<f64>,
}

impl Edge {
    pub fn new(file_id: impl Into<String>, spot_source_id: i64, spot_target_id: i64, edge_time: f64) -> Self {
        Self {
            file_id: file_id.into(),
            group: None,
            spot_source_id,
            spot_target_id,
            edge_time,
            speed: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// The `0 -> 0` self-link some exports emit as a placeholder row.
    pub fn is_sentinel(&self) -> bool {
        self.spot_source_id == 0 && self.spot_target_id == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_zero_to_zero_is_a_sentinel() {
        assert!(Edge::new("F1", 0, 0, 1.0).is_sentinel());
        assert!(!Edge::new("F1", 0, 4, 1.0).is_sentinel());
        assert!(!Edge::new("F1", 4, 0, 1.0).is_sentinel());
        // Self-links on real ids are left to the geometry checks.
        assert!(!Edge::new("F1", 7, 7, 1.0).is_sentinel());
    }
}
