// THEORY:
// The `radial` module is the numerical heart of the engine. For one edge it
// takes the two linked spots and the dynamic center of their file and
// decomposes the displacement into its component along the line to the center.
//
// Key principles:
// 1.  **Inward is positive**: the radial unit vector points from the source
//     spot toward the center, and the radial velocity is the projection of the
//     displacement onto it per minute. Motion toward the center is positive,
//     motion away from it negative.
// 2.  **Strict skip-on-ambiguity**: an edge with no usable time, zero elapsed
//     time, or a source sitting exactly on the center has no defined velocity
//     or direction. It produces no row and a `SkipReason`, never a default.
// 3.  **Time fallback**: `POSITION_T` on both endpoints is preferred; without it
//     the frame difference times a fixed acquisition interval is used.

use crate::core_modules::centroid::DynamicCenter;
use crate::core_modules::edge::Edge;
use crate::core_modules::skip::SkipReason;
use crate::core_modules::spot::Spot;
use serde::{Deserialize, Serialize};

/// Imaging cadence assumed when only `FRAME` is available.
pub const DEFAULT_FRAME_INTERVAL_SECONDS: f64 = 600.0;

const SECONDS_PER_MINUTE: f64 = 60.0;

/// One retained edge with its radial decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEdge {
    #[serde(rename = "File_ID")]
    pub file_id: String,
    #[serde(rename = "Group", default)]
    pub group: Option<String>,
    #[serde(rename = "SPOT_SOURCE_ID")]
    pub spot_source_id: i64,
    #[serde(rename = "SPOT_TARGET_ID")]
    pub spot_target_id: i64,
    #[serde(rename = "EDGE_TIME")]
    pub edge_time: f64,
    #[serde(rename = "SPEED", default)]
    pub speed: Option<f64>,
    /// Displacement in µm.
    pub u: f64,
    pub v: f64,
    pub source_x: f64,
    pub source_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub elapsed_minutes: f64,
    /// Distance from the source spot to the dynamic center, µm.
    pub radial_distance: f64,
    /// µm/min, positive toward the center.
    pub radial_velocity: f64,
    /// Angle of the inward direction in radians, `(-π, π]`.
    pub radial_velocity_theta: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Filled by the persistence pass; `None` until then.
    #[serde(default)]
    pub radial_persistence: Option<f64>,
}

impl ProcessedEdge {
    /// Magnitude of the displacement, µm.
    pub fn displacement(&self) -> f64 {
        self.u.hypot(self.v)
    }
}

/// Elapsed time between two spots in minutes.
///
/// Uses `POSITION_T` when both spots carry it, otherwise the frame difference
/// scaled by `frame_interval_seconds`. Returns `None` if neither is available
/// on both endpoints.
pub fn elapsed_minutes(source: &Spot, target: &Spot, frame_interval_seconds: f64) -> Option<f64> {
    match (source.position_t, target.position_t) {
        (Some(t0), Some(t1)) => Some((t1 - t0) / SECONDS_PER_MINUTE),
        _ => match (source.frame, target.frame) {
            (Some(f0), Some(f1)) => {
                Some((f1 - f0) as f64 * frame_interval_seconds / SECONDS_PER_MINUTE)
            }
            _ => None,
        },
    }
}

/// Decomposes one edge against the dynamic center of its file.
pub fn decompose_edge(
    edge: &Edge,
    source: &Spot,
    target: &Spot,
    center: DynamicCenter,
    frame_interval_seconds: f64,
) -> Result<ProcessedEdge, SkipReason> {
    let (source_x, source_y) = source.position();
    let (target_x, target_y) = target.position();

    let u = target_x - source_x;
    let v = target_y - source_y;

    let dt = elapsed_minutes(source, target, frame_interval_seconds).ok_or(SkipReason::MissingTime)?;
    if dt == 0.0 {
        return Err(SkipReason::ZeroElapsedTime);
    }

    let (dx, dy) = center.offset_from(source_x, source_y);
    let r = dx.hypot(dy);
    if r == 0.0 {
        return Err(SkipReason::ZeroRadialDistance);
    }
    let ux = dx / r;
    let uy = dy / r;

    let radial_velocity = (u * ux + v * uy) / dt;
    let radial_velocity_theta = uy.atan2(ux);

    Ok(ProcessedEdge {
        file_id: edge.file_id.clone(),
        group: edge.group.clone(),
        spot_source_id: edge.spot_source_id,
        spot_target_id: edge.spot_target_id,
        edge_time: edge.edge_time,
        speed: edge.speed,
        u,
        v,
        source_x,
        source_y,
        target_x,
        target_y,
        elapsed_minutes: dt,
        radial_distance: r,
        radial_velocity,
        radial_velocity_theta,
        center_x: center.x,
        center_y: center.y,
        radial_persistence: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const ORIGIN: DynamicCenter = DynamicCenter { x: 0.0, y: 0.0 };

    fn link(source: &Spot, target: &Spot) -> Edge {
        Edge::new(source.file_id.clone(), source.id, target.id, 27.0)
    }

    #[test]
    fn motion_toward_center_is_positive() {
        let a = Spot::new("F1", 1, 10.0, 0.0).with_time(0.0);
        let b = Spot::new("F1", 2, 4.0, 0.0).with_time(120.0);
        let row = decompose_edge(&link(&a, &b), &a, &b, ORIGIN, DEFAULT_FRAME_INTERVAL_SECONDS).unwrap();
        assert_relative_eq!(row.radial_velocity, 3.0);
        assert_relative_eq!(row.radial_distance, 10.0);
        assert_relative_eq!(row.radial_velocity_theta, PI);
    }

    #[test]
    fn motion_away_from_center_is_negative() {
        let a = Spot::new("F1", 1, 0.0, 5.0).with_time(0.0);
        let b = Spot::new("F1", 2, 0.0, 8.0).with_time(60.0);
        let row = decompose_edge(&link(&a, &b), &a, &b, ORIGIN, DEFAULT_FRAME_INTERVAL_SECONDS).unwrap();
        assert_relative_eq!(row.radial_velocity, -3.0);
        assert_relative_eq!(row.radial_velocity_theta, -FRAC_PI_2);
    }

    #[test]
    fn tangential_motion_has_no_radial_component() {
        let a = Spot::new("F1", 1, 3.0, 3.0).with_time(0.0);
        let b = Spot::new("F1", 2, 5.0, 1.0).with_time(60.0);
        let row = decompose_edge(&link(&a, &b), &a, &b, ORIGIN, DEFAULT_FRAME_INTERVAL_SECONDS).unwrap();
        assert!(row.radial_velocity.abs() < 1e-12);
        assert_relative_eq!(row.radial_velocity_theta, -3.0 * FRAC_PI_4, max_relative = 1e-12);
    }

    #[test]
    fn frame_fallback_uses_interval() {
        let a = Spot::new("F1", 1, 10.0, 0.0).with_frame(3);
        let b = Spot::new("F1", 2, 0.0, 0.0).with_frame(5);
        assert_relative_eq!(elapsed_minutes(&a, &b, DEFAULT_FRAME_INTERVAL_SECONDS).unwrap(), 20.0);
        let row = decompose_edge(&link(&a, &b), &a, &b, DynamicCenter { x: -1.0, y: 0.0 }, 600.0).unwrap();
        assert_relative_eq!(row.radial_velocity, 0.5);
        assert_relative_eq!(row.elapsed_minutes, 20.0);
    }

    #[test]
    fn position_t_wins_over_frame() {
        let a = Spot::new("F1", 1, 0.0, 0.0).with_time(0.0).with_frame(0);
        let b = Spot::new("F1", 2, 0.0, 0.0).with_time(30.0).with_frame(1);
        assert_relative_eq!(elapsed_minutes(&a, &b, 600.0).unwrap(), 0.5);
    }

    #[test]
    fn time_on_one_endpoint_only_falls_back_to_frames() {
        let a = Spot::new("F1", 1, 0.0, 0.0).with_time(0.0).with_frame(0);
        let b = Spot::new("F1", 2, 0.0, 0.0).with_frame(1);
        assert_relative_eq!(elapsed_minutes(&a, &b, 600.0).unwrap(), 10.0);

        let c = Spot::new("F1", 3, 0.0, 0.0).with_time(10.0);
        assert!(elapsed_minutes(&a, &c, 600.0).is_some());
        let d = Spot::new("F1", 4, 0.0, 0.0);
        assert!(elapsed_minutes(&d, &b, 600.0).is_none());
    }

    #[test]
    fn missing_time_is_skipped() {
        let a = Spot::new("F1", 1, 1.0, 0.0);
        let b = Spot::new("F1", 2, 2.0, 0.0);
        let result = decompose_edge(&link(&a, &b), &a, &b, ORIGIN, 600.0);
        assert_eq!(result, Err(SkipReason::MissingTime));
    }

    #[test]
    fn zero_elapsed_time_is_skipped() {
        let a = Spot::new("F1", 1, 1.0, 0.0).with_time(60.0);
        let b = Spot::new("F1", 2, 2.0, 0.0).with_time(60.0);
        let result = decompose_edge(&link(&a, &b), &a, &b, ORIGIN, 600.0);
        assert_eq!(result, Err(SkipReason::ZeroElapsedTime));
    }

    #[test]
    fn source_on_center_is_skipped() {
        let a = Spot::new("F1", 1, 0.0, 0.0).with_time(0.0);
        let b = Spot::new("F1", 2, 2.0, 0.0).with_time(60.0);
        let result = decompose_edge(&link(&a, &b), &a, &b, ORIGIN, 600.0);
        assert_eq!(result, Err(SkipReason::ZeroRadialDistance));
    }

    #[test]
    fn edge_fields_are_carried_through() {
        let a = Spot::new("F1", 11, 3.0, 4.0).with_time(0.0);
        let b = Spot::new("F1", 12, 3.0, 2.0).with_time(60.0);
        let mut edge = link(&a, &b).with_group("Control");
        edge.speed = Some(1.5);
        let row = decompose_edge(&edge, &a, &b, ORIGIN, 600.0).unwrap();
        assert_eq!(row.file_id, "F1");
        assert_eq!(row.group.as_deref(), Some("Control"));
        assert_eq!((row.spot_source_id, row.spot_target_id), (11, 12));
        assert_eq!(row.speed, Some(1.5));
        assert_eq!((row.u, row.v), (0.0, -2.0));
        assert_eq!((row.center_x, row.center_y), (0.0, 0.0));
        assert!(row.radial_persistence.is_none());
        // (0,-2) projected on (-0.6,-0.8)
        assert_relative_eq!(row.radial_velocity, 1.6, max_relative = 1e-12);
    }
}
