// THEORY:
// The summary is the numeric half of the figures the lab draws from the radial
// table: per experimental group, edges are binned by `EDGE_TIME` (hours since
// treatment) and each bin reports the mean and standard error of radial
// velocity, radial persistence and speed. Rendering is left to whatever tool
// reads the CSV.

use colony_radial::pipeline::ProcessedEdge;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_BIN_HOURS: f64 = 0.5;
const UNGROUPED: &str = "Ungrouped";

/// One `(group, time bin)` cell of the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Group")]
    pub group: String,
    /// Lower edge of the bin, hours.
    #[serde(rename = "EDGE_TIME_BINNED")]
    pub time_bin: f64,
    pub n: usize,
    pub radial_velocity_mean: f64,
    pub radial_velocity_sem: f64,
    pub radial_persistence_mean: f64,
    pub radial_persistence_sem: f64,
    /// µm/min from the displacement and elapsed time of each edge.
    pub speed_mean: f64,
    pub speed_sem: f64,
}

#[derive(Default)]
struct Bin {
    radial_velocity: Vec<f64>,
    radial_persistence: Vec<f64>,
    speed: Vec<f64>,
}

/// Mean and standard error of the mean (sample standard deviation / sqrt(n)).
/// The SEM is `0` for fewer than two values; both are `0` for none.
pub fn mean_sem(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, (variance / n as f64).sqrt())
}

/// Bins `edges` by group and `EDGE_TIME`, sorted by group then bin.
pub fn summarize(edges: &[ProcessedEdge], bin_hours: f64) -> Vec<SummaryRow> {
    let mut bins: BTreeMap<(String, i64), Bin> = BTreeMap::new();
    for edge in edges {
        let group = edge.group.clone().unwrap_or_else(|| UNGROUPED.to_string());
        let index = (edge.edge_time / bin_hours).floor() as i64;
        let bin = bins.entry((group, index)).or_default();
        bin.radial_velocity.push(edge.radial_velocity);
        if let Some(p) = edge.radial_persistence {
            bin.radial_persistence.push(p);
        }
        if edge.elapsed_minutes != 0.0 {
            bin.speed.push(edge.displacement() / edge.elapsed_minutes.abs());
        }
    }

    bins.into_iter()
        .map(|((group, index), bin)| {
            let (radial_velocity_mean, radial_velocity_sem) = mean_sem(&bin.radial_velocity);
            let (radial_persistence_mean, radial_persistence_sem) = mean_sem(&bin.radial_persistence);
            let (speed_mean, speed_sem) = mean_sem(&bin.speed);
            SummaryRow {
                group,
                time_bin: index as f64 * bin_hours,
                n: bin.radial_velocity.len(),
                radial_velocity_mean,
                radial_velocity_sem,
                radial_persistence_mean,
                radial_persistence_sem,
                speed_mean,
                speed_sem,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(group: Option<&str>, edge_time: f64, radial_velocity: f64, u: f64) -> ProcessedEdge {
        ProcessedEdge {
            file_id: "c1_offset_27".to_string(),
            group: group.map(str::to_string),
            spot_source_id: 1,
            spot_target_id: 2,
            edge_time,
            speed: None,
            u,
            v: 0.0,
            source_x: 0.0,
            source_y: 0.0,
            target_x: u,
            target_y: 0.0,
            elapsed_minutes: 10.0,
            radial_distance: 5.0,
            radial_velocity,
            radial_velocity_theta: 0.0,
            center_x: 5.0,
            center_y: 0.0,
            radial_persistence: Some(radial_velocity.signum()),
        }
    }

    #[test]
    fn mean_and_sem_of_known_values() {
        let (mean, sem) = mean_sem(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(mean, 5.0);
        // sample sd = sqrt(32 / 7)
        assert_relative_eq!(sem, (32.0_f64 / 7.0).sqrt() / 8.0_f64.sqrt(), max_relative = 1e-12);
        assert_eq!(mean_sem(&[3.0]), (3.0, 0.0));
        assert_eq!(mean_sem(&[]), (0.0, 0.0));
    }

    #[test]
    fn rows_are_binned_per_group_and_half_hour() {
        let edges = vec![
            row(Some("Control"), 27.1, 0.2, 2.0),
            row(Some("Control"), 27.4, 0.4, 4.0),
            row(Some("Control"), 27.6, -0.1, 1.0),
            row(Some("Treatment"), 27.2, 0.3, 3.0),
            row(None, 28.0, 0.1, 1.0),
        ];
        let summary = summarize(&edges, DEFAULT_BIN_HOURS);

        let keys: Vec<(&str, f64, usize)> = summary
            .iter()
            .map(|r| (r.group.as_str(), r.time_bin, r.n))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Control", 27.0, 2),
                ("Control", 27.5, 1),
                ("Treatment", 27.0, 1),
                ("Ungrouped", 28.0, 1),
            ]
        );

        let first = &summary[0];
        assert_relative_eq!(first.radial_velocity_mean, 0.3, max_relative = 1e-12);
        assert_relative_eq!(first.speed_mean, 0.3, max_relative = 1e-12);
        assert_relative_eq!(first.radial_persistence_mean, 1.0);
        assert_eq!(first.radial_persistence_sem, 0.0);
        assert_eq!(summary[1].radial_velocity_sem, 0.0);
    }
}
