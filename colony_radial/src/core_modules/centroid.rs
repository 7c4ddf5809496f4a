// THEORY:
// The dynamic center is the reference frame of the whole analysis. Each imaging
// file holds one circular colony, so the arithmetic mean of every spot position
// in that file approximates the colony center. It is recomputed independently
// for every `File_ID` and never carried from one file to the next.

use crate::core_modules::spot::Spot;

/// The per-file centroid of all spot positions, in µm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicCenter {
    pub x: f64,
    pub y: f64,
}

impl DynamicCenter {
    /// Mean `POSITION_X` / `POSITION_Y` over `spots`, or `None` when there are none.
    pub fn from_spots<'a, I>(spots: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Spot>,
    {
        let (xs, ys): (Vec<f64>, Vec<f64>) = spots
            .into_iter()
            .map(|spot| (spot.position_x, spot.position_y))
            .unzip();
        if xs.is_empty() {
            return None;
        }
        Some(Self {
            x: order_independent_mean(xs),
            y: order_independent_mean(ys),
        })
    }

    /// Vector from `(x, y)` to this center.
    pub fn offset_from(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x - x, self.y - y)
    }
}

// Summed in sorted order so the mean does not depend on row order.
fn order_independent_mean(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spots() -> Vec<Spot> {
        vec![
            Spot::new("F1", 1, 0.0, 0.0),
            Spot::new("F1", 2, 10.0, 0.0),
            Spot::new("F1", 3, 0.0, 10.0),
            Spot::new("F1", 4, 0.1, 7.3),
            Spot::new("F1", 5, 1e6, -3.7),
        ]
    }

    #[test]
    fn center_is_arithmetic_mean() {
        let spots = spots();
        let center = DynamicCenter::from_spots(&spots).unwrap();
        assert_relative_eq!(center.x, (0.0 + 10.0 + 0.0 + 0.1 + 1e6) / 5.0, max_relative = 1e-12);
        assert_relative_eq!(center.y, (0.0 + 0.0 + 10.0 + 7.3 - 3.7) / 5.0, max_relative = 1e-12);
    }

    #[test]
    fn permuting_rows_does_not_change_center() {
        let spots = spots();
        let expected = DynamicCenter::from_spots(&spots).unwrap();

        let mut reversed = spots.clone();
        reversed.reverse();
        assert_eq!(DynamicCenter::from_spots(&reversed).unwrap(), expected);

        let mut rotated = spots.clone();
        rotated.rotate_left(2);
        assert_eq!(DynamicCenter::from_spots(&rotated).unwrap(), expected);
    }

    #[test]
    fn empty_input_has_no_center() {
        let none: Vec<Spot> = Vec::new();
        assert!(DynamicCenter::from_spots(&none).is_none());
    }
}
