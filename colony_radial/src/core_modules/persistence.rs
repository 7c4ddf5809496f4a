use crate::core_modules::radial::ProcessedEdge;

/// Ratio of radial velocity to the total speed `hypot(u, v) / elapsed_minutes`,
/// i.e. the cosine between the step and the inward direction.
///
/// `0` when the speed is zero.
pub fn radial_persistence(u: f64, v: f64, elapsed_minutes: f64, radial_velocity: f64) -> f64 {
    let speed_magnitude = if elapsed_minutes != 0.0 {
        u.hypot(v) / elapsed_minutes.abs()
    } else {
        0.0
    };
    if speed_magnitude != 0.0 {
        // Rounding can push an exactly radial step a few ulps past 1.
        (radial_velocity / speed_magnitude).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Fills `radial_persistence` on every row from its own `u`, `v`,
/// `elapsed_minutes` and `radial_velocity`. Rows are independent; running it
/// twice changes nothing.
pub fn derive_radial_persistence(edges: &mut [ProcessedEdge]) {
    for edge in edges.iter_mut() {
        edge.radial_persistence = Some(radial_persistence(
            edge.u,
            edge.v,
            edge.elapsed_minutes,
            edge.radial_velocity,
        ));
    }
}
