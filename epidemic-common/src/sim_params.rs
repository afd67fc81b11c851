use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, used on every tick.
///
/// All parameters are fixed for the lifetime of a population; changing them
/// requires a new engine (or a reset with a fresh configuration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Velocities are redrawn every `resample_period` ticks.
    pub resample_period: u32,
    /// Mean of the normal draw whose absolute value gives the per-tick step magnitude.
    pub speed_mean: f64,
    /// Standard deviation of that normal draw.
    pub speed_std: f64,
    /// Maximum transmission distance, in domain units (the domain is the unit square).
    pub infection_dist: f64,
    /// Precomputed `infection_dist * infection_dist` for the squared-distance test.
    pub infection_dist_sq: f64,
    /// Per-candidate transmission probability within `infection_dist`.
    pub infection_prob: f64,
}
