use serde::{Deserialize, Serialize};

/// A snapshot of the simulation state at a specific tick.
#[derive(Debug, Clone, Serialize, Deserialize)] // Derive traits for easy saving/loading
pub struct TickSnapshot {
    /// The tick index at which the snapshot was taken.
    pub tick: u64,
    /// Total number of agents in the population.
    pub population: u32,
    /// Number of infected agents at snapshot time.
    pub infected: u32,
    /// Optional: raw `(x, y, infected)` state of every agent, for rendering
    /// or offline analysis. Included only if the output config asks for it.
    #[serde(skip_serializing_if = "Option::is_none")] // Don't write "positions": null
    pub positions: Option<Vec<(f64, f64, bool)>>,
}
