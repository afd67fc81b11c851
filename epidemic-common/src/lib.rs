pub mod config;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{
    InfectionConfig, MotionConfig, OutputConfig, PopulationConfig, SimulationConfig, TimingConfig,
};
pub use sim_params::SimParams;
pub use snapshot::TickSnapshot;
