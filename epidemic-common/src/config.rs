use crate::sim_params::SimParams;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Population settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PopulationConfig {
    #[serde(default = "default_population_size")]
    pub size: u32,
    #[serde(default = "default_initial_infected")]
    pub initial_infected: u32,
    /// Seed for the engine RNG. Omit for a fresh OS-entropy seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
}

// Motion settings: how agents drift between resamples
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MotionConfig {
    /// Velocities are redrawn every this many ticks.
    #[serde(default = "default_resample_period")]
    pub resample_period: u32,
    /// Mean of the normal draw whose absolute value gives the step magnitude.
    #[serde(default = "default_speed_mean")]
    pub speed_mean: f64,
    #[serde(default = "default_speed_std")]
    pub speed_std: f64,
}

// Infection settings: transmission distance and probability
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InfectionConfig {
    #[serde(default = "default_infection_distance")]
    pub distance: f64,
    #[serde(default = "default_infection_probability")]
    pub probability: f64,
}

// Configuration for the headless driver loop
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub total_ticks: u64,
    pub record_interval_ticks: u64,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_positions: bool,
    pub save_stats: bool,
    pub save_positions_in_snapshot: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub population: PopulationConfig,
    pub motion: MotionConfig,
    pub infection: InfectionConfig,
    pub timing: TimingConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SimulationConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the engine would reject.
    pub fn validate(&self) -> Result<()> {
        if self.population.size == 0 {
            anyhow::bail!("population.size must be greater than 0.");
        }
        if self.population.initial_infected == 0 {
            anyhow::bail!("population.initial_infected must be greater than 0.");
        }
        if self.population.initial_infected > self.population.size {
            anyhow::bail!(
                "population.initial_infected ({}) exceeds population.size ({}).",
                self.population.initial_infected,
                self.population.size
            );
        }
        if self.motion.resample_period == 0 {
            anyhow::bail!("motion.resample_period must be greater than 0.");
        }
        if !(self.motion.speed_std.is_finite() && self.motion.speed_std >= 0.0) {
            anyhow::bail!("motion.speed_std must be finite and non-negative.");
        }
        if !(self.infection.distance.is_finite() && self.infection.distance > 0.0) {
            anyhow::bail!("infection.distance must be finite and positive.");
        }
        if !(0.0..=1.0).contains(&self.infection.probability) {
            anyhow::bail!("infection.probability must lie in [0, 1].");
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn sim_params(&self) -> SimParams {
        let infection_dist = self.infection.distance;

        SimParams {
            resample_period: self.motion.resample_period,
            speed_mean: self.motion.speed_mean,
            speed_std: self.motion.speed_std,
            infection_dist,
            infection_dist_sq: infection_dist * infection_dist,
            infection_prob: self.infection.probability,
        }
    }
}

// Default functions mirroring the original model constants
fn default_population_size() -> u32 {
    10_000
}

fn default_initial_infected() -> u32 {
    5
}

fn default_resample_period() -> u32 {
    60
}

fn default_speed_mean() -> f64 {
    0.001
}

fn default_speed_std() -> f64 {
    0.003
}

fn default_infection_distance() -> f64 {
    0.01
}

fn default_infection_probability() -> f64 {
    0.2
}
