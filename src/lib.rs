//! Epidemic drift simulation engine.
//!
//! Agents drift across the unit square with periodically-resampled
//! velocities, bounce off the edges, and transmit infection probabilistically
//! to nearby susceptible agents. Neighbor search runs in better-than-quadratic
//! time by sorting the population infected-first / x-ascending and
//! binary-searching a sliding x-window per infected source.
//!
//! Rendering, UI and frame-rate measurement live outside this crate; they
//! drive [`Simulation::advance_tick`] and read state back through the
//! read-only queries and [`epidemic_common::TickSnapshot`].

pub mod error;
pub mod population;
pub mod simulation;
pub mod window;

pub use error::EngineError;
pub use population::{Agent, Population};
pub use simulation::Simulation;
