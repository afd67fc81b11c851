use crate::error::EngineError;
use rand::prelude::*;
use rand::seq::index;
use serde::{Deserialize, Serialize};

/// One simulated individual: position, velocity and infection status.
///
/// Agents are plain value records with no identity beyond their current array
/// position; the engine reorders them freely between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub infected: bool,
}

/// Fixed-capacity store of agents plus the infected counter.
///
/// The counter must equal the number of `true` infection flags at all times;
/// every mutation that flips a flag goes through [`Population::add_infected`]
/// in the same pass.
#[derive(Debug, Default)]
pub struct Population {
    agents: Vec<Agent>,
    infected: u32,
}

impl Population {
    /// Discards any previous population and builds a fresh one: independent
    /// uniform positions in the unit square, zero velocity, not infected.
    /// Then marks a uniformly-random subset of `initial_infected` distinct
    /// agents as infected, so the infection start is uncorrelated with array
    /// position.
    ///
    /// Validation happens before any mutation; on error the previous
    /// population (if any) is left untouched.
    pub fn reset(
        &mut self,
        size: u32,
        initial_infected: u32,
        rng: &mut StdRng,
    ) -> Result<(), EngineError> {
        if size == 0 {
            return Err(EngineError::InvalidConfiguration(
                "population size must be positive".to_string(),
            ));
        }
        if initial_infected == 0 {
            return Err(EngineError::InvalidConfiguration(
                "initial infected count must be positive".to_string(),
            ));
        }
        if initial_infected > size {
            return Err(EngineError::InvalidConfiguration(format!(
                "initial infected count ({}) exceeds population size ({})",
                initial_infected, size
            )));
        }

        self.agents.clear();
        self.agents.reserve(size as usize);
        for _ in 0..size {
            self.agents.push(Agent {
                x: rng.random::<f64>(),
                y: rng.random::<f64>(),
                vx: 0.0,
                vy: 0.0,
                infected: false,
            });
        }
        for idx in index::sample(rng, size as usize, initial_infected as usize) {
            self.agents[idx].infected = true;
        }
        self.infected = initial_infected;

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn infected_count(&self) -> u32 {
        self.infected
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Bumps the infected counter after the caller has flipped `count` flags.
    pub fn add_infected(&mut self, count: u32) {
        debug_assert!(u64::from(self.infected) + u64::from(count) <= self.agents.len() as u64);
        self.infected += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn reset_builds_requested_population() {
        let mut pop = Population::default();
        pop.reset(100, 5, &mut rng(1)).unwrap();

        assert_eq!(pop.len(), 100);
        assert_eq!(pop.infected_count(), 5);
        let flagged = pop.agents().iter().filter(|a| a.infected).count();
        assert_eq!(flagged, 5);
    }

    #[test]
    fn reset_places_agents_in_unit_square_with_zero_velocity() {
        let mut pop = Population::default();
        pop.reset(500, 1, &mut rng(2)).unwrap();

        for agent in pop.agents() {
            assert!((0.0..=1.0).contains(&agent.x));
            assert!((0.0..=1.0).contains(&agent.y));
            assert_eq!(agent.vx, 0.0);
            assert_eq!(agent.vy, 0.0);
        }
    }

    #[test]
    fn reset_can_infect_entire_population() {
        let mut pop = Population::default();
        pop.reset(8, 8, &mut rng(3)).unwrap();
        assert!(pop.agents().iter().all(|a| a.infected));
        assert_eq!(pop.infected_count(), 8);
    }

    #[test]
    fn reset_rejects_zero_population() {
        let mut pop = Population::default();
        let err = pop.reset(0, 1, &mut rng(4)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn reset_rejects_zero_initial_infected() {
        let mut pop = Population::default();
        let err = pop.reset(10, 0, &mut rng(5)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn reset_rejects_infected_exceeding_population() {
        let mut pop = Population::default();
        let err = pop.reset(10, 11, &mut rng(6)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn failed_reset_leaves_previous_population_intact() {
        let mut pop = Population::default();
        pop.reset(50, 2, &mut rng(7)).unwrap();
        assert!(pop.reset(10, 11, &mut rng(8)).is_err());
        assert_eq!(pop.len(), 50);
        assert_eq!(pop.infected_count(), 2);
    }
}
