use crate::error::EngineError;
use crate::population::{Agent, Population};
use crate::window::x_window;
use epidemic_common::{SimParams, TickSnapshot};
use log::{debug, info};
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::Normal;

/// Drives the epidemic simulation over an owned [`Population`].
///
/// Each tick runs a fixed pipeline: periodic velocity resampling, motion with
/// reflective boundaries, then infection propagation via the sorted x-window
/// search. The engine performs no I/O and never reads the clock; an external
/// driver calls [`Simulation::advance_tick`] at whatever cadence it chooses
/// and reads agent state back between ticks.
///
/// All randomness flows through one seeded `StdRng` in a fixed order
/// (resampling before infection trials, agents left-to-right), so identical
/// seeds and parameters produce bit-identical agent state.
pub struct Simulation {
    params: SimParams,
    population: Population,
    /// x coordinates of the susceptible segment, rebuilt after each sort.
    /// A derived cache only, never authoritative state.
    susceptible_x: Vec<f64>,
    rng: StdRng,
    current_tick: u64,
    initialized: bool,
    /// |Normal(mean, std)| gives the per-tick step magnitude.
    speed_dist: Normal<f64>,
    /// Uniform heading in [0, 2pi).
    angle_dist: Uniform<f64>,
    recorded_snapshots: Vec<TickSnapshot>,
}

impl Simulation {
    /// Creates an idle engine from derived parameters. Stepping before the
    /// first successful [`Simulation::reset`] fails with `NotInitialized`.
    pub fn new(params: SimParams) -> Result<Self, EngineError> {
        if params.resample_period == 0 {
            return Err(EngineError::InvalidConfiguration(
                "resample period must be positive".to_string(),
            ));
        }
        if !(params.infection_dist.is_finite() && params.infection_dist > 0.0) {
            return Err(EngineError::InvalidConfiguration(
                "infection distance must be finite and positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&params.infection_prob) {
            return Err(EngineError::InvalidConfiguration(
                "infection probability must lie in [0, 1]".to_string(),
            ));
        }
        // Normal::new only rejects non-finite deviations, so the sign check
        // has to happen here.
        if !(params.speed_std.is_finite() && params.speed_std >= 0.0) {
            return Err(EngineError::InvalidConfiguration(
                "speed standard deviation must be finite and non-negative".to_string(),
            ));
        }
        let speed_dist = Normal::new(params.speed_mean, params.speed_std)
            .map_err(|e| EngineError::InvalidConfiguration(format!("speed distribution: {}", e)))?;
        let angle_dist = Uniform::new(0.0, std::f64::consts::TAU)
            .map_err(|e| EngineError::InvalidConfiguration(format!("angle distribution: {}", e)))?;

        Ok(Self {
            params,
            population: Population::default(),
            susceptible_x: Vec::new(),
            rng: StdRng::seed_from_u64(0),
            current_tick: 0,
            initialized: false,
            speed_dist,
            angle_dist,
            recorded_snapshots: Vec::new(),
        })
    }

    /// (Re)creates the population wholesale and rewinds the tick counter.
    ///
    /// The RNG is reseeded here: explicitly from `seed` for reproducible
    /// runs, otherwise from OS entropy. Any cached search state from a
    /// previous population is invalidated.
    pub fn reset(
        &mut self,
        population_size: u32,
        initial_infected: u32,
        seed: Option<u64>,
    ) -> Result<(), EngineError> {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        self.population
            .reset(population_size, initial_infected, &mut rng)?;

        self.rng = rng;
        self.susceptible_x.clear();
        self.current_tick = 0;
        self.recorded_snapshots.clear();
        self.initialized = true;

        info!(
            "Population reset: {} agents, {} initially infected.",
            population_size, initial_infected
        );
        Ok(())
    }

    /// Advances the simulation by exactly one discrete tick.
    pub fn advance_tick(&mut self) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }

        if self.current_tick % u64::from(self.params.resample_period) == 0 {
            self.resample_velocities();
        }
        self.move_agents();
        // Once everyone is infected there are no candidates left; skipping
        // the pass also keeps the RNG stream free of dead infection trials.
        if self.population.infected_count() < self.population.len() as u32 {
            self.propagate_infection();
        }

        self.current_tick += 1;
        Ok(())
    }

    /// Redraws every agent's velocity: magnitude from a half-normal
    /// distribution, heading uniform. A full resample, not a perturbation.
    fn resample_velocities(&mut self) {
        for agent in self.population.agents_mut() {
            let magnitude = self.rng.sample(self.speed_dist).abs();
            let angle = self.rng.sample(self.angle_dist);
            agent.vx = magnitude * angle.cos();
            agent.vy = magnitude * angle.sin();
        }
    }

    /// Applies one displacement step and reflects about the domain edges.
    ///
    /// Reflection fires only when the velocity points outward; an agent
    /// already outside the boundary but moving inward is left alone. A large
    /// single-step overshoot mirrors deep into the domain rather than
    /// clamping at the edge.
    fn move_agents(&mut self) {
        for agent in self.population.agents_mut() {
            agent.x += agent.vx;
            agent.y += agent.vy;

            if agent.x < 0.0 && agent.vx < 0.0 {
                agent.x = -agent.x;
                agent.vx = -agent.vx;
            } else if agent.x > 1.0 && agent.vx > 0.0 {
                agent.x = 2.0 - agent.x;
                agent.vx = -agent.vx;
            }

            if agent.y < 0.0 && agent.vy < 0.0 {
                agent.y = -agent.y;
                agent.vy = -agent.vy;
            } else if agent.y > 1.0 && agent.vy > 0.0 {
                agent.y = 2.0 - agent.y;
                agent.vy = -agent.vy;
            }
        }
    }

    /// One-hop infection pass over the tick-start infected cohort.
    ///
    /// The population is sorted infected-first, then x-ascending; the
    /// partition boundary is the pre-tick infected count. Each source
    /// binary-searches the susceptible x buffer for its window and rolls one
    /// uniform per candidate. Agents infected earlier in the same scan are
    /// skipped as candidates but not re-scanned as sources until the next
    /// tick; infection spreads one hop per tick by design.
    fn propagate_infection(&mut self) {
        let boundary = self.population.infected_count() as usize;

        {
            let agents = self.population.agents_mut();
            agents.sort_unstable_by(|a, b| {
                b.infected.cmp(&a.infected).then_with(|| a.x.total_cmp(&b.x))
            });
            self.susceptible_x.clear();
            self.susceptible_x
                .extend(agents[boundary..].iter().map(|a| a.x));
        }

        let infection_dist = self.params.infection_dist;
        let infection_dist_sq = self.params.infection_dist_sq;
        let infection_prob = self.params.infection_prob;

        let mut newly_infected = 0u32;
        let agents = self.population.agents_mut();
        for i in 0..boundary {
            let source_x = agents[i].x;
            let source_y = agents[i].y;

            for j in x_window(&self.susceptible_x, source_x, infection_dist) {
                let candidate = &mut agents[boundary + j];
                if candidate.infected {
                    continue;
                }

                let dx = candidate.x - source_x;
                let dy = candidate.y - source_y;
                // One uniform per scanned candidate, drawn before the
                // distance test; the RNG stream order is observable behavior.
                let roll: f64 = self.rng.random();
                if roll < infection_prob && dx * dx + dy * dy < infection_dist_sq {
                    candidate.infected = true;
                    newly_infected += 1;
                }
            }
        }

        if newly_infected > 0 {
            self.population.add_infected(newly_infected);
            debug!(
                "{} newly infected this tick ({} total).",
                newly_infected,
                self.population.infected_count()
            );
        }
    }

    /// Returns the total number of agents.
    pub fn agent_count(&self) -> u32 {
        self.population.len() as u32
    }

    /// Returns the number of infected agents.
    pub fn infected_count(&self) -> u32 {
        self.population.infected_count()
    }

    /// Returns the current tick index (number of completed ticks).
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Read-only view of all agents, for rendering and inspection between
    /// ticks. Ordering is unspecified and changes across ticks.
    pub fn agents(&self) -> &[Agent] {
        self.population.agents()
    }

    /// Provides access to the simulation parameters.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Builds a snapshot of the current state, optionally including the raw
    /// per-agent `(x, y, infected)` data.
    pub fn snapshot(&self, include_positions: bool) -> TickSnapshot {
        let positions = if include_positions {
            Some(
                self.agents()
                    .iter()
                    .map(|a| (a.x, a.y, a.infected))
                    .collect(),
            )
        } else {
            None
        };

        TickSnapshot {
            tick: self.current_tick,
            population: self.agent_count(),
            infected: self.infected_count(),
            positions,
        }
    }

    /// Records a snapshot of the current state. Called by the driver at its
    /// record interval.
    pub fn record_snapshot(&mut self, include_positions: bool) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        debug!("Recording snapshot at tick {}...", self.current_tick);
        let snapshot = self.snapshot(include_positions);
        self.recorded_snapshots.push(snapshot);
        Ok(())
    }

    /// Provides access to the recorded snapshots.
    pub fn recorded_snapshots(&self) -> &[TickSnapshot] {
        &self.recorded_snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params() -> SimParams {
        SimParams {
            resample_period: 60,
            speed_mean: 0.001,
            speed_std: 0.003,
            infection_dist: 0.01,
            infection_dist_sq: 0.0001,
            infection_prob: 0.2,
        }
    }

    fn seeded_sim(size: u32, initial_infected: u32, seed: u64) -> Simulation {
        let mut sim = Simulation::new(test_params()).unwrap();
        sim.reset(size, initial_infected, Some(seed)).unwrap();
        sim
    }

    #[test]
    fn new_rejects_bad_parameters() {
        let mut params = test_params();
        params.resample_period = 0;
        assert!(matches!(
            Simulation::new(params),
            Err(EngineError::InvalidConfiguration(_))
        ));

        let mut params = test_params();
        params.infection_prob = 1.5;
        assert!(Simulation::new(params).is_err());

        let mut params = test_params();
        params.infection_dist = 0.0;
        assert!(Simulation::new(params).is_err());

        let mut params = test_params();
        params.speed_std = -0.1;
        assert!(matches!(
            Simulation::new(params),
            Err(EngineError::InvalidConfiguration(_))
        ));

        let mut params = test_params();
        params.speed_std = f64::NAN;
        assert!(Simulation::new(params).is_err());
    }

    #[test]
    fn low_side_reflection_mirrors_position_and_flips_velocity() {
        let mut sim = seeded_sim(1, 1, 7);
        {
            let agent = &mut sim.population.agents_mut()[0];
            agent.x = 0.002;
            agent.y = 0.5;
            agent.vx = -0.005;
            agent.vy = 0.0;
        }
        sim.move_agents();

        let agent = sim.agents()[0];
        assert!((agent.x - 0.003).abs() < 1e-12);
        assert!((agent.vx - 0.005).abs() < 1e-12);
        assert!((agent.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn high_side_reflection_mirrors_about_one() {
        let mut sim = seeded_sim(1, 1, 7);
        {
            let agent = &mut sim.population.agents_mut()[0];
            agent.x = 0.5;
            agent.y = 0.998;
            agent.vx = 0.0;
            agent.vy = 0.005;
        }
        sim.move_agents();

        let agent = sim.agents()[0];
        assert!((agent.y - 0.997).abs() < 1e-12);
        assert!((agent.vy + 0.005).abs() < 1e-12);
    }

    #[test]
    fn outside_agent_moving_inward_is_not_reflected() {
        let mut sim = seeded_sim(1, 1, 7);
        {
            let agent = &mut sim.population.agents_mut()[0];
            agent.x = -0.01;
            agent.y = 0.5;
            agent.vx = 0.004;
            agent.vy = 0.0;
        }
        sim.move_agents();

        let agent = sim.agents()[0];
        assert!((agent.x + 0.006).abs() < 1e-12);
        assert!((agent.vx - 0.004).abs() < 1e-12);
    }

    #[test]
    fn propagation_never_reaches_outside_the_window() {
        // Two agents slightly more than infection_dist apart along x.
        let mut sim = seeded_sim(2, 1, 3);
        {
            let agents = sim.population.agents_mut();
            agents[0] = Agent {
                x: 0.5,
                y: 0.5,
                vx: 0.0,
                vy: 0.0,
                infected: true,
            };
            agents[1] = Agent {
                x: 0.5 + 0.0101,
                y: 0.5,
                vx: 0.0,
                vy: 0.0,
                infected: false,
            };
        }

        for _ in 0..200 {
            sim.propagate_infection();
        }
        assert_eq!(sim.infected_count(), 1);
    }

    #[test]
    fn same_tick_infections_are_not_double_counted() {
        // Two co-located sources and one co-located candidate with certain
        // transmission: the first source infects the candidate, the second
        // must skip it.
        let mut params = test_params();
        params.infection_prob = 1.0;
        let mut sim = Simulation::new(params).unwrap();
        sim.reset(3, 2, Some(11)).unwrap();
        for agent in sim.population.agents_mut() {
            agent.x = 0.5;
            agent.y = 0.5;
            agent.vx = 0.0;
            agent.vy = 0.0;
        }

        sim.propagate_infection();

        assert_eq!(sim.infected_count(), 3);
        let flagged = sim.agents().iter().filter(|a| a.infected).count();
        assert_eq!(flagged, 3);
    }

    #[test]
    fn propagation_orders_infected_before_susceptible() {
        // Zero probability keeps the partition boundary fixed so the
        // post-pass ordering can be checked exactly.
        let mut params = test_params();
        params.infection_prob = 0.0;
        let mut sim = Simulation::new(params).unwrap();
        sim.reset(50, 10, Some(21)).unwrap();

        sim.propagate_infection();

        let agents = sim.agents();
        let boundary = sim.infected_count() as usize;
        assert_eq!(boundary, 10);
        assert!(agents[..boundary].iter().all(|a| a.infected));
        assert!(agents[boundary..].iter().all(|a| !a.infected));
        assert!(agents[boundary..].windows(2).all(|w| w[0].x <= w[1].x));
    }

    #[test]
    fn resample_is_skipped_between_periods() {
        let mut sim = seeded_sim(10, 1, 5);
        sim.advance_tick().unwrap(); // tick 0 resamples

        // Park everyone mid-domain so tick 1 cannot reflect and flip a
        // velocity sign.
        for agent in sim.population.agents_mut() {
            agent.x = 0.5;
            agent.y = 0.5;
        }
        let mut before: Vec<(f64, f64)> = sim.agents().iter().map(|a| (a.vx, a.vy)).collect();

        sim.advance_tick().unwrap(); // tick 1 must not resample
        let mut after: Vec<(f64, f64)> = sim.agents().iter().map(|a| (a.vx, a.vy)).collect();

        // Propagation reorders agents, so compare as multisets.
        before.sort_by(|a, b| a.partial_cmp(b).unwrap());
        after.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(before, after);
    }
}
