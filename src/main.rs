use anyhow::Result;
use log::{debug, error, info, trace};
use std::fs::File;
use std::time::Instant;

use epidemic_common::SimulationConfig;
use epidemic_engine::Simulation;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Epidemic Engine (headless driver)...");

    // --- Load Configuration ---
    let config = SimulationConfig::load("config.toml")?;

    // --- Initialize Simulation ---
    info!("Initializing simulation state...");
    let mut sim = Simulation::new(config.sim_params())?;
    sim.reset(
        config.population.size,
        config.population.initial_infected,
        config.population.seed,
    )?;
    info!(
        "Population initialized: {} agents, {} infected.",
        sim.agent_count(),
        sim.infected_count()
    );
    debug!("Simulation Parameters: {:#?}", sim.params());

    // --- Simulation Loop ---
    let total_ticks = config.timing.total_ticks;
    let record_interval = config.timing.record_interval_ticks.max(1);
    let include_positions = config.output.save_positions_in_snapshot;

    info!(
        "Recording snapshot every {} ticks for {} total ticks.",
        record_interval, total_ticks
    );

    // Initial snapshot (tick 0, before any stepping)
    sim.record_snapshot(include_positions)?;

    let start_time = Instant::now();
    let mut previous_print_time = start_time;
    let mut saturation_logged = false;

    for tick in 0..total_ticks {
        let tick_start = Instant::now();
        if let Err(e) = sim.advance_tick() {
            error!("Error during simulation tick {}: {}", tick + 1, e);
            anyhow::bail!("Simulation tick failed.");
        }
        let tick_duration = tick_start.elapsed();

        if !saturation_logged && sim.infected_count() == sim.agent_count() {
            info!(
                "Entire population infected at tick {}; propagation is a no-op from here.",
                tick + 1
            );
            saturation_logged = true;
        }

        // Print status periodically and at record ticks
        let now = Instant::now();
        let should_print_status = now.duration_since(previous_print_time).as_secs_f64() >= 5.0;
        let is_record_tick = (tick + 1) % record_interval == 0;
        let is_last_tick = tick == total_ticks - 1;

        if should_print_status || is_record_tick || is_last_tick {
            info!(
                "Tick [{}/{}] | Infected: {}/{} | Tick Time: {:6.2} ms | Elapsed: {:.2} s",
                tick + 1,
                total_ticks,
                sim.infected_count(),
                sim.agent_count(),
                tick_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = now;

            if is_record_tick || is_last_tick {
                sim.record_snapshot(include_positions)?;
            }
        } else {
            trace!(
                "Tick [{}/{}] completed in {:.2} ms",
                tick + 1,
                total_ticks,
                tick_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds: {}/{} infected.",
        total_duration.as_secs_f64(),
        sim.infected_count(),
        sim.agent_count()
    );

    // --- Save Recorded Data ---
    if config.output.save_stats {
        let output_format = config.output.format.as_deref().unwrap_or("json");
        let snapshots = sim.recorded_snapshots();

        match output_format {
            "bincode" => {
                // Binary format (much more compact)
                let filename = format!("{}_snapshots.bin", config.output.base_filename);
                let file = File::create(&filename)?;
                bincode::serialize_into(file, snapshots)?;
                info!("All snapshots saved to {} (binary format)", filename);
            }
            "messagepack" => {
                // MessagePack format (compact and cross-platform)
                let filename = format!("{}_snapshots.msgpack", config.output.base_filename);
                let mut file = File::create(&filename)?;
                rmp_serde::encode::write(&mut file, snapshots)?;
                info!("All snapshots saved to {} (MessagePack format)", filename);
            }
            other => {
                if other != "json" {
                    error!("Unknown output format: {}. Using JSON instead.", other);
                }
                let filename = format!("{}_snapshots.json", config.output.base_filename);
                let file = File::create(&filename)?;
                serde_json::to_writer(file, snapshots)?;
                info!("All snapshots saved to {}", filename);
            }
        }
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    // Save final agent state if requested (separate from full snapshots)
    if config.output.save_positions {
        let filename = format!("{}_final_positions.csv", config.output.base_filename);

        let mut writer = csv::Writer::from_path(&filename)?;
        writer.write_record(["x", "y", "infected"])?;
        for agent in sim.agents() {
            writer.write_record(&[
                format!("{:.6}", agent.x),
                format!("{:.6}", agent.y),
                format!("{}", agent.infected),
            ])?;
        }
        writer.flush()?;
        info!("Final positions saved to {}", filename);
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
