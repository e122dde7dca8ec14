//! Runs the default warehouse on a background thread for a few seconds and
//! prints where everything ended up.
//!
//! ```sh
//! RUST_LOG=wareflow=debug cargo run --example auto_run
//! ```

use std::thread;
use std::time::Duration;

use wareflow::{Simulation, SimulationConfig, SimulationRunner};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    wareflow::logging::init();

    let config = SimulationConfig {
        speed: 3.0,
        learn_from_moves: true,
        ..SimulationConfig::default()
    };
    let mut sim = Simulation::new(config)?;
    let ids: Vec<String> = sim.forklifts().iter().map(|f| f.id.clone()).collect();
    for id in &ids {
        sim.login(id)?;
    }

    let mut runner = SimulationRunner::new(sim);
    runner.start();
    for _ in 0..10 {
        thread::sleep(Duration::from_secs(1));
        runner.with(|sim| {
            sim.add_random_task();
        });
    }
    runner.stop();

    let snapshot = runner.with(|sim| sim.snapshot());
    println!("ticks: {}", snapshot.tick);
    for f in &snapshot.forklifts {
        println!(
            "{:<12} {:<9} at {:<9} fuel {:>5.1}% done {}",
            f.id, f.status, f.position, f.fuel_level, f.tasks_completed
        );
    }
    let m = &snapshot.metrics;
    println!(
        "tasks {}/{} completed, avg {:.0} ms, {:.0} kg moved, {} collisions",
        m.completed_tasks, m.total_tasks, m.average_time_ms, m.total_weight_moved, m.collision_count
    );
    println!(
        "q-table states: {}, exploration {:.4}",
        snapshot.q_states, snapshot.exploration_rate
    );
    for alert in snapshot.unresolved_alerts() {
        println!("[{}] {}", alert.kind, alert.message);
    }
    Ok(())
}
