//! Drives a single forklift by hand: accept a task, step it cell by cell to
//! the dropoff, then let one tick close the task.

use wareflow::fleet::{Dimensions, Location, MaterialPriority};
use wareflow::{
    Forklift, ManualClock, Material, Position, Simulation, SimulationError, Task,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    wareflow::logging::init();

    let clock = ManualClock::new(0);
    let forklift = Forklift::new("forklift-1", "John Smith", Position::new(3, 4), 1000.0, 0);
    let task = Task::new(
        "task-1",
        Location::at(Position::new(3, 3)),
        Location::at(Position::new(34, 4)),
        Material {
            id: "mat-1".into(),
            name: "Machinery Parts".into(),
            weight: 450.0,
            dimensions: Dimensions {
                length: 1.2,
                width: 0.8,
                height: 1.0,
            },
            fragile: false,
            priority: MaterialPriority::High,
        },
        0,
    );
    let mut sim = Simulation::builder()
        .clock(clock.clone())
        .forklifts(vec![forklift])
        .tasks(vec![task])
        .build()?;

    sim.accept_task("task-1", "forklift-1")?;
    // generous bound over both legs, so a blocked forklift gives up
    let to_pickup = sim.forklift("forklift-1").map_or(0, |f| f.path.len());
    let to_dropoff = sim.task("task-1").map_or(0, |t| t.estimated_time as usize);
    let max_steps = (to_pickup + to_dropoff) * 2;
    for _ in 0..max_steps {
        clock.advance(500);
        match sim.complete_current_step("forklift-1") {
            Ok(outcome) => {
                if let Some(mv) = outcome.movement() {
                    println!("{} -> {} ({:?})", mv.from, mv.to, mv.kind);
                }
            }
            Err(SimulationError::NothingToAdvance(_)) => break,
            Err(err) => return Err(err.into()),
        }
    }

    clock.advance(500);
    let report = sim.tick();
    println!("completed this tick: {:?}", report.completed);
    if let Some(f) = sim.forklift("forklift-1") {
        println!(
            "{} is {} at {} after {} cells, {:.2}% fuel used",
            f.id,
            f.status,
            f.position,
            f.total_distance,
            f.fuel_consumed()
        );
    }
    Ok(())
}
