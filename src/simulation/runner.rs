//! Periodic tick driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;

use super::Simulation;

/// Ticks a shared [`Simulation`] on a background thread.
///
/// The worker waits one tick period (re-read from the configuration every
/// cycle) and then ticks under the lock. Commands issued through
/// [`SimulationRunner::with`] take the same lock, so they never interleave
/// with a tick.
pub struct SimulationRunner {
    sim: Arc<Mutex<Simulation>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SimulationRunner {
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim: Arc::new(Mutex::new(sim)),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Shared handle to the simulation.
    pub fn simulation(&self) -> Arc<Mutex<Simulation>> {
        Arc::clone(&self.sim)
    }

    /// Runs `f` with exclusive access to the simulation.
    pub fn with<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> R {
        f(&mut self.sim.lock())
    }

    pub fn is_active(&self) -> bool {
        self.worker.is_some()
    }

    /// Sets the run flag and spawns the worker. Does nothing if already
    /// started.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        self.sim.lock().set_running(true);
        self.stop.store(false, Ordering::SeqCst);

        let sim = Arc::clone(&self.sim);
        let stop = Arc::clone(&self.stop);
        self.worker = Some(thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                let period = sim.lock().config().tick_period();
                let deadline = Instant::now() + period;
                loop {
                    if stop.load(Ordering::SeqCst) {
                        return;
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    thread::park_timeout(deadline - now);
                }
                sim.lock().tick();
            }
        }));
        tracing::info!("runner started");
    }

    /// Stops the worker, waits for it to exit and clears the run flag.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.stop.store(true, Ordering::SeqCst);
        worker.thread().unpark();
        if worker.join().is_err() {
            tracing::error!("runner worker panicked");
        }
        self.sim.lock().set_running(false);
        tracing::info!("runner stopped");
    }

    /// Stops the worker and hands back the simulation.
    ///
    /// Returns `None` if another handle from [`SimulationRunner::simulation`]
    /// is still alive.
    pub fn into_inner(mut self) -> Option<Simulation> {
        self.stop();
        let sim = Arc::clone(&self.sim);
        drop(self);
        Arc::try_unwrap(sim).ok().map(Mutex::into_inner)
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        self.stop();
    }
}
