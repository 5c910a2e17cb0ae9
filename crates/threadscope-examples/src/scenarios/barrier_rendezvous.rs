use std::sync::Arc;
use std::thread;
use std::time::Duration;

use threadscope::{ScopedLock, TraceError, TracedCondvar};

use crate::Config;
use crate::scenarios::{Crew, Outcome};

const LOCK_NAME: &str = "BarrierLock";

struct Phase {
    arrived: usize,
    generation: u64,
}

/// Reusable barrier whose internal mutex and condition variable are traced.
struct TracedBarrier {
    parties: usize,
    phase: parking_lot::Mutex<Phase>,
    all_arrived: TracedCondvar,
}

impl TracedBarrier {
    fn new(parties: usize) -> Self {
        Self {
            parties,
            phase: parking_lot::Mutex::new(Phase {
                arrived: 0,
                generation: 0,
            }),
            all_arrived: TracedCondvar::new(),
        }
    }

    /// Returns `true` for the worker that completed the phase.
    fn wait(&self) -> Result<bool, TraceError> {
        let mut phase = ScopedLock::new(&self.phase, LOCK_NAME)?;
        phase.arrived += 1;
        if phase.arrived == self.parties {
            phase.arrived = 0;
            phase.generation += 1;
            self.all_arrived.notify_all();
            return Ok(true);
        }

        let generation = phase.generation;
        self.all_arrived
            .wait_while(&mut phase, |phase| phase.generation == generation)?;
        Ok(false)
    }
}

pub fn run(cfg: &Config) -> Result<Outcome, String> {
    let workers = cfg.workers.unwrap_or(4);
    let barrier = Arc::new(TracedBarrier::new(workers));
    let mut crew = Crew::new();

    tracing::info!(workers, "barrier rendezvous");
    for id in 1..=workers {
        let barrier = Arc::clone(&barrier);
        crew.spawn(format!("barrier.worker.{id}"), move || {
            tracing::info!(worker = id, "starting phase 1");
            thread::sleep(Duration::from_millis(50 * id as u64));
            tracing::info!(worker = id, "finished phase 1, waiting at barrier");

            let leader = barrier.wait().map_err(|e| e.to_string())?;

            tracing::info!(worker = id, leader, "passed barrier, starting phase 2");
            thread::sleep(Duration::from_millis(100));
            tracing::info!(worker = id, "finished");
            Ok(())
        })?;
    }

    crew.wait(cfg.deadline)
}
