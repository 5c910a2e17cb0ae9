use std::sync::Arc;
use std::thread;
use std::time::Duration;

use threadscope::ScopedLock;

use crate::Config;
use crate::scenarios::{Crew, Outcome};

const ROUNDS: usize = 5;

pub fn run(cfg: &Config) -> Result<Outcome, String> {
    let workers = cfg.workers.unwrap_or(2);
    let counter = Arc::new(parking_lot::Mutex::new(0u64));
    let mut crew = Crew::new();

    tracing::info!(workers, "counter increment: no deadlock expected");
    for id in 1..=workers {
        let counter = Arc::clone(&counter);
        crew.spawn(format!("counter.worker.{id}"), move || {
            for _ in 0..ROUNDS {
                {
                    let mut value = ScopedLock::new(&*counter, "SharedCounterMutex")
                        .map_err(|e| e.to_string())?;
                    *value += 1;
                    tracing::info!(worker = id, counter = *value, "incremented");
                    thread::sleep(Duration::from_millis(50));
                }
                thread::sleep(Duration::from_millis(20));
            }
            Ok(())
        })?;
    }

    let outcome = crew.wait(cfg.deadline)?;
    if let Outcome::Completed = outcome {
        tracing::info!(total = *counter.lock(), "final counter value");
    }
    Ok(outcome)
}
