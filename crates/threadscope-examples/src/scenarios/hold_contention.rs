use std::sync::Arc;
use std::thread;
use std::time::Duration;

use threadscope::ScopedLock;

use crate::Config;
use crate::scenarios::{Crew, Outcome};

const HOLD: Duration = Duration::from_millis(500);

/// Every worker queues on one lock and keeps it for a long time, so the
/// trace shows a growing line of pending attempts.
pub fn run(cfg: &Config) -> Result<Outcome, String> {
    let workers = cfg.workers.unwrap_or(5);
    let lock = Arc::new(parking_lot::Mutex::new(()));
    let mut crew = Crew::new();

    tracing::info!(workers, hold_ms = HOLD.as_millis() as u64, "hold contention");
    for id in 1..=workers {
        let lock = Arc::clone(&lock);
        crew.spawn(format!("contention.worker.{id}"), move || {
            tracing::info!(worker = id, "trying to get the lock");
            let _held = ScopedLock::new(&*lock, "m1").map_err(|e| e.to_string())?;
            tracing::info!(worker = id, "holding the lock");
            thread::sleep(HOLD);
            Ok(())
        })?;
    }

    crew.wait(cfg.deadline)
}
