use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use threadscope::ScopedLock;

use crate::Config;
use crate::scenarios::{Crew, Outcome};

fn spawn_lock_order_worker(
    crew: &mut Crew,
    worker_name: &'static str,
    first_name: &'static str,
    first: Arc<parking_lot::Mutex<()>>,
    second_name: &'static str,
    second: Arc<parking_lot::Mutex<()>>,
    ready_barrier: Arc<Barrier>,
) -> Result<(), String> {
    crew.spawn(worker_name, move || {
        let _first_guard = ScopedLock::new(&*first, first_name).map_err(|e| e.to_string())?;
        tracing::info!("{worker_name} locked {first_name}; waiting for peer");

        ready_barrier.wait();
        thread::sleep(Duration::from_millis(100));

        tracing::info!(
            "{worker_name} attempting {second_name}; this should deadlock due to lock-order inversion"
        );
        let _second_guard = ScopedLock::new(&*second, second_name).map_err(|e| e.to_string())?;

        tracing::warn!("{worker_name} unexpectedly acquired {second_name}; deadlock did not occur");
        Ok(())
    })
}

pub fn run(cfg: &Config) -> Result<Outcome, String> {
    let left = Arc::new(parking_lot::Mutex::new(()));
    let right = Arc::new(parking_lot::Mutex::new(()));
    let ready_barrier = Arc::new(Barrier::new(2));
    let mut crew = Crew::new();

    spawn_lock_order_worker(
        &mut crew,
        "deadlock.worker.alpha",
        "A",
        Arc::clone(&left),
        "B",
        Arc::clone(&right),
        Arc::clone(&ready_barrier),
    )?;

    spawn_lock_order_worker(
        &mut crew,
        "deadlock.worker.beta",
        "B",
        Arc::clone(&right),
        "A",
        Arc::clone(&left),
        Arc::clone(&ready_barrier),
    )?;

    tracing::info!(
        deadline_ms = cfg.deadline.as_millis() as u64,
        "two workers should deadlock on A/B; the trace ends at their second attempts"
    );
    crew.wait(cfg.deadline)
}
