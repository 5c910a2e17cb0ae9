pub mod barrier_rendezvous;
pub mod counter_increment;
pub mod hold_contention;
pub mod mutex_lock_order_inversion;
pub mod producer_consumer;

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

pub enum Outcome {
    Completed,
    /// Named workers that had not finished when the deadline passed.
    Stalled { pending: Vec<String> },
}

type WorkerReport = (String, Result<(), String>);

/// Named worker threads that can be waited on with a deadline.
///
/// Stalled workers are never joined, so a deadlocked scenario still lets the
/// process exit.
pub struct Crew {
    done_tx: mpsc::Sender<WorkerReport>,
    done_rx: mpsc::Receiver<WorkerReport>,
    pending: BTreeSet<String>,
}

impl Default for Crew {
    fn default() -> Self {
        let (done_tx, done_rx) = mpsc::channel();
        Self {
            done_tx,
            done_rx,
            pending: BTreeSet::new(),
        }
    }
}

impl Crew {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F) -> Result<(), String>
    where
        F: FnOnce() -> Result<(), String> + Send + 'static,
    {
        let name = name.into();
        let done_tx = self.done_tx.clone();
        let report_name = name.clone();
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                // A panicking worker still reports, so it is never mistaken for a stalled one.
                let result = panic::catch_unwind(AssertUnwindSafe(task))
                    .unwrap_or_else(|payload| Err(panic_message(payload.as_ref())));
                let _ = done_tx.send((report_name, result));
            })
            .map_err(|e| format!("failed to spawn {name}: {e}"))?;
        self.pending.insert(name);
        Ok(())
    }

    pub fn wait(self, deadline: Duration) -> Result<Outcome, String> {
        let Self {
            done_tx,
            done_rx,
            mut pending,
        } = self;
        // Only workers hold senders now; the channel closes once all of them are gone.
        drop(done_tx);

        let started = Instant::now();
        let mut failures = Vec::new();
        while !pending.is_empty() {
            let remaining = deadline.saturating_sub(started.elapsed());
            match done_rx.recv_timeout(remaining) {
                Ok((name, result)) => {
                    pending.remove(&name);
                    match result {
                        Ok(()) => tracing::debug!(worker = %name, "worker finished"),
                        Err(err) => failures.push(format!("{name}: {err}")),
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    return Ok(Outcome::Stalled {
                        pending: pending.into_iter().collect(),
                    });
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(format!(
                        "workers exited without reporting: {}",
                        pending.into_iter().collect::<Vec<_>>().join(", ")
                    ));
                }
            }
        }
        if failures.is_empty() {
            Ok(Outcome::Completed)
        } else {
            Err(failures.join("; "))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string payload".to_owned());
    format!("panicked: {detail}")
}
