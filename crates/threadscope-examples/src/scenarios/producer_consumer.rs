use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use threadscope::{ScopedLock, TracedCondvar};

use crate::Config;
use crate::scenarios::{Crew, Outcome};

const LOCK_NAME: &str = "QueueLock";
const ITEMS: u32 = 10;

#[derive(Default)]
struct Queue {
    items: VecDeque<u32>,
    finished: bool,
}

struct Shared {
    queue: parking_lot::Mutex<Queue>,
    not_empty: TracedCondvar,
}

pub fn run(cfg: &Config) -> Result<Outcome, String> {
    let consumers = cfg.workers.unwrap_or(1);
    let shared = Arc::new(Shared {
        queue: parking_lot::Mutex::new(Queue::default()),
        not_empty: TracedCondvar::new(),
    });
    let mut crew = Crew::new();

    tracing::info!(consumers, items = ITEMS, "producer/consumer");

    {
        let shared = Arc::clone(&shared);
        crew.spawn("producer", move || {
            for item in 0..ITEMS {
                thread::sleep(Duration::from_millis(100));
                let mut queue =
                    ScopedLock::new(&shared.queue, LOCK_NAME).map_err(|e| e.to_string())?;
                tracing::info!(item, "pushing");
                queue.items.push_back(item);
                drop(queue);
                shared.not_empty.notify_one();
            }

            let mut queue = ScopedLock::new(&shared.queue, LOCK_NAME).map_err(|e| e.to_string())?;
            queue.finished = true;
            drop(queue);
            shared.not_empty.notify_all();
            tracing::info!("producer finished");
            Ok(())
        })?;
    }

    for id in 1..=consumers {
        let shared = Arc::clone(&shared);
        crew.spawn(format!("consumer.{id}"), move || {
            loop {
                let mut queue =
                    ScopedLock::new(&shared.queue, LOCK_NAME).map_err(|e| e.to_string())?;
                shared
                    .not_empty
                    .wait_while(&mut queue, |q| q.items.is_empty() && !q.finished)
                    .map_err(|e| e.to_string())?;

                if let Some(item) = queue.items.pop_front() {
                    tracing::info!(consumer = id, item, "processing");
                } else if queue.finished {
                    break;
                }
            }
            tracing::info!(consumer = id, "consumer finished");
            Ok(())
        })?;
    }

    crew.wait(cfg.deadline)
}
