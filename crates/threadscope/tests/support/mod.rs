#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use threadscope::{Emitter, Event, EventKind, Sink, ThreadTag};
use threadscope_types::decode_event_line;

/// In-memory sink shared between the emitter and the test.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn emitter() -> (Arc<Emitter>, Capture) {
        let capture = Capture::default();
        let emitter = Emitter::new(Sink::writer(capture.clone()));
        (Arc::new(emitter), capture)
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).expect("trace output should be utf8")
    }

    pub fn events(&self) -> Vec<Event> {
        self.text()
            .lines()
            .map(|line| decode_event_line(line).expect("every trace line should decode"))
            .collect()
    }

    /// Polls until at least `count` records arrived or `timeout` passed.
    pub fn wait_for_events(&self, count: usize, timeout: Duration) -> Vec<Event> {
        let deadline = Instant::now() + timeout;
        loop {
            let events = self.events();
            if events.len() >= count || Instant::now() >= deadline {
                return events;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairState {
    Idle,
    Attempting,
    Held,
    Waiting,
}

/// Checks the per-(thread, lock) lifecycle grammar:
/// `attempt (acquired (condvar_wait condvar_woken)* released | try_failed)`.
pub fn check_lifecycles(events: &[Event]) -> Result<(), String> {
    let mut states: HashMap<(&str, &str), PairState> = HashMap::new();
    for (index, event) in events.iter().enumerate() {
        let key = (event.tid.as_str(), event.lock.as_str());
        let state = states.entry(key).or_insert(PairState::Idle);
        let next = match (*state, event.kind) {
            (PairState::Idle, EventKind::LockAcquireAttempt) => PairState::Attempting,
            (PairState::Attempting, EventKind::LockAcquired) => PairState::Held,
            (PairState::Attempting, EventKind::LockTryFailed) => PairState::Idle,
            (PairState::Held, EventKind::CondvarWait) => PairState::Waiting,
            (PairState::Waiting, EventKind::CondvarWoken) => PairState::Held,
            (PairState::Held, EventKind::LockReleased) => PairState::Idle,
            (from, kind) => {
                return Err(format!(
                    "record {index}: thread {} lock {}: {kind} not allowed in state {from:?}",
                    event.tid, event.lock
                ));
            }
        };
        *state = next;
    }
    Ok(())
}

/// Checks that no two threads are ever shown holding the same lock name at
/// once, using stream order.
pub fn check_mutual_exclusion(events: &[Event]) -> Result<(), String> {
    let mut holders: HashMap<&str, &ThreadTag> = HashMap::new();
    for (index, event) in events.iter().enumerate() {
        let lock = event.lock.as_str();
        match event.kind {
            EventKind::LockAcquired | EventKind::CondvarWoken => {
                if let Some(holder) = holders.get(lock) {
                    return Err(format!(
                        "record {index}: thread {} acquired {lock} while thread {holder} holds it",
                        event.tid
                    ));
                }
                holders.insert(lock, &event.tid);
            }
            EventKind::LockReleased | EventKind::CondvarWait => {
                if holders.get(lock) != Some(&&event.tid) {
                    return Err(format!(
                        "record {index}: thread {} gave up {lock} without holding it",
                        event.tid
                    ));
                }
                holders.remove(lock);
            }
            EventKind::LockAcquireAttempt | EventKind::LockTryFailed => {}
        }
    }
    Ok(())
}

pub fn check_time_non_decreasing(events: &[Event]) -> Result<(), String> {
    for (index, pair) in events.windows(2).enumerate() {
        if pair[1].time < pair[0].time {
            return Err(format!(
                "record {}: time {} is before {}",
                index + 1,
                pair[1].time,
                pair[0].time
            ));
        }
    }
    Ok(())
}

pub fn count(events: &[Event], kind: EventKind, lock: &str) -> usize {
    events
        .iter()
        .filter(|e| e.kind == kind && e.lock.as_str() == lock)
        .count()
}
