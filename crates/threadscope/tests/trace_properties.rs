mod support;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use threadscope::{EventKind, ScopedLock, TraceError, TracedCondvar};

use support::{
    Capture, check_lifecycles, check_mutual_exclusion, check_time_non_decreasing, count,
};

#[test]
fn two_threads_sharing_one_lock() {
    let (emitter, capture) = Capture::emitter();
    let shared = Arc::new(parking_lot::Mutex::new(0u64));

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let emitter = Arc::clone(&emitter);
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let mut value = ScopedLock::new_in(&emitter, &*shared, "M").expect("lock M");
                *value += 1;
                thread::sleep(Duration::from_millis(2));
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker should finish");
    }

    let events = capture.events();
    assert_eq!(*shared.lock(), 2);
    assert_eq!(events.len(), 6);
    assert_eq!(count(&events, EventKind::LockAcquireAttempt, "M"), 2);
    assert_eq!(count(&events, EventKind::LockAcquired, "M"), 2);
    assert_eq!(count(&events, EventKind::LockReleased, "M"), 2);
    check_lifecycles(&events).expect("lifecycle grammar holds");
    check_mutual_exclusion(&events).expect("holds never overlap");
    check_time_non_decreasing(&events).expect("time never goes backwards");

    // Interval check by timestamp: the second holder acquires no earlier than
    // the first holder released.
    let acquired: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::LockAcquired)
        .collect();
    let first_release = events
        .iter()
        .find(|e| e.kind == EventKind::LockReleased && e.tid == acquired[0].tid)
        .expect("first holder released");
    assert!(acquired[1].time >= first_release.time);
}

#[test]
fn contended_workload_keeps_every_invariant() {
    let (emitter, capture) = Capture::emitter();
    let locks = Arc::new([
        (parking_lot::Mutex::new(0u64), "alpha"),
        (parking_lot::Mutex::new(0u64), "beta"),
        (parking_lot::Mutex::new(0u64), "gamma"),
    ]);

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let emitter = Arc::clone(&emitter);
            let locks = Arc::clone(&locks);
            thread::spawn(move || {
                for round in 0..50 {
                    let (lock, name) = &locks[(worker + round) % locks.len()];
                    let mut value = ScopedLock::new_in(&emitter, lock, *name).expect("lock");
                    *value += 1;
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker should finish");
    }

    let total: u64 = locks.iter().map(|(lock, _)| *lock.lock()).sum();
    assert_eq!(total, 8 * 50);

    let events = capture.events();
    assert_eq!(events.len(), 8 * 50 * 3);
    check_lifecycles(&events).expect("lifecycle grammar holds");
    check_mutual_exclusion(&events).expect("holds never overlap");
    check_time_non_decreasing(&events).expect("time never goes backwards");
}

#[test]
fn lock_order_inversion_stops_the_stream() {
    let (emitter, capture) = Capture::emitter();
    let a = Arc::new(parking_lot::Mutex::new(()));
    let b = Arc::new(parking_lot::Mutex::new(()));
    let rendezvous = Arc::new(Barrier::new(2));

    for (first, first_name, second, second_name) in [
        (Arc::clone(&a), "A", Arc::clone(&b), "B"),
        (Arc::clone(&b), "B", Arc::clone(&a), "A"),
    ] {
        let emitter = Arc::clone(&emitter);
        let rendezvous = Arc::clone(&rendezvous);
        // These threads deadlock by construction and are never joined.
        thread::spawn(move || {
            let _first = ScopedLock::new_in(&emitter, &*first, first_name).expect("first lock");
            rendezvous.wait();
            thread::sleep(Duration::from_millis(10));
            let _second =
                ScopedLock::new_in(&emitter, &*second, second_name).expect("second lock");
            unreachable!("lock-order inversion must deadlock");
        });
    }

    let events = capture.wait_for_events(6, Duration::from_secs(10));
    assert_eq!(events.len(), 6, "both workers should reach their second attempt");

    thread::sleep(Duration::from_millis(100));
    let settled = capture.events();
    assert_eq!(settled, events, "nothing may follow the stalled attempts");

    check_lifecycles(&settled).expect("lifecycle grammar holds");
    check_mutual_exclusion(&settled).expect("holds never overlap");
    assert_eq!(count(&settled, EventKind::LockReleased, "A"), 0);
    assert_eq!(count(&settled, EventKind::LockReleased, "B"), 0);

    let mut tids: Vec<_> = settled.iter().map(|e| e.tid.clone()).collect();
    tids.sort();
    tids.dedup();
    assert_eq!(tids.len(), 2);

    for tid in tids {
        let own: Vec<_> = settled.iter().filter(|e| e.tid == tid).collect();
        assert_eq!(own.len(), 3);
        assert_eq!(own[0].kind, EventKind::LockAcquireAttempt);
        assert_eq!(own[1].kind, EventKind::LockAcquired);
        assert_eq!(own[2].kind, EventKind::LockAcquireAttempt);
        assert_eq!(own[0].lock, own[1].lock);
        assert_ne!(own[1].lock, own[2].lock);
    }
}

#[derive(Debug)]
enum WorkError {
    Trace(TraceError),
    Rejected(u32),
}

impl From<TraceError> for WorkError {
    fn from(value: TraceError) -> Self {
        Self::Trace(value)
    }
}

fn reject_odd(
    emitter: &threadscope::Emitter,
    lock: &parking_lot::Mutex<Vec<u32>>,
    item: u32,
) -> Result<(), WorkError> {
    let mut items = ScopedLock::new_in(emitter, lock, "Items")?;
    if item % 2 == 1 {
        return Err(WorkError::Rejected(item));
    }
    items.push(item);
    Ok(())
}

#[test]
fn early_failure_releases_exactly_once() {
    let (emitter, capture) = Capture::emitter();
    let lock = parking_lot::Mutex::new(Vec::new());

    assert!(matches!(
        reject_odd(&emitter, &lock, 3),
        Err(WorkError::Rejected(3))
    ));
    let events = capture.events();
    assert_eq!(count(&events, EventKind::LockReleased, "Items"), 1);
    check_lifecycles(&events).expect("lifecycle grammar holds");

    reject_odd(&emitter, &lock, 4).expect("even items are accepted");
    assert_eq!(*lock.lock(), vec![4]);
    assert_eq!(
        count(&capture.events(), EventKind::LockReleased, "Items"),
        2
    );
}

#[test]
fn panic_inside_scope_still_records_release() {
    let (emitter, capture) = Capture::emitter();
    let lock = Arc::new(parking_lot::Mutex::new(()));

    let worker = {
        let emitter = Arc::clone(&emitter);
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            let _guard = ScopedLock::new_in(&emitter, &*lock, "Fragile").expect("lock");
            panic!("scope unwinds while holding the lock");
        })
    };
    assert!(worker.join().is_err());

    let events = capture.events();
    assert_eq!(count(&events, EventKind::LockReleased, "Fragile"), 1);
    check_lifecycles(&events).expect("lifecycle grammar holds");
    assert!(lock.try_lock().is_some());
}

/// Reusing one label for two primitives is not detected by the tracer; the
/// trace then shows two simultaneous holders of the same name.
#[test]
fn duplicate_label_is_ambiguous_in_the_trace() {
    let (emitter, capture) = Capture::emitter();
    let first = Arc::new(parking_lot::Mutex::new(()));
    let second = Arc::new(parking_lot::Mutex::new(()));
    let both_held = Arc::new(Barrier::new(2));

    let workers: Vec<_> = [first, second]
        .into_iter()
        .map(|lock| {
            let emitter = Arc::clone(&emitter);
            let both_held = Arc::clone(&both_held);
            thread::spawn(move || {
                let _guard = ScopedLock::new_in(&emitter, &*lock, "dup").expect("lock");
                both_held.wait();
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker should finish");
    }

    let events = capture.events();
    check_lifecycles(&events).expect("each pair is still well formed");
    assert!(
        check_mutual_exclusion(&events).is_err(),
        "two primitives named alike look like one lock held twice"
    );
}

#[test]
fn producer_consumer_handoff_is_well_formed() {
    let (emitter, capture) = Capture::emitter();
    let queue = Arc::new((
        parking_lot::Mutex::new((Vec::<u32>::new(), false)),
        TracedCondvar::new(),
    ));

    let producer = {
        let emitter = Arc::clone(&emitter);
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let (state, ready) = &*queue;
            for item in 0..5 {
                let mut guard = ScopedLock::new_in(&emitter, state, "QueueLock").expect("lock");
                guard.0.push(item);
                ready.notify_one();
            }
            let mut guard = ScopedLock::new_in(&emitter, state, "QueueLock").expect("lock");
            guard.1 = true;
            ready.notify_all();
        })
    };

    let consumer = {
        let emitter = Arc::clone(&emitter);
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let (state, ready) = &*queue;
            let mut seen = Vec::new();
            loop {
                let mut guard = ScopedLock::new_in(&emitter, state, "QueueLock").expect("lock");
                ready
                    .wait_while(&mut guard, |(items, done)| items.is_empty() && !*done)
                    .expect("wait");
                if !guard.0.is_empty() {
                    seen.extend(guard.0.drain(..));
                } else if guard.1 {
                    return seen;
                }
            }
        })
    };

    producer.join().expect("producer should finish");
    let seen = consumer.join().expect("consumer should finish");
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);

    let events = capture.events();
    check_lifecycles(&events).expect("lifecycle grammar holds");
    check_mutual_exclusion(&events).expect("condvar waits count as releases");
    check_time_non_decreasing(&events).expect("time never goes backwards");
    assert_eq!(
        count(&events, EventKind::CondvarWait, "QueueLock"),
        count(&events, EventKind::CondvarWoken, "QueueLock")
    );
}
