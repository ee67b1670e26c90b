use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlrow::{Database, OpenOptions, Order, Predicate, Query, Record, Row, Value};
use tempfile::tempdir;

const NUM_THREADS: usize = 8;
const OPERATIONS_PER_THREAD: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Event {
    id: u32,
    worker: u32,
    seen: bool,
}

impl Record for Event {
    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }
}

#[test]
fn threads_share_one_engine() {
    let dir = tempdir().expect("temp dir");
    let options = OpenOptions {
        busy_timeout: Some(Duration::from_secs(5)),
        ..OpenOptions::wal()
    };
    let db = Arc::new(Database::with_options(dir.path().join("events.sqlite"), options));
    db.ensure::<Event>().expect("create");

    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|worker| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..OPERATIONS_PER_THREAD {
                    let event = Event {
                        id: (worker * OPERATIONS_PER_THREAD + i) as u32,
                        worker: worker as u32,
                        seen: false,
                    };
                    db.insert(&event).expect("insert");
                }
                let mut set = Row::new();
                set.set("seen", Value::from(true));
                db.update_where::<Event>(set, Some(&Predicate::eq("worker", worker as u32)))
                    .expect("mark seen")
            })
        })
        .collect();

    for handle in handles {
        let updated = handle.join().expect("worker panicked");
        assert_eq!(updated, OPERATIONS_PER_THREAD as u64);
    }

    let events: Vec<Event> = db
        .select(&Query::new().order_by(Order::asc("id")))
        .expect("select");
    assert_eq!(events.len(), NUM_THREADS * OPERATIONS_PER_THREAD);
    assert!(events.iter().all(|event| event.seen));
    assert!(events
        .iter()
        .enumerate()
        .all(|(idx, event)| event.id as usize == idx));
}

#[test]
fn close_and_reconnect_race_safely() {
    let dir = tempdir().expect("temp dir");
    let db = Arc::new(Database::open(dir.path().join("reconnect.sqlite")));
    db.ensure::<Event>().expect("create");

    let handles: Vec<_> = (0..4u32)
        .map(|worker| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for i in 0..20u32 {
                    db.insert(&Event {
                        id: worker * 100 + i,
                        worker,
                        seen: false,
                    })
                    .expect("insert");
                    if i % 5 == 0 {
                        db.close().expect("close");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let count: Vec<Event> = db.select(&Query::new()).expect("select");
    assert_eq!(count.len(), 80);
}
