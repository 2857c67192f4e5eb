//! Many editors on one store
//!
//! Each thread opens its own ViolationStore, and so its own lock handle,
//! which contends exactly like a separate process.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use crate::common::*;

#[test]
fn mixed_editors_lose_nothing() {
    let t = TestStore::new();
    for i in 0..8 {
        t.store.create(&draft_in("seed", &format!("S{}", i))).unwrap();
    }
    let seeded: Vec<_> = t.store.records().unwrap().iter().map(|r| r.id()).collect();

    let barrier = Arc::new(Barrier::new(3));
    let creator = {
        let config = t.config();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let store = ViolationStore::open(config).unwrap();
            barrier.wait();
            for i in 0..10 {
                store.create(&draft_in("new", &format!("N{}", i))).unwrap();
            }
        })
    };
    let resolver = {
        let config = t.config();
        let barrier = Arc::clone(&barrier);
        let ids = seeded.clone();
        thread::spawn(move || {
            let store = ViolationStore::open(config).unwrap();
            barrier.wait();
            for id in ids.iter().step_by(2) {
                store.resolve(*id).unwrap();
            }
        })
    };
    let deleter = {
        let config = t.config();
        let barrier = Arc::clone(&barrier);
        let ids = seeded.clone();
        thread::spawn(move || {
            let store = ViolationStore::open(config).unwrap();
            barrier.wait();
            for id in ids.iter().skip(1).step_by(4) {
                store.delete_by_id(*id).unwrap();
            }
        })
    };
    for h in [creator, resolver, deleter] {
        h.join().unwrap();
    }

    let records = t.store.records().unwrap();
    // 8 seeded - 2 deleted (ids 1 and 5) + 10 created
    assert_eq!(records.len(), 16);
    assert_eq!(records.iter().filter(|r| r.factory_area() == "new").count(), 10);
    for (i, id) in seeded.iter().enumerate() {
        let found = t.store.get(*id);
        if i % 4 == 1 {
            assert!(matches!(found, Err(Error::RecordNotFound(_))));
        } else {
            assert_eq!(found.unwrap().record.is_resolved(), i % 2 == 0);
        }
    }
}

#[test]
fn timed_out_editor_changes_nothing() {
    let t = TestStore::new();
    t.store.create(&helmet()).unwrap();
    let before = std::fs::read(t.path()).unwrap();

    let _guard = t.store.coordinator().acquire().unwrap();
    // Opening and reading never wait on the lock
    let impatient =
        ViolationStore::open(t.config().with_lock_timeout(Duration::from_millis(50))).unwrap();
    assert_eq!(impatient.records().unwrap().len(), 1);
    assert!(impatient.delete(0).unwrap_err().is_retryable());
    assert_eq!(std::fs::read(t.path()).unwrap(), before);
}
