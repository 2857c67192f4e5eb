//! Change detection completeness

use std::collections::HashMap;
use std::time::Duration;

use crate::common::*;
use vigil::{ChangeEvent, RecordId};

fn net_by_id(events: &[ChangeEvent]) -> HashMap<RecordId, ChangeKind> {
    let mut net = HashMap::new();
    for e in events {
        assert!(
            net.insert(e.record.id(), e.kind).is_none(),
            "one event per record per poll"
        );
    }
    net
}

#[test]
fn every_net_change_reported_once() {
    let t = TestStore::new();
    for i in 0..6 {
        t.store.create(&draft_in("A", &format!("S{}", i))).unwrap();
    }
    let ids: Vec<_> = t.store.records().unwrap().iter().map(|r| r.id()).collect();
    let mut monitor = t.store.monitor().unwrap();

    let editor = t.reopen();
    editor.delete_by_id(ids[0]).unwrap();
    editor.resolve(ids[3]).unwrap();
    // Modified then reverted: no net change
    editor
        .update_by_id(ids[4], &RecordPatch::default().with_confirmed(true))
        .unwrap();
    editor
        .update_by_id(ids[4], &RecordPatch::default().with_confirmed(false))
        .unwrap();
    // Added then removed: no net change
    let transient = editor.create(&helmet()).unwrap().record.id();
    editor.delete_by_id(transient).unwrap();
    let added = editor.create(&helmet()).unwrap().record.id();

    let events = monitor.poll_once().unwrap();
    let net = net_by_id(&events);
    assert_eq!(net.len(), 3);
    assert_eq!(net[&ids[0]], ChangeKind::Removed);
    assert_eq!(net[&ids[3]], ChangeKind::Modified);
    assert_eq!(net[&added], ChangeKind::Added);

    // Removals first, the rest in ascending position
    assert_eq!(events[0].kind, ChangeKind::Removed);
    assert!(events[1..].windows(2).all(|w| w[0].position < w[1].position));
}

#[test]
fn background_alerts_only_for_unresolved_additions() {
    let t = TestStore::new();
    let monitor = t.store.monitor().unwrap();
    let rx = monitor.subscribe();
    let handle = monitor.spawn().unwrap();

    let editor = t.reopen();
    editor.create(&helmet().with_resolved(true)).unwrap();
    let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(!first.is_new_alert());

    editor.create(&helmet()).unwrap();
    let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(second.is_new_alert());
    assert_eq!(second.position, 1);

    handle.stop();
}
