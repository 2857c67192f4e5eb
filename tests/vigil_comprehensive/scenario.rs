//! Editing-client lifecycle

use crate::common::*;

#[test]
fn create_list_update_delete() {
    let t = TestStore::new();
    let store = &t.store;
    assert!(store.list(&RecordFilter::all()).unwrap().is_empty());

    store.create(&helmet()).unwrap();

    let listing = store.list(&RecordFilter::all()).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].position, 0);
    let r = &listing[0].record;
    assert_eq!(r.timestamp().to_string(), "01/02/24 09:15 AM");
    assert_eq!(
        (r.factory_area(), r.inspection_section(), r.violation_type()),
        ("A1", "S3", "NoHelmet")
    );

    store.update(0, &RecordPatch::resolve()).unwrap();
    assert!(store.list(&RecordFilter::all()).unwrap()[0].record.is_resolved());
    assert!(store.list(&RecordFilter::unresolved()).unwrap().is_empty());

    store.delete(0).unwrap();
    assert!(store.list(&RecordFilter::all()).unwrap().is_empty());
}

#[test]
fn fields_with_delimiters_round_trip() {
    let t = TestStore::new();
    let awkward = RecordDraft::new(
        "12/31/23 11:59 PM",
        "KP2, Jabar, Indonesia",
        "Line \"B\"\nnorth end",
        "Shoes are not on the shoe rack",
    )
    .with_image_url("https://cctv.example/clips/a,b.mp4");
    let created = t.store.create(&awkward).unwrap();

    let reread = t.reopen().get(created.record.id()).unwrap().record;
    assert_eq!(reread, created.record);
    assert_eq!(reread.inspection_section(), "Line \"B\"\nnorth end");
}

#[test]
fn stats_track_resolution() {
    let t = TestStore::new();
    for i in 0..4 {
        t.store.create(&draft_in("A1", &format!("S{}", i))).unwrap();
    }
    t.store.update(1, &RecordPatch::resolve()).unwrap();
    t.store
        .update(2, &RecordPatch::resolve().with_confirmed(true))
        .unwrap();

    let stats = t.store.stats().unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.resolved, 2);
    assert_eq!(stats.unresolved, 2);
    assert_eq!(stats.confirmed, 1);
    assert!((stats.resolution_rate() - 50.0).abs() < 1e-9);
}

#[test]
fn rejected_input_reports_the_field() {
    let t = TestStore::new();
    let err = t
        .store
        .create(&RecordDraft::new("01/02/24 09:15 AM", "", "S3", "NoHelmet"))
        .unwrap_err();
    assert!(err.to_string().contains("factory_area"), "{}", err);
    assert!(!t.path().exists());
}
