//! What survives interrupted writes and hand edits

use std::fs;

use crate::common::*;
use vigil::AtomicStore;

#[test]
fn crash_leftovers_are_invisible_and_cleaned() {
    let t = TestStore::new();
    t.store.create(&helmet()).unwrap();

    // A writer that died after writing its temp file but before the rename
    let leftover = t.dir.path().join(".violations.csv.31337.0.tmp");
    fs::write(&leftover, "timestamp,factory_area\npartial").unwrap();

    assert_eq!(t.store.records().unwrap().len(), 1);
    let reopened = t.reopen();
    assert_eq!(reopened.records().unwrap().len(), 1);
    // The next writer sweeps it
    reopened.resolve(reopened.records().unwrap()[0].id()).unwrap();
    assert!(!leftover.exists());
    assert_eq!(reopened.records().unwrap().len(), 1);
}

#[test]
fn hand_edited_garbage_is_reported_not_guessed() {
    let t = TestStore::new();
    t.store.create(&helmet()).unwrap();
    let mut text = fs::read_to_string(t.path()).unwrap();
    text.push_str("01/02/24 09:15 AM,A1,S3\n");
    fs::write(t.path(), text).unwrap();

    match t.store.records() {
        Err(Error::StoreCorrupt { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected StoreCorrupt, got {:?}", other),
    }
    // A mutation refuses to rewrite a file it cannot read
    assert!(t.store.create(&helmet()).is_err());
}

#[test]
fn crlf_and_bom_files_load() {
    let t = TestStore::new();
    fs::write(
        t.path(),
        "\u{feff}timestamp,factory_area,inspection_section,violation_type,image_url,resolved,confirmed\r\n\
         01/02/24 09:15 AM,A1,S3,NoHelmet,,false,FALSE\r\n",
    )
    .unwrap();
    let records = AtomicStore::new(t.path()).load().unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_resolved());
}
