//! Net differences between two snapshots of the store

use serde::Serialize;
use std::fmt;
use vigil_core::ViolationRecord;

use crate::index::RecordIndex;

/// How a record changed between two polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present now, absent before
    Added,
    /// Present in both with different content
    Modified,
    /// Present before, absent now
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        })
    }
}

/// One net change to one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    /// What happened
    pub kind: ChangeKind,
    /// New position, or the last known position for `Removed`
    pub position: usize,
    /// New content, or the last known content for `Removed`
    pub record: ViolationRecord,
}

impl ChangeEvent {
    /// A newly reported violation nobody has resolved yet
    pub fn is_new_alert(&self) -> bool {
        self.kind == ChangeKind::Added && !self.record.is_resolved()
    }
}

/// Diff two snapshots by record id
///
/// Removals come first in ascending old position, then additions and
/// modifications in ascending new position. A record that only moved
/// because an earlier one was deleted is not reported.
pub fn diff_records(old: &[ViolationRecord], new: &[ViolationRecord]) -> Vec<ChangeEvent> {
    let old_index = RecordIndex::build(old);
    let new_index = RecordIndex::build(new);
    let mut events = Vec::new();

    for (position, record) in old.iter().enumerate() {
        if !new_index.contains(record.id()) {
            events.push(ChangeEvent {
                kind: ChangeKind::Removed,
                position,
                record: record.clone(),
            });
        }
    }

    for (position, record) in new.iter().enumerate() {
        let kind = match old_index.position_of(record.id()) {
            None => ChangeKind::Added,
            Some(before) if !old[before].same_content(record) => ChangeKind::Modified,
            Some(_) => continue,
        };
        events.push(ChangeEvent {
            kind,
            position,
            record: record.clone(),
        });
    }

    events
}
