//! Id → position lookup over one loaded record set
//!
//! Positions shift on every delete, so an index is only valid for the
//! snapshot it was built from. It is rebuilt on each load and never cached
//! across store reads.

use rustc_hash::FxHashMap;
use vigil_core::{RecordId, ViolationRecord};

/// Position of every record id in a snapshot
#[derive(Debug, Default)]
pub struct RecordIndex {
    positions: FxHashMap<RecordId, usize>,
}

impl RecordIndex {
    /// Index `records`; ids are unique in any loaded snapshot
    pub fn build(records: &[ViolationRecord]) -> Self {
        let mut positions = FxHashMap::default();
        positions.reserve(records.len());
        for (position, record) in records.iter().enumerate() {
            positions.insert(record.id(), position);
        }
        Self { positions }
    }

    /// Position of `id`, if present
    pub fn position_of(&self, id: RecordId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Whether `id` is present
    pub fn contains(&self, id: RecordId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if the snapshot was empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
