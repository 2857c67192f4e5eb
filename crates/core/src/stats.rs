//! Summary counts over a record set

use serde::Serialize;

use crate::record::ViolationRecord;

/// Totals reported by `status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ViolationStats {
    /// Number of records
    pub total: usize,
    /// Records not yet resolved
    pub unresolved: usize,
    /// Records resolved
    pub resolved: usize,
    /// Records confirmed by a reviewer
    pub confirmed: usize,
}

impl ViolationStats {
    /// Count over any sequence of records
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ViolationRecord>,
    {
        records.into_iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            if r.is_resolved() {
                acc.resolved += 1;
            } else {
                acc.unresolved += 1;
            }
            if r.is_confirmed() {
                acc.confirmed += 1;
            }
            acc
        })
    }

    /// Percentage of records resolved; 0.0 for an empty store
    pub fn resolution_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.resolved as f64 / self.total as f64 * 100.0
    }
}
