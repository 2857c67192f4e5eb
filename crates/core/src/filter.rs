//! Listing filters and display ordering
//!
//! Filters are plain conjunctions of exact-match fields; there is no query
//! language. Sorting only ever reorders a copy of a listing, never the store.

use serde::Serialize;

use crate::record::ViolationRecord;

/// A record together with its current position in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionedRecord {
    /// 0-based row position at the time of the read
    pub position: usize,
    /// The record
    pub record: ViolationRecord,
}

/// Conjunction of optional exact-match conditions
///
/// The default filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Match `violation_type`
    pub violation_type: Option<String>,
    /// Match `factory_area`
    pub factory_area: Option<String>,
    /// Match `inspection_section`
    pub inspection_section: Option<String>,
    /// Match the resolved flag
    pub resolved: Option<bool>,
    /// Match the confirmed flag
    pub confirmed: Option<bool>,
}

impl RecordFilter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching unresolved records
    pub fn unresolved() -> Self {
        Self {
            resolved: Some(false),
            ..Self::default()
        }
    }

    /// Restrict to a violation type
    pub fn with_violation_type(mut self, value: impl Into<String>) -> Self {
        self.violation_type = Some(value.into());
        self
    }

    /// Restrict to a factory area
    pub fn with_factory_area(mut self, value: impl Into<String>) -> Self {
        self.factory_area = Some(value.into());
        self
    }

    /// Restrict to an inspection section
    pub fn with_inspection_section(mut self, value: impl Into<String>) -> Self {
        self.inspection_section = Some(value.into());
        self
    }

    /// Restrict on the resolved flag
    pub fn with_resolved(mut self, value: bool) -> Self {
        self.resolved = Some(value);
        self
    }

    /// Restrict on the confirmed flag
    pub fn with_confirmed(mut self, value: bool) -> Self {
        self.confirmed = Some(value);
        self
    }

    /// Whether `record` satisfies every set condition
    pub fn matches(&self, record: &ViolationRecord) -> bool {
        fn text_ok(want: &Option<String>, have: &str) -> bool {
            want.as_deref().map_or(true, |w| w == have)
        }
        fn flag_ok(want: Option<bool>, have: bool) -> bool {
            want.map_or(true, |w| w == have)
        }

        text_ok(&self.violation_type, record.violation_type())
            && text_ok(&self.factory_area, record.factory_area())
            && text_ok(&self.inspection_section, record.inspection_section())
            && flag_ok(self.resolved, record.is_resolved())
            && flag_ok(self.confirmed, record.is_confirmed())
    }

    /// Apply to an ordered record set, keeping original positions
    pub fn select<'a, I>(&self, records: I) -> Vec<PositionedRecord>
    where
        I: IntoIterator<Item = &'a ViolationRecord>,
    {
        records
            .into_iter()
            .enumerate()
            .filter(|(_, r)| self.matches(r))
            .map(|(position, record)| PositionedRecord {
                position,
                record: record.clone(),
            })
            .collect()
    }
}

/// Display order for a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Store order (insertion order)
    #[default]
    Stored,
    /// Most recent timestamp first
    NewestFirst,
    /// Oldest timestamp first
    OldestFirst,
}

impl SortOrder {
    /// Sort a listing in place; ties keep store order
    pub fn apply(self, listing: &mut [PositionedRecord]) {
        match self {
            SortOrder::Stored => listing.sort_by_key(|p| p.position),
            SortOrder::NewestFirst => listing.sort_by(|a, b| {
                b.record
                    .timestamp()
                    .cmp(&a.record.timestamp())
                    .then(a.position.cmp(&b.position))
            }),
            SortOrder::OldestFirst => listing.sort_by(|a, b| {
                a.record
                    .timestamp()
                    .cmp(&b.record.timestamp())
                    .then(a.position.cmp(&b.position))
            }),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stored" => Ok(SortOrder::Stored),
            "newest" => Ok(SortOrder::NewestFirst),
            "oldest" => Ok(SortOrder::OldestFirst),
            other => Err(format!(
                "unknown sort order '{}', expected stored, newest or oldest",
                other
            )),
        }
    }
}
