//! The violation record and its row form
//!
//! A row is the ordered list of column values that the durability layer
//! writes as one line of the store file. Column order is fixed:
//!
//! ```text
//! timestamp, factory_area, inspection_section, violation_type,
//! image_url, resolved, confirmed, record_id
//! ```
//!
//! `record_id` was added after the first seven; rows without it are parsed
//! with [`ViolationRecord::parse_with_id`] and an id chosen by the caller.
//!
//! Round-trip law: `ViolationRecord::parse(&r.serialize()) == Ok(r)`.

use serde::Serialize;

use crate::error::ValidationError;
use crate::timestamp::ViolationTimestamp;
use crate::types::RecordId;

/// Column names, in file order
pub const COLUMNS: [&str; 8] = [
    "timestamp",
    "factory_area",
    "inspection_section",
    "violation_type",
    "image_url",
    "resolved",
    "confirmed",
    "record_id",
];

/// Number of columns in rows written before `record_id` existed
pub const LEGACY_COLUMN_COUNT: usize = 7;

/// Canonical token for `true`
pub const TRUE_TOKEN: &str = "True";
/// Canonical token for `false`
pub const FALSE_TOKEN: &str = "False";

const COL_TIMESTAMP: usize = 0;
const COL_AREA: usize = 1;
const COL_SECTION: usize = 2;
const COL_TYPE: usize = 3;
const COL_IMAGE: usize = 4;
const COL_RESOLVED: usize = 5;
const COL_CONFIRMED: usize = 6;
const COL_ID: usize = 7;

/// One detected safety violation
///
/// Only constructible through validation, so every value of this type
/// satisfies the persisted-record invariants: valid timestamp, non-empty
/// identifier fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ViolationRecord {
    id: RecordId,
    timestamp: ViolationTimestamp,
    factory_area: String,
    inspection_section: String,
    violation_type: String,
    image_url: Option<String>,
    resolved: bool,
    confirmed: bool,
}

impl ViolationRecord {
    /// Parse a full row (all eight columns)
    pub fn parse<S: AsRef<str>>(row: &[S]) -> Result<Self, ValidationError> {
        if row.len() != COLUMNS.len() {
            return Err(ValidationError::ColumnCount {
                expected: COLUMNS.len(),
                found: row.len(),
            });
        }
        let id_text = row[COL_ID].as_ref().trim();
        if id_text.is_empty() {
            return Err(ValidationError::MissingField {
                field: COLUMNS[COL_ID],
            });
        }
        let id: RecordId = id_text.parse()?;
        Self::parse_fields(row, id)
    }

    /// Parse a row whose id is supplied by the caller
    ///
    /// Accepts legacy seven-column rows and eight-column rows; in the latter
    /// case the `record_id` column is ignored.
    pub fn parse_with_id<S: AsRef<str>>(row: &[S], id: RecordId) -> Result<Self, ValidationError> {
        if row.len() != LEGACY_COLUMN_COUNT && row.len() != COLUMNS.len() {
            return Err(ValidationError::ColumnCount {
                expected: LEGACY_COLUMN_COUNT,
                found: row.len(),
            });
        }
        Self::parse_fields(row, id)
    }

    fn parse_fields<S: AsRef<str>>(row: &[S], id: RecordId) -> Result<Self, ValidationError> {
        let timestamp_text = row[COL_TIMESTAMP].as_ref().trim();
        if timestamp_text.is_empty() {
            return Err(ValidationError::MissingField {
                field: COLUMNS[COL_TIMESTAMP],
            });
        }
        Ok(ViolationRecord {
            id,
            timestamp: ViolationTimestamp::parse(timestamp_text)?,
            factory_area: required(COL_AREA, row[COL_AREA].as_ref())?,
            inspection_section: required(COL_SECTION, row[COL_SECTION].as_ref())?,
            violation_type: required(COL_TYPE, row[COL_TYPE].as_ref())?,
            image_url: optional(row[COL_IMAGE].as_ref()),
            resolved: parse_flag(COL_RESOLVED, row[COL_RESOLVED].as_ref())?,
            confirmed: parse_flag(COL_CONFIRMED, row[COL_CONFIRMED].as_ref())?,
        })
    }

    /// Serialize to a full eight-column row
    pub fn serialize(&self) -> Vec<String> {
        vec![
            self.timestamp.to_string(),
            self.factory_area.clone(),
            self.inspection_section.clone(),
            self.violation_type.clone(),
            self.image_url.clone().unwrap_or_default(),
            flag_token(self.resolved).to_string(),
            flag_token(self.confirmed).to_string(),
            self.id.to_string(),
        ]
    }

    /// Surrogate key
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// When the violation was captured
    pub fn timestamp(&self) -> ViolationTimestamp {
        self.timestamp
    }

    /// Factory area (for example `KP2,Jabar,Indonesia`)
    pub fn factory_area(&self) -> &str {
        &self.factory_area
    }

    /// Inspection section within the area
    pub fn inspection_section(&self) -> &str {
        &self.inspection_section
    }

    /// Kind of violation detected
    pub fn violation_type(&self) -> &str {
        &self.violation_type
    }

    /// Evidence reference, if any
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Whether the violation has been dealt with
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Whether a reviewer confirmed the detection
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Same content, different id
    ///
    /// Content equality ignores ids; this is how the change monitor decides
    /// whether a record was modified.
    pub fn same_content(&self, other: &ViolationRecord) -> bool {
        self.timestamp == other.timestamp
            && self.factory_area == other.factory_area
            && self.inspection_section == other.inspection_section
            && self.violation_type == other.violation_type
            && self.image_url == other.image_url
            && self.resolved == other.resolved
            && self.confirmed == other.confirmed
    }
}

fn required(col: usize, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField {
            field: COLUMNS[col],
        });
    }
    Ok(trimmed.to_string())
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_flag(col: usize, value: &str) -> Result<bool, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(false);
    }
    if trimmed.eq_ignore_ascii_case(TRUE_TOKEN) {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case(FALSE_TOKEN) {
        Ok(false)
    } else {
        Err(ValidationError::MalformedFlag {
            field: COLUMNS[col],
            value: value.to_string(),
        })
    }
}

fn flag_token(value: bool) -> &'static str {
    if value {
        TRUE_TOKEN
    } else {
        FALSE_TOKEN
    }
}

/// Field values for a record that does not exist yet
///
/// Holds raw user input; nothing is checked until [`RecordDraft::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    /// Timestamp text in the fixed pattern
    pub timestamp: String,
    /// Factory area
    pub factory_area: String,
    /// Inspection section
    pub inspection_section: String,
    /// Violation type
    pub violation_type: String,
    /// Evidence reference; empty means none
    pub image_url: String,
    /// Resolved flag
    pub resolved: bool,
    /// Confirmed flag
    pub confirmed: bool,
}

impl RecordDraft {
    /// Draft with the required fields; flags default to false
    pub fn new(
        timestamp: impl Into<String>,
        factory_area: impl Into<String>,
        inspection_section: impl Into<String>,
        violation_type: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            factory_area: factory_area.into(),
            inspection_section: inspection_section.into(),
            violation_type: violation_type.into(),
            ..Default::default()
        }
    }

    /// Set the evidence reference
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    /// Set the resolved flag
    pub fn with_resolved(mut self, resolved: bool) -> Self {
        self.resolved = resolved;
        self
    }

    /// Set the confirmed flag
    pub fn with_confirmed(mut self, confirmed: bool) -> Self {
        self.confirmed = confirmed;
        self
    }

    /// Validate into a record carrying `id`
    pub fn validate(&self, id: RecordId) -> Result<ViolationRecord, ValidationError> {
        let row = [
            self.timestamp.as_str(),
            self.factory_area.as_str(),
            self.inspection_section.as_str(),
            self.violation_type.as_str(),
            self.image_url.as_str(),
            flag_token(self.resolved),
            flag_token(self.confirmed),
        ];
        ViolationRecord::parse_with_id(&row, id)
    }
}

impl From<&ViolationRecord> for RecordDraft {
    fn from(record: &ViolationRecord) -> Self {
        Self {
            timestamp: record.timestamp.to_string(),
            factory_area: record.factory_area.clone(),
            inspection_section: record.inspection_section.clone(),
            violation_type: record.violation_type.clone(),
            image_url: record.image_url.clone().unwrap_or_default(),
            resolved: record.resolved,
            confirmed: record.confirmed,
        }
    }
}

/// Partial update: every `Some` field replaces the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    /// New timestamp text
    pub timestamp: Option<String>,
    /// New factory area
    pub factory_area: Option<String>,
    /// New inspection section
    pub inspection_section: Option<String>,
    /// New violation type
    pub violation_type: Option<String>,
    /// New evidence reference; `Some("")` clears it
    pub image_url: Option<String>,
    /// New resolved flag
    pub resolved: Option<bool>,
    /// New confirmed flag
    pub confirmed: Option<bool>,
}

impl RecordPatch {
    /// Patch that marks a record resolved
    pub fn resolve() -> Self {
        Self {
            resolved: Some(true),
            ..Default::default()
        }
    }

    /// Patch replacing every field with the draft's values
    pub fn replace_with(draft: RecordDraft) -> Self {
        Self {
            timestamp: Some(draft.timestamp),
            factory_area: Some(draft.factory_area),
            inspection_section: Some(draft.inspection_section),
            violation_type: Some(draft.violation_type),
            image_url: Some(draft.image_url),
            resolved: Some(draft.resolved),
            confirmed: Some(draft.confirmed),
        }
    }

    /// Set the resolved flag
    pub fn with_resolved(mut self, resolved: bool) -> Self {
        self.resolved = Some(resolved);
        self
    }

    /// Set the confirmed flag
    pub fn with_confirmed(mut self, confirmed: bool) -> Self {
        self.confirmed = Some(confirmed);
        self
    }

    /// Set the timestamp text
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Set the violation type
    pub fn with_violation_type(mut self, violation_type: impl Into<String>) -> Self {
        self.violation_type = Some(violation_type.into());
        self
    }

    /// True if applying this patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to `record`, re-validating the merged result
    ///
    /// The id is preserved.
    pub fn apply(&self, record: &ViolationRecord) -> Result<ViolationRecord, ValidationError> {
        let mut draft = RecordDraft::from(record);
        if let Some(v) = &self.timestamp {
            draft.timestamp = v.clone();
        }
        if let Some(v) = &self.factory_area {
            draft.factory_area = v.clone();
        }
        if let Some(v) = &self.inspection_section {
            draft.inspection_section = v.clone();
        }
        if let Some(v) = &self.violation_type {
            draft.violation_type = v.clone();
        }
        if let Some(v) = &self.image_url {
            draft.image_url = v.clone();
        }
        if let Some(v) = self.resolved {
            draft.resolved = v;
        }
        if let Some(v) = self.confirmed {
            draft.confirmed = v;
        }
        draft.validate(record.id)
    }
}
