//! Store file layout: header row plus one row per record
//!
//! ```text
//! timestamp,factory_area,inspection_section,violation_type,image_url,resolved,confirmed,record_id
//! 01/02/24 09:15 AM,A1,S3,NoHelmet,,False,False,5f0c...
//! ```
//!
//! Files written before the `record_id` column existed have a seven-column
//! header. Their rows (and any row whose `record_id` is left empty, as
//! happens when someone adds a line by hand) get an id derived from the
//! row's content, so every reader computes the same id for the same file.
//! The next write persists it.
//!
//! Position is deliberately not part of the derived id: when another writer
//! deletes a line from such a file, the rows after it keep their ids. Exact
//! duplicate rows are told apart by their occurrence among identical rows.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use vigil_core::{RecordId, ViolationRecord, COLUMNS, LEGACY_COLUMN_COUNT};
use xxhash_rust::xxh3::xxh3_128;

use super::row::{decode_rows, encode_row, RowError};

const BOM: char = '\u{feff}';

/// Table-level decoding failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct TableError {
    /// 1-based line of the offending row
    pub line: usize,
    /// What was wrong
    pub reason: String,
}

impl From<RowError> for TableError {
    fn from(e: RowError) -> Self {
        TableError {
            line: e.line(),
            reason: e.to_string(),
        }
    }
}

/// Encode a full document: header, then each record, `\n` terminated
pub fn encode_table(records: &[ViolationRecord]) -> String {
    let mut out = encode_row(&COLUMNS);
    out.push('\n');
    for record in records {
        out.push_str(&encode_row(&record.serialize()));
        out.push('\n');
    }
    out
}

/// Decode a full document into records in file order
///
/// An empty document is an empty record set. Any bad row fails the whole
/// decode; no partial set is returned.
pub fn decode_table(text: &str) -> Result<Vec<ViolationRecord>, TableError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut rows = decode_rows(text)?.into_iter();

    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };
    let has_id_column = check_header(&header.fields).map_err(|reason| TableError {
        line: header.line,
        reason,
    })?;

    let mut records = Vec::new();
    let mut seen = FxHashSet::default();
    let mut occurrences: FxHashMap<u128, usize> = FxHashMap::default();
    for row in rows {
        let stored_id = if has_id_column {
            row.fields
                .get(LEGACY_COLUMN_COUNT)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        } else {
            None
        };
        let parsed = match stored_id {
            Some(_) => ViolationRecord::parse(&row.fields),
            None => {
                let seen_before = occurrences.entry(content_hash(&row.fields)).or_insert(0);
                let id = derive_id(*seen_before, &row.fields);
                *seen_before += 1;
                ViolationRecord::parse_with_id(&row.fields, id)
            }
        };
        let record = parsed.map_err(|e| TableError {
            line: row.line,
            reason: e.to_string(),
        })?;
        if !seen.insert(record.id()) {
            return Err(TableError {
                line: row.line,
                reason: format!("duplicate record_id {}", record.id()),
            });
        }
        records.push(record);
    }
    Ok(records)
}

/// Validate the header; returns whether it carries the `record_id` column
fn check_header(fields: &[String]) -> Result<bool, String> {
    let matches = |expected: &[&str]| {
        fields.len() == expected.len()
            && fields
                .iter()
                .zip(expected)
                .all(|(have, want)| have.trim().eq_ignore_ascii_case(want))
    };
    if matches(&COLUMNS[..]) {
        Ok(true)
    } else if matches(&COLUMNS[..LEGACY_COLUMN_COUNT]) {
        Ok(false)
    } else {
        Err(format!(
            "unexpected header {:?}, expected {:?}",
            fields,
            COLUMNS
        ))
    }
}

fn content_hash<S: AsRef<str>>(fields: &[S]) -> u128 {
    let mut buf = Vec::with_capacity(128);
    for field in fields.iter().take(LEGACY_COLUMN_COUNT) {
        buf.extend_from_slice(field.as_ref().as_bytes());
        buf.push(0x1f);
    }
    xxh3_128(&buf)
}

/// Deterministic id for a row that has none
///
/// Hashes the seven content columns with `occurrence`, the number of
/// identical id-less rows above this one in the file.
pub fn derive_id<S: AsRef<str>>(occurrence: usize, fields: &[S]) -> RecordId {
    let mut buf = Vec::with_capacity(24);
    buf.extend_from_slice(&content_hash(fields).to_le_bytes());
    buf.extend_from_slice(&(occurrence as u64).to_le_bytes());
    RecordId::from_bytes(xxh3_128(&buf).to_le_bytes())
}
