//! Identifier types for violation records
//!
//! This module defines:
//! - RecordId: surrogate key assigned to every record at creation time

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// Unique identifier for a violation record
///
/// A RecordId is a wrapper around a UUID v4, generated once when the record
/// is created and persisted alongside it. Positions shift when earlier rows
/// are deleted; a RecordId never does, so edits addressed by id cannot land
/// on the wrong row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random RecordId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a RecordId from raw bytes
    ///
    /// Used for ids derived from row content (rows written before the
    /// `record_id` column existed).
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Get the raw bytes of this RecordId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Shortened form for display in tight listings (first 8 hex digits)
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ValidationError;

    /// Accepts standard UUID format (with or without hyphens).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ValidationError::MalformedId {
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_unique() {
        let a = RecordId::new();
        let b = RecordId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_id_display_parse() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_record_id_parse_simple_form() {
        let id = RecordId::new();
        let simple = id.to_string().replace('-', "");
        assert_eq!(simple.parse::<RecordId>().unwrap(), id);
    }

    #[test]
    fn test_record_id_parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<RecordId>().unwrap_err();
        assert!(matches!(err, ValidationError::MalformedId { .. }));
    }

    #[test]
    fn test_record_id_short() {
        let id = RecordId::from_bytes([0xab; 16]);
        assert_eq!(id.short(), "abababab");
    }

    #[test]
    fn test_record_id_serde_transparent() {
        let id = RecordId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
