//! Minute-precision violation timestamp
//!
//! Camera events are stamped with the fixed textual pattern
//! `MM/DD/YY HH:MM AM/PM` (for example `01/02/24 09:15 AM`).
//!
//! ## Lossless parsing
//!
//! chrono accepts some variants of the pattern (unpadded fields, lower-case
//! meridiem). Those would re-render differently, so [`ViolationTimestamp::parse`]
//! only accepts text that renders back to exactly the same characters.
//!
//! ```
//! use vigil_core::ViolationTimestamp;
//!
//! let ts = ViolationTimestamp::parse("01/02/24 09:15 AM").unwrap();
//! assert_eq!(ts.to_string(), "01/02/24 09:15 AM");
//! assert!(ViolationTimestamp::parse("1/2/24 9:15 am").is_err());
//! ```

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// chrono format string for the fixed timestamp pattern
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%y %I:%M %p";

/// Point in time at which a violation was captured
///
/// ## Invariants
///
/// - Seconds and sub-seconds are always zero
/// - `parse(ts.to_string()) == ts`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViolationTimestamp(NaiveDateTime);

impl ViolationTimestamp {
    /// Parse the fixed `MM/DD/YY HH:MM AM/PM` pattern
    ///
    /// # Errors
    ///
    /// `ValidationError::MalformedTimestamp` if the text does not match the
    /// pattern or does not render back to itself.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedTimestamp {
            value: text.to_string(),
        };
        let parsed = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|_| malformed())?;
        let ts = Self(parsed);
        if ts.to_string() != text {
            return Err(malformed());
        }
        Ok(ts)
    }

    /// Wrap a chrono value, truncating it to the minute
    pub fn from_naive(value: NaiveDateTime) -> Self {
        let truncated = value
            .with_second(0)
            .and_then(|v| v.with_nanosecond(0))
            .unwrap_or(value);
        Self(truncated)
    }

    /// Current local wall-clock time, truncated to the minute
    pub fn now() -> Self {
        Self::from_naive(Local::now().naive_local())
    }

    /// The underlying chrono value
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for ViolationTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for ViolationTimestamp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ViolationTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ViolationTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
