//! On-disk text format for the record store.
//!
//! Keeping serialization separate from operational logic (how the store
//! file is replaced) makes format evolution easier to manage.
//!
//! # Module Structure
//!
//! - `row`: delimited-text row codec (quoting, line endings)
//! - `table`: header validation, record rows, legacy id derivation

pub mod row;
pub mod table;

pub use row::{decode_rows, encode_row, DecodedRow, RowError, RowReader};
pub use table::{decode_table, derive_id, encode_table, TableError};
