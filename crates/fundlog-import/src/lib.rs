//! Bulk import and export of fund data.
//!
//! - [`source`] reads tabular rows from CSV or JSON files.
//! - [`resolve`] turns a raw row into typed field values.
//! - [`history`] replays dated rows into fund records, backdating the history
//!   snapshot each write produces.
//! - [`admin`] is the keyed-by-name bulk import/export used by operators.

pub mod admin;
pub mod error;
pub mod history;
pub mod resolve;
pub mod source;

pub use error::{Error, FundError, Result};
pub use history::{ImportReport, import_history};
pub use source::{Cell, Row, read_rows};
