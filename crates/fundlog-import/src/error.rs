//! Error types for `fundlog-import`.
//!
//! [`Error`] aborts a whole run before anything is written. [`FundError`]
//! fails a single fund (or a single admin row) and is reported alongside the
//! outcomes of the others.

use std::path::PathBuf;

use thiserror::Error;

/// A failure that makes the whole source unusable.
#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot read {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("unsupported source format: {0:?} (expected .csv, .json or a workbook)")]
  UnsupportedFormat(String),

  #[error("sheet not found: {0:?}")]
  SheetNotFound(String),

  #[error("malformed row {line}: {reason}")]
  MalformedRow { line: usize, reason: String },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("workbook error: {0}")]
  Workbook(#[from] calamine::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A failure scoped to one fund group or one admin row.
#[derive(Debug, Error)]
pub enum FundError {
  #[error("row {line} has no fund name")]
  MissingName { line: usize },

  #[error("row {line} has an unreadable date: {value:?}")]
  InvalidDate { line: usize, value: String },

  #[error(transparent)]
  Core(#[from] fundlog_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FundError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
