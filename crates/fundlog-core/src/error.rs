//! Error types for `fundlog-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("fund not found: {0}")]
  FundNotFound(Uuid),

  #[error("article not found: {0}")]
  ArticleNotFound(Uuid),

  #[error("history snapshot not found: {0}")]
  SnapshotNotFound(Uuid),

  #[error("required field `{0}` has no value")]
  MissingField(&'static str),

  #[error("more than one fund is named {0:?}")]
  DuplicateFundName(String),

  #[error("unknown change kind: {0:?}")]
  UnknownChangeKind(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
