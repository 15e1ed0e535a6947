//! History snapshots — the append-on-write log of a fund's past states.
//!
//! Every persist of a fund appends one snapshot. Snapshots are keyed by the
//! fund's identity rather than a live reference, so they outlive deletion of
//! the fund itself. A retention step run after each write keeps only the
//! newest [`HISTORY_LIMIT`] snapshots per fund, ordered by `history_date`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  fund::{FundFields, FundRecord},
};

/// Maximum number of snapshots kept per fund at rest.
pub const HISTORY_LIMIT: usize = 100;

/// What kind of write produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Created,
  Updated,
  Deleted,
}

impl ChangeKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Created => "created",
      Self::Updated => "updated",
      Self::Deleted => "deleted",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "created" => Ok(Self::Created),
      "updated" => Ok(Self::Updated),
      "deleted" => Ok(Self::Deleted),
      other => Err(Error::UnknownChangeKind(other.to_owned())),
    }
  }
}

/// A fund's field values as of `history_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
  /// Random, non-sequential identifier.
  pub history_id:   Uuid,
  pub fund_id:      Uuid,
  /// Write time by default; the importer may move it to a source date.
  pub history_date: DateTime<Utc>,
  pub change_kind:  ChangeKind,
  /// The record's `updated_at` when the snapshot was taken.
  pub updated_at:   DateTime<Utc>,
  #[serde(flatten)]
  pub fields:       FundFields,
}

impl HistorySnapshot {
  /// Capture `record` as it stands after a write of kind `change_kind`.
  pub fn capture(record: &FundRecord, change_kind: ChangeKind) -> Self {
    Self {
      history_id: Uuid::new_v4(),
      fund_id: record.fund_id,
      history_date: Utc::now(),
      change_kind,
      updated_at: record.updated_at,
      fields: record.fields.clone(),
    }
  }
}

/// The outcome of a write that went through the history log.
#[derive(Debug, Clone)]
pub struct Persisted {
  pub fund:     FundRecord,
  /// The snapshot appended by this write, identified without re-querying.
  pub snapshot: HistorySnapshot,
  /// Snapshots removed by the retention step that followed the write.
  pub trimmed:  usize,
}
