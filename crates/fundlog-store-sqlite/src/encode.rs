//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order in SQL matches chronological
//! order. UUIDs are stored as hyphenated lowercase strings. Fund fields map
//! directly onto `TEXT`/`REAL` columns.

use chrono::{DateTime, SecondsFormat, Utc};
use fundlog_core::{
  article::FundArticle,
  fund::{FundFields, FundRecord},
  history::{ChangeKind, HistorySnapshot},
};
use rusqlite::{Row, types::Value};
use uuid::Uuid;

use crate::{Error, Result};

/// The fund field columns, in the order [`field_values`] binds them.
macro_rules! field_columns {
  () => {
    "name, amc_name, primary_badge, market_cap, cagr, equity_size, \
     high_return, low_return, std_deviation, sharpe_ratio, sortino_ratio, \
     beta, alpha, r_squared, expense_ratio, nav, aum, lock_in_period"
  };
}
pub(crate) use field_columns;

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Fund fields ──────────────────────────────────────────────────────────────

/// Bind values for the columns named by [`field_columns!`].
pub fn field_values(f: &FundFields) -> Vec<Value> {
  vec![
    Value::from(f.name.clone()),
    Value::from(f.amc_name.clone()),
    Value::from(f.primary_badge.clone()),
    Value::from(f.market_cap.clone()),
    Value::from(f.cagr),
    Value::from(f.equity_size),
    Value::from(f.high_return),
    Value::from(f.low_return),
    Value::from(f.std_deviation),
    Value::from(f.sharpe_ratio),
    Value::from(f.sortino_ratio),
    Value::from(f.beta),
    Value::from(f.alpha),
    Value::from(f.r_squared),
    Value::from(f.expense_ratio),
    Value::from(f.nav),
    Value::from(f.aum),
    Value::from(f.lock_in_period.clone()),
  ]
}

/// Read the [`field_columns!`] block starting at column index `first`.
pub fn read_fields(row: &Row<'_>, first: usize) -> rusqlite::Result<FundFields> {
  Ok(FundFields {
    name:           row.get(first)?,
    amc_name:       row.get(first + 1)?,
    primary_badge:  row.get(first + 2)?,
    market_cap:     row.get(first + 3)?,
    cagr:           row.get(first + 4)?,
    equity_size:    row.get(first + 5)?,
    high_return:    row.get(first + 6)?,
    low_return:     row.get(first + 7)?,
    std_deviation:  row.get(first + 8)?,
    sharpe_ratio:   row.get(first + 9)?,
    sortino_ratio:  row.get(first + 10)?,
    beta:           row.get(first + 11)?,
    alpha:          row.get(first + 12)?,
    r_squared:      row.get(first + 13)?,
    expense_ratio:  row.get(first + 14)?,
    nav:            row.get(first + 15)?,
    aum:            row.get(first + 16)?,
    lock_in_period: row.get(first + 17)?,
  })
}

/// `fund_id, <fields>, updated_at` — matches [`FUND_SELECT`].
pub fn fund_values(record: &FundRecord) -> Vec<Value> {
  let mut values = vec![Value::from(encode_uuid(record.fund_id))];
  values.extend(field_values(&record.fields));
  values.push(Value::from(encode_dt(record.updated_at)));
  values
}

/// `history_id, fund_id, history_date, change_kind, updated_at, <fields>`.
pub fn snapshot_values(snapshot: &HistorySnapshot) -> Vec<Value> {
  let mut values = vec![
    Value::from(encode_uuid(snapshot.history_id)),
    Value::from(encode_uuid(snapshot.fund_id)),
    Value::from(encode_dt(snapshot.history_date)),
    Value::from(snapshot.change_kind.as_str().to_owned()),
    Value::from(encode_dt(snapshot.updated_at)),
  ];
  values.extend(field_values(&snapshot.fields));
  values
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const FUND_SELECT: &str =
  concat!("SELECT fund_id, ", field_columns!(), ", updated_at FROM funds");

pub const SNAPSHOT_SELECT: &str = concat!(
  "SELECT history_id, fund_id, history_date, change_kind, updated_at, ",
  field_columns!(),
  " FROM fund_history"
);

pub const ARTICLE_SELECT: &str =
  "SELECT article_id, fund_id, title, summary, content, date FROM fund_articles";

/// A `funds` row with identifiers and timestamps still encoded.
pub struct RawFund {
  pub fund_id:    String,
  pub fields:     FundFields,
  pub updated_at: String,
}

impl RawFund {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fund_id:    row.get(0)?,
      fields:     read_fields(row, 1)?,
      updated_at: row.get(19)?,
    })
  }

  pub fn into_fund(self) -> Result<FundRecord> {
    Ok(FundRecord {
      fund_id:    decode_uuid(&self.fund_id)?,
      fields:     self.fields,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// A `fund_history` row with identifiers and timestamps still encoded.
pub struct RawSnapshot {
  pub history_id:   String,
  pub fund_id:      String,
  pub history_date: String,
  pub change_kind:  String,
  pub updated_at:   String,
  pub fields:       FundFields,
}

impl RawSnapshot {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id:   row.get(0)?,
      fund_id:      row.get(1)?,
      history_date: row.get(2)?,
      change_kind:  row.get(3)?,
      updated_at:   row.get(4)?,
      fields:       read_fields(row, 5)?,
    })
  }

  pub fn into_snapshot(self) -> Result<HistorySnapshot> {
    Ok(HistorySnapshot {
      history_id:   decode_uuid(&self.history_id)?,
      fund_id:      decode_uuid(&self.fund_id)?,
      history_date: decode_dt(&self.history_date)?,
      change_kind:  ChangeKind::parse(&self.change_kind)?,
      updated_at:   decode_dt(&self.updated_at)?,
      fields:       self.fields,
    })
  }
}

/// A `fund_articles` row.
pub struct RawArticle {
  pub article_id: String,
  pub fund_id:    String,
  pub title:      String,
  pub summary:    String,
  pub content:    String,
  pub date:       String,
}

impl RawArticle {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      article_id: row.get(0)?,
      fund_id:    row.get(1)?,
      title:      row.get(2)?,
      summary:    row.get(3)?,
      content:    row.get(4)?,
      date:       row.get(5)?,
    })
  }

  pub fn into_article(self) -> Result<FundArticle> {
    Ok(FundArticle {
      article_id: decode_uuid(&self.article_id)?,
      fund_id:    decode_uuid(&self.fund_id)?,
      title:      self.title,
      summary:    self.summary,
      content:    self.content,
      date:       decode_dt(&self.date)?,
    })
  }
}
