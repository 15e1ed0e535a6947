//! Historical import: replay dated rows into fund records.
//!
//! Rows are grouped by fund name in first-appearance order, each group is
//! sorted by record date, and every row becomes one store write. The snapshot
//! a write appends is then backdated to the row's date, so the fund's history
//! reads as if the rows had been entered on the days they describe.
//!
//! A failing group is reported and the run moves on to the next one.

use chrono::{DateTime, Utc};
use fundlog_core::{
  fund::FundPatch,
  history::Persisted,
  store::{FundStore, StoreError as _},
};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::{
  FundError,
  resolve::{self, Columns},
  source::Row,
};

/// Outcome of a whole import run.
#[derive(Debug, Default)]
pub struct ImportReport {
  /// One entry per fund group, in first-appearance order.
  pub funds:        Vec<FundOutcome>,
  /// Rows dropped for having no usable name.
  pub skipped_rows: usize,
}

impl ImportReport {
  pub fn succeeded(&self) -> impl Iterator<Item = (&str, &FundImported)> {
    self
      .funds
      .iter()
      .filter_map(|f| f.result.as_ref().ok().map(|ok| (f.name.as_str(), ok)))
  }

  pub fn failed(&self) -> impl Iterator<Item = (&str, &FundError)> {
    self
      .funds
      .iter()
      .filter_map(|f| f.result.as_ref().err().map(|e| (f.name.as_str(), e)))
  }
}

#[derive(Debug)]
pub struct FundOutcome {
  pub name:   String,
  pub result: Result<FundImported, FundError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundImported {
  /// Number of rows written, one snapshot each.
  pub rows:    usize,
  /// Whether the first row created the fund.
  pub created: bool,
  /// Snapshots removed by retention across all of the group's writes.
  pub trimmed: usize,
}

/// A row reduced to what replay needs.
struct Planned {
  date:  DateTime<Utc>,
  patch: FundPatch,
}

/// Import `rows` into `store`. Rows without a date are stamped with `now`.
///
/// Never fails as a whole: per-fund failures are carried in the report.
pub async fn import_history<S: FundStore>(
  store: &S,
  rows: Vec<Row>,
  now: DateTime<Utc>,
) -> ImportReport {
  let mut report = ImportReport::default();

  let mut groups: IndexMap<String, Vec<Row>> = IndexMap::new();
  for row in rows {
    match resolve::name(&row, Columns::WithAlternate) {
      Some(name) => groups.entry(name).or_default().push(row),
      None => {
        debug!(line = row.line, "skipping row without a fund name");
        report.skipped_rows += 1;
      }
    }
  }

  for (name, rows) in groups {
    let result = import_fund(store, &name, &rows, now).await;
    match &result {
      Ok(imported) => info!(
        fund = %name,
        rows = imported.rows,
        created = imported.created,
        trimmed = imported.trimmed,
        "imported fund history"
      ),
      Err(e) => warn!(fund = %name, error = %e, "fund import failed"),
    }
    report.funds.push(FundOutcome { name, result });
  }

  report
}

fn plan(rows: &[Row], now: DateTime<Utc>) -> Result<Vec<Planned>, FundError> {
  let mut planned = rows
    .iter()
    .map(|row| {
      Ok(Planned {
        date:  resolve::record_date(row, now)?,
        patch: resolve::patch(row, Columns::WithAlternate),
      })
    })
    .collect::<Result<Vec<_>, FundError>>()?;
  // Stable, so equal dates keep source order.
  planned.sort_by_key(|p| p.date);
  Ok(planned)
}

async fn import_fund<S: FundStore>(
  store: &S,
  name: &str,
  rows: &[Row],
  now: DateTime<Utc>,
) -> Result<FundImported, FundError> {
  let planned = plan(rows, now)?;
  let Some((first, rest)) = planned.split_first() else {
    return Ok(FundImported { rows: 0, created: false, trimmed: 0 });
  };

  let existing = store
    .find_fund_by_name(name.to_owned())
    .await
    .map_err(FundError::store)?;

  let created = existing.is_none();
  let mut persisted = match existing {
    None => {
      let fields = first.patch.clone().into_fields()?;
      store.create_fund(fields).await.map_err(FundError::store)?
    }
    Some(record) => {
      let mut fields = record.fields;
      first.patch.apply_to(&mut fields);
      store
        .save_fund(record.fund_id, fields)
        .await
        .map_err(FundError::store)?
    }
  };
  backdate(store, &persisted, first.date).await?;
  let mut trimmed = persisted.trimmed;

  for row in rest {
    let mut fields = persisted.fund.fields.clone();
    row.patch.apply_to(&mut fields);
    persisted = store
      .save_fund(persisted.fund.fund_id, fields)
      .await
      .map_err(FundError::store)?;
    backdate(store, &persisted, row.date).await?;
    trimmed += persisted.trimmed;
  }

  Ok(FundImported { rows: planned.len(), created, trimmed })
}

/// Move the snapshot of `persisted` to `date`.
///
/// Retention runs before backdating, so a fund already holding a full
/// history of later-dated snapshots evicts the one just written. The write
/// itself stands; there is simply nothing left to backdate.
async fn backdate<S: FundStore>(
  store: &S,
  persisted: &Persisted,
  date: DateTime<Utc>,
) -> Result<(), FundError> {
  let history_id = persisted.snapshot.history_id;
  match store.set_history_date(history_id, date).await {
    Ok(()) => Ok(()),
    Err(e)
      if matches!(
        e.as_core(),
        Some(fundlog_core::Error::SnapshotNotFound(id)) if *id == history_id
      ) =>
    {
      debug!(%history_id, "snapshot evicted by retention before backdating");
      Ok(())
    }
    Err(e) => Err(FundError::store(e)),
  }
}
