//! Operator-facing bulk import and export, keyed by fund name.
//!
//! Unlike the historical importer, admin import reads only the snake-case
//! columns, treats each row independently, and skips rows that would not
//! change the stored fund.

use std::{collections::HashMap, io::Write};

use fundlog_core::{
  fund::{FieldValue, FundField, FundFields, FundRecord},
  store::FundStore,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
  Error, FundError, Result,
  resolve::{self, Columns},
  source::Row,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminImportResult {
  pub new:     usize,
  pub updated: usize,
  pub skipped: usize,
  pub errors:  Vec<RowError>,
  pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
  pub line:  usize,
  pub name:  Option<String>,
  pub error: String,
}

/// The current state of a fund as seen by the run.
enum Current {
  Stored(FundRecord),
  /// Staged by an earlier row of a dry run.
  Staged(FundFields),
}

enum RowOutcome {
  New,
  Updated,
  Skipped,
}

/// Import `rows` by name. With `dry_run` nothing is written, but later rows
/// still see the effect of earlier ones.
pub async fn import_funds<S: FundStore>(
  store: &S,
  rows: &[Row],
  dry_run: bool,
) -> AdminImportResult {
  let mut result = AdminImportResult { dry_run, ..Default::default() };
  let mut staged: HashMap<String, FundFields> = HashMap::new();

  for row in rows {
    let name = resolve::name(row, Columns::Canonical);
    let outcome = match &name {
      None => Err(FundError::MissingName { line: row.line }),
      Some(name) => import_row(store, row, name, dry_run, &mut staged).await,
    };
    match outcome {
      Ok(RowOutcome::New) => result.new += 1,
      Ok(RowOutcome::Updated) => result.updated += 1,
      Ok(RowOutcome::Skipped) => result.skipped += 1,
      Err(e) => {
        warn!(line = row.line, error = %e, "admin import row failed");
        result.errors.push(RowError { line: row.line, name, error: e.to_string() });
      }
    }
  }

  info!(
    new = result.new,
    updated = result.updated,
    skipped = result.skipped,
    errors = result.errors.len(),
    dry_run,
    "admin import finished"
  );
  result
}

async fn import_row<S: FundStore>(
  store: &S,
  row: &Row,
  name: &str,
  dry_run: bool,
  staged: &mut HashMap<String, FundFields>,
) -> Result<RowOutcome, FundError> {
  let patch = resolve::patch(row, Columns::Canonical);

  let current = match staged.get(name) {
    Some(fields) => Some(Current::Staged(fields.clone())),
    None => store
      .find_fund_by_name(name.to_owned())
      .await
      .map_err(FundError::store)?
      .map(Current::Stored),
  };

  match current {
    None => {
      let fields = patch.into_fields()?;
      if dry_run {
        staged.insert(name.to_owned(), fields);
      } else {
        store.create_fund(fields).await.map_err(FundError::store)?;
      }
      Ok(RowOutcome::New)
    }
    Some(current) => {
      let before = match &current {
        Current::Stored(record) => &record.fields,
        Current::Staged(fields) => fields,
      };
      let mut merged = before.clone();
      patch.apply_to(&mut merged);
      if merged == *before {
        return Ok(RowOutcome::Skipped);
      }

      match current {
        Current::Stored(record) if !dry_run => {
          store
            .save_fund(record.fund_id, merged)
            .await
            .map_err(FundError::store)?;
        }
        _ => {
          staged.insert(name.to_owned(), merged);
        }
      }
      Ok(RowOutcome::Updated)
    }
  }
}

/// Write every fund as CSV with one column per field. Returns the number of
/// funds written.
pub async fn export_funds<S: FundStore>(
  store: &S,
  writer: impl Write,
) -> Result<usize> {
  let funds = store
    .list_funds()
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  let mut out = csv::Writer::from_writer(writer);
  out.write_record(FundField::ALL.iter().map(|f| f.column()))?;
  for fund in &funds {
    out.write_record(FundField::ALL.iter().map(|&f| cell_text(&fund.fields, f)))?;
  }
  out.flush().map_err(csv::Error::from)?;

  Ok(funds.len())
}

fn cell_text(fields: &FundFields, field: FundField) -> String {
  match fields.get(field) {
    Some(FieldValue::Text(s)) => s,
    Some(FieldValue::Number(n)) => n.to_string(),
    None => String::new(),
  }
}
