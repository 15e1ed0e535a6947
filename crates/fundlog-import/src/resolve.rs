//! Field resolution: raw row cells → typed, optional field values.
//!
//! Each field is read from its canonical snake-case column and, for history
//! imports, from one alternate capitalised column (`nav`/`NAV`,
//! `amc_name`/`AMC_Name`, ...). The first usable cell wins. Empty cells,
//! whitespace, `nan` and missing columns are never usable, so they resolve to
//! "no update" rather than "clear".

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use fundlog_core::fund::{FieldValue, FundField, FundPatch};

use crate::{FundError, source::{Cell, Row}};

/// Which column names a resolver accepts for each field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Columns {
  /// Only the snake-case column (`nav`).
  Canonical,
  /// The snake-case column, then its capitalised alternate (`NAV`).
  WithAlternate,
}

/// The capitalised alternate column name for `field`.
pub fn alternate_column(field: FundField) -> &'static str {
  match field {
    FundField::Name => "Name",
    FundField::AmcName => "AMC_Name",
    FundField::PrimaryBadge => "Primary_Badge",
    FundField::MarketCap => "Market_Cap",
    FundField::Cagr => "CAGR",
    FundField::EquitySize => "Equity_Size",
    FundField::HighReturn => "High_Return",
    FundField::LowReturn => "Low_Return",
    FundField::StdDeviation => "Std_Deviation",
    FundField::SharpeRatio => "Sharpe_Ratio",
    FundField::SortinoRatio => "Sortino_Ratio",
    FundField::Beta => "Beta",
    FundField::Alpha => "Alpha",
    FundField::RSquared => "R_Squared",
    FundField::ExpenseRatio => "Expense_Ratio",
    FundField::Nav => "NAV",
    FundField::Aum => "AUM",
    FundField::LockInPeriod => "Lock_In_Period",
  }
}

const DATE_COLUMNS: [&str; 2] = ["date", "Date"];

/// Whether `s` carries no value: empty, whitespace, or a `nan` sentinel.
pub fn is_blank(s: &str) -> bool {
  let s = s.trim();
  s.is_empty() || s.eq_ignore_ascii_case("nan")
}

fn is_usable(cell: &Cell) -> bool {
  match cell {
    Cell::Empty => false,
    Cell::Text(s) => !is_blank(s),
    Cell::Number(n) => !n.is_nan(),
  }
}

/// Total numeric conversion. Missing, blank, `nan`, unparseable and
/// non-finite inputs all yield `None`; nothing here can fail.
pub fn coerce_number(cell: Option<&Cell>) -> Option<f64> {
  let n = match cell? {
    Cell::Empty => return None,
    Cell::Number(n) => *n,
    Cell::Text(s) => s.trim().parse::<f64>().ok()?,
  };
  n.is_finite().then_some(n)
}

/// Text conversion: trimmed, with blanks treated as absent. Numbers are
/// rendered in decimal.
pub fn coerce_text(cell: Option<&Cell>) -> Option<String> {
  match cell? {
    Cell::Empty => None,
    Cell::Text(s) if is_blank(s) => None,
    Cell::Text(s) => Some(s.trim().to_owned()),
    Cell::Number(n) => n.is_finite().then(|| n.to_string()),
  }
}

/// The first usable cell among `columns`.
fn first_usable<'r>(row: &'r Row, columns: &[&str]) -> Option<&'r Cell> {
  columns
    .iter()
    .filter_map(|column| row.get(column))
    .find(|cell| is_usable(cell))
}

fn field_cell(row: &Row, field: FundField, columns: Columns) -> Option<&Cell> {
  match columns {
    Columns::Canonical => first_usable(row, &[field.column()]),
    Columns::WithAlternate => {
      first_usable(row, &[field.column(), alternate_column(field)])
    }
  }
}

/// Resolve one field to a typed value, or `None` for "no update".
pub fn field(row: &Row, field: FundField, columns: Columns) -> Option<FieldValue> {
  let cell = field_cell(row, field, columns);
  if field.kind().is_numeric() {
    coerce_number(cell).map(FieldValue::Number)
  } else {
    coerce_text(cell).map(FieldValue::Text)
  }
}

/// The fund name of `row`, if it has a usable one.
pub fn name(row: &Row, columns: Columns) -> Option<String> {
  match field(row, FundField::Name, columns)? {
    FieldValue::Text(name) => Some(name),
    FieldValue::Number(_) => None,
  }
}

/// Resolve every known field of `row` into a patch.
pub fn patch(row: &Row, columns: Columns) -> FundPatch {
  let mut patch = FundPatch::default();
  for f in FundField::ALL {
    if let Some(value) = field(row, f, columns) {
      patch.set(f, value);
    }
  }
  patch
}

/// The record date of `row`; `default` when the row carries none.
///
/// Date-only values are taken as midnight UTC; naive date-times as UTC.
/// Numbers are spreadsheet serial dates.
pub fn record_date(
  row: &Row,
  default: DateTime<Utc>,
) -> Result<DateTime<Utc>, FundError> {
  let Some(cell) = first_usable(row, &DATE_COLUMNS) else {
    return Ok(default);
  };

  let invalid = |value: String| FundError::InvalidDate { line: row.line, value };
  match cell {
    Cell::Text(s) => parse_date(s.trim()).ok_or_else(|| invalid(s.clone())),
    Cell::Number(n) => from_serial(*n).ok_or_else(|| invalid(n.to_string())),
    Cell::Empty => Ok(default),
  }
}

/// Days since 1899-12-30; the fraction is the time of day.
fn from_serial(serial: f64) -> Option<DateTime<Utc>> {
  if !serial.is_finite() || serial < 1.0 {
    return None;
  }
  let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
  let millis = TimeDelta::try_milliseconds((serial * 86_400_000.0).round() as i64)?;
  epoch.checked_add_signed(millis).map(|naive| naive.and_utc())
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn coercion_is_total() {
    let cases = [
      (Some(Cell::Text("12.5".into())), Some(12.5)),
      (Some(Cell::Number(12.5)), Some(12.5)),
      (None, None),
      (Some(Cell::Text("".into())), None),
      (Some(Cell::Text("nan".into())), None),
      (Some(Cell::Text("NaN".into())), None),
      (Some(Cell::Number(f64::NAN)), None),
      (Some(Cell::Text("n/a".into())), None),
      (Some(Cell::Text("inf".into())), None),
      (Some(Cell::Empty), None),
      (Some(Cell::Text(" -3 ".into())), Some(-3.0)),
    ];
    for (input, expected) in cases {
      assert_eq!(coerce_number(input.as_ref()), expected, "{input:?}");
    }
  }

  #[test]
  fn zero_is_a_value_not_a_blank() {
    let row = Row::new(2).with("cagr", "0").with("CAGR", "7");
    assert_eq!(
      field(&row, FundField::Cagr, Columns::WithAlternate),
      Some(FieldValue::Number(0.0))
    );
  }

  #[test]
  fn alternate_column_used_when_canonical_blank() {
    let row = Row::new(2).with("nav", "nan").with("NAV", "41.2");
    assert_eq!(
      field(&row, FundField::Nav, Columns::WithAlternate),
      Some(FieldValue::Number(41.2))
    );
    assert_eq!(field(&row, FundField::Nav, Columns::Canonical), None);
  }

  #[test]
  fn unparseable_first_value_does_not_fall_through() {
    let row = Row::new(2).with("aum", "lots").with("AUM", "100");
    assert_eq!(field(&row, FundField::Aum, Columns::WithAlternate), None);
  }

  #[test]
  fn name_requires_usable_text() {
    assert_eq!(name(&Row::new(2).with("Name", " Alpha "), Columns::WithAlternate).as_deref(), Some("Alpha"));
    assert_eq!(name(&Row::new(2).with("name", "  "), Columns::WithAlternate), None);
    assert_eq!(name(&Row::new(2).with("name", "NaN"), Columns::WithAlternate), None);
    assert_eq!(name(&Row::new(2).with("Name", "Alpha"), Columns::Canonical), None);
  }

  #[test]
  fn patch_collects_only_usable_fields() {
    let row = Row::new(2)
      .with("name", "Alpha")
      .with("Market_Cap", "Large Cap")
      .with_number("NAV", 10.25)
      .with("beta", "")
      .with("unrelated", "x");
    let patch = patch(&row, Columns::WithAlternate);

    assert_eq!(patch.name.as_deref(), Some("Alpha"));
    assert_eq!(patch.market_cap.as_deref(), Some("Large Cap"));
    assert_eq!(patch.nav, Some(10.25));
    assert_eq!(patch.beta, None);
    assert_eq!(patch.aum, None);
  }

  #[test]
  fn record_dates() {
    let now = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
    let date = |row: Row| record_date(&row, now);

    assert_eq!(
      date(Row::new(2).with("date", "2024-03-31")).unwrap(),
      Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
    );
    assert_eq!(
      date(Row::new(2).with("Date", "2024-03-31 15:30:00")).unwrap(),
      Utc.with_ymd_and_hms(2024, 3, 31, 15, 30, 0).unwrap()
    );
    assert_eq!(
      date(Row::new(2).with("date", "2024-03-31T15:30:00+05:30")).unwrap(),
      Utc.with_ymd_and_hms(2024, 3, 31, 10, 0, 0).unwrap()
    );
    assert_eq!(
      date(Row::new(2).with_number("Date", 45382.0)).unwrap(),
      Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
    );
    assert_eq!(
      date(Row::new(2).with_number("date", 45382.75)).unwrap(),
      Utc.with_ymd_and_hms(2024, 3, 31, 18, 0, 0).unwrap()
    );
    assert!(matches!(
      date(Row::new(3).with_number("date", -4.0)).unwrap_err(),
      FundError::InvalidDate { line: 3, .. }
    ));
    assert_eq!(date(Row::new(2)).unwrap(), now);
    assert_eq!(date(Row::new(2).with("date", "nan")).unwrap(), now);
    assert!(matches!(
      date(Row::new(7).with("date", "31/03/2024")).unwrap_err(),
      FundError::InvalidDate { line: 7, .. }
    ));
  }
}
