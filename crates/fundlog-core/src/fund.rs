//! Fund records and the explicit field table used to merge partial updates.
//!
//! A fund's mutable state lives in [`FundFields`]. Partial updates (import
//! rows, `PATCH` bodies) are expressed as a [`FundPatch`] whose `None` entries
//! mean "leave unchanged", never "clear".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Field table ─────────────────────────────────────────────────────────────

/// How a field is typed and whether a new fund must supply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  RequiredText,
  OptionalText,
  RequiredNumeric,
  OptionalNumeric,
}

impl FieldKind {
  pub fn is_numeric(self) -> bool {
    matches!(self, Self::RequiredNumeric | Self::OptionalNumeric)
  }

  pub fn is_required(self) -> bool {
    matches!(self, Self::RequiredText | Self::RequiredNumeric)
  }
}

/// Every mutable field of a fund, in export column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundField {
  Name,
  AmcName,
  PrimaryBadge,
  MarketCap,
  Cagr,
  EquitySize,
  HighReturn,
  LowReturn,
  StdDeviation,
  SharpeRatio,
  SortinoRatio,
  Beta,
  Alpha,
  RSquared,
  ExpenseRatio,
  Nav,
  Aum,
  LockInPeriod,
}

impl FundField {
  pub const ALL: [FundField; 18] = [
    Self::Name,
    Self::AmcName,
    Self::PrimaryBadge,
    Self::MarketCap,
    Self::Cagr,
    Self::EquitySize,
    Self::HighReturn,
    Self::LowReturn,
    Self::StdDeviation,
    Self::SharpeRatio,
    Self::SortinoRatio,
    Self::Beta,
    Self::Alpha,
    Self::RSquared,
    Self::ExpenseRatio,
    Self::Nav,
    Self::Aum,
    Self::LockInPeriod,
  ];

  /// The canonical snake-case column name (also the JSON key).
  pub fn column(self) -> &'static str {
    match self {
      Self::Name => "name",
      Self::AmcName => "amc_name",
      Self::PrimaryBadge => "primary_badge",
      Self::MarketCap => "market_cap",
      Self::Cagr => "cagr",
      Self::EquitySize => "equity_size",
      Self::HighReturn => "high_return",
      Self::LowReturn => "low_return",
      Self::StdDeviation => "std_deviation",
      Self::SharpeRatio => "sharpe_ratio",
      Self::SortinoRatio => "sortino_ratio",
      Self::Beta => "beta",
      Self::Alpha => "alpha",
      Self::RSquared => "r_squared",
      Self::ExpenseRatio => "expense_ratio",
      Self::Nav => "nav",
      Self::Aum => "aum",
      Self::LockInPeriod => "lock_in_period",
    }
  }

  pub fn kind(self) -> FieldKind {
    match self {
      Self::Name | Self::MarketCap => FieldKind::RequiredText,
      Self::AmcName | Self::PrimaryBadge | Self::LockInPeriod => {
        FieldKind::OptionalText
      }
      Self::Cagr => FieldKind::OptionalNumeric,
      _ => FieldKind::RequiredNumeric,
    }
  }
}

/// A resolved, usable value for a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
  Text(String),
  Number(f64),
}

// ─── FundFields ──────────────────────────────────────────────────────────────

/// The complete mutable state of a fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundFields {
  pub name:           String,
  /// Asset management company.
  pub amc_name:       Option<String>,
  /// e.g. "Equity Fund", "Debt Fund".
  pub primary_badge:  Option<String>,
  pub market_cap:     String,
  /// Compound annual growth rate.
  pub cagr:           Option<f64>,
  pub equity_size:    f64,
  pub high_return:    f64,
  pub low_return:     f64,
  pub std_deviation:  f64,
  pub sharpe_ratio:   f64,
  pub sortino_ratio:  f64,
  pub beta:           f64,
  pub alpha:          f64,
  pub r_squared:      f64,
  pub expense_ratio:  f64,
  /// Net asset value.
  pub nav:            f64,
  /// Assets under management.
  pub aum:            f64,
  /// e.g. "3 years", "No lock-in".
  pub lock_in_period: Option<String>,
}

impl FundFields {
  /// The current value of `field`, or `None` for an unset optional field.
  pub fn get(&self, field: FundField) -> Option<FieldValue> {
    use FieldValue::{Number, Text};
    match field {
      FundField::Name => Some(Text(self.name.clone())),
      FundField::AmcName => self.amc_name.clone().map(Text),
      FundField::PrimaryBadge => self.primary_badge.clone().map(Text),
      FundField::MarketCap => Some(Text(self.market_cap.clone())),
      FundField::Cagr => self.cagr.map(Number),
      FundField::EquitySize => Some(Number(self.equity_size)),
      FundField::HighReturn => Some(Number(self.high_return)),
      FundField::LowReturn => Some(Number(self.low_return)),
      FundField::StdDeviation => Some(Number(self.std_deviation)),
      FundField::SharpeRatio => Some(Number(self.sharpe_ratio)),
      FundField::SortinoRatio => Some(Number(self.sortino_ratio)),
      FundField::Beta => Some(Number(self.beta)),
      FundField::Alpha => Some(Number(self.alpha)),
      FundField::RSquared => Some(Number(self.r_squared)),
      FundField::ExpenseRatio => Some(Number(self.expense_ratio)),
      FundField::Nav => Some(Number(self.nav)),
      FundField::Aum => Some(Number(self.aum)),
      FundField::LockInPeriod => self.lock_in_period.clone().map(Text),
    }
  }
}

// ─── FundRecord ──────────────────────────────────────────────────────────────

/// The current state of a fund as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundRecord {
  pub fund_id:    Uuid,
  #[serde(flatten)]
  pub fields:     FundFields,
  /// Server-assigned on every write; never accepted from callers.
  pub updated_at: DateTime<Utc>,
}

// ─── FundPatch ───────────────────────────────────────────────────────────────

/// A partial update. Only `Some` entries are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundPatch {
  pub name:           Option<String>,
  pub amc_name:       Option<String>,
  pub primary_badge:  Option<String>,
  pub market_cap:     Option<String>,
  pub cagr:           Option<f64>,
  pub equity_size:    Option<f64>,
  pub high_return:    Option<f64>,
  pub low_return:     Option<f64>,
  pub std_deviation:  Option<f64>,
  pub sharpe_ratio:   Option<f64>,
  pub sortino_ratio:  Option<f64>,
  pub beta:           Option<f64>,
  pub alpha:          Option<f64>,
  pub r_squared:      Option<f64>,
  pub expense_ratio:  Option<f64>,
  pub nav:            Option<f64>,
  pub aum:            Option<f64>,
  pub lock_in_period: Option<String>,
}

impl FundPatch {
  /// Record `value` for `field`.
  ///
  /// Returns `false` (and records nothing) when the value's type does not
  /// match the field's kind. A number given for a text field is stored as its
  /// decimal rendering.
  pub fn set(&mut self, field: FundField, value: FieldValue) -> bool {
    let value = match (field.kind().is_numeric(), value) {
      (true, FieldValue::Text(_)) => return false,
      (false, FieldValue::Number(n)) => FieldValue::Text(n.to_string()),
      (_, v) => v,
    };

    match (field, value) {
      (FundField::Name, FieldValue::Text(s)) => self.name = Some(s),
      (FundField::AmcName, FieldValue::Text(s)) => self.amc_name = Some(s),
      (FundField::PrimaryBadge, FieldValue::Text(s)) => {
        self.primary_badge = Some(s)
      }
      (FundField::MarketCap, FieldValue::Text(s)) => self.market_cap = Some(s),
      (FundField::LockInPeriod, FieldValue::Text(s)) => {
        self.lock_in_period = Some(s)
      }
      (FundField::Cagr, FieldValue::Number(n)) => self.cagr = Some(n),
      (FundField::EquitySize, FieldValue::Number(n)) => {
        self.equity_size = Some(n)
      }
      (FundField::HighReturn, FieldValue::Number(n)) => {
        self.high_return = Some(n)
      }
      (FundField::LowReturn, FieldValue::Number(n)) => self.low_return = Some(n),
      (FundField::StdDeviation, FieldValue::Number(n)) => {
        self.std_deviation = Some(n)
      }
      (FundField::SharpeRatio, FieldValue::Number(n)) => {
        self.sharpe_ratio = Some(n)
      }
      (FundField::SortinoRatio, FieldValue::Number(n)) => {
        self.sortino_ratio = Some(n)
      }
      (FundField::Beta, FieldValue::Number(n)) => self.beta = Some(n),
      (FundField::Alpha, FieldValue::Number(n)) => self.alpha = Some(n),
      (FundField::RSquared, FieldValue::Number(n)) => self.r_squared = Some(n),
      (FundField::ExpenseRatio, FieldValue::Number(n)) => {
        self.expense_ratio = Some(n)
      }
      (FundField::Nav, FieldValue::Number(n)) => self.nav = Some(n),
      (FundField::Aum, FieldValue::Number(n)) => self.aum = Some(n),
      _ => return false,
    }
    true
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Overwrite every field of `fields` for which this patch has a value.
  pub fn apply_to(&self, fields: &mut FundFields) {
    fn put<T: Clone>(slot: &mut T, value: &Option<T>) {
      if let Some(v) = value {
        *slot = v.clone();
      }
    }
    fn put_opt<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
      if value.is_some() {
        slot.clone_from(value);
      }
    }

    put(&mut fields.name, &self.name);
    put_opt(&mut fields.amc_name, &self.amc_name);
    put_opt(&mut fields.primary_badge, &self.primary_badge);
    put(&mut fields.market_cap, &self.market_cap);
    put_opt(&mut fields.cagr, &self.cagr);
    put(&mut fields.equity_size, &self.equity_size);
    put(&mut fields.high_return, &self.high_return);
    put(&mut fields.low_return, &self.low_return);
    put(&mut fields.std_deviation, &self.std_deviation);
    put(&mut fields.sharpe_ratio, &self.sharpe_ratio);
    put(&mut fields.sortino_ratio, &self.sortino_ratio);
    put(&mut fields.beta, &self.beta);
    put(&mut fields.alpha, &self.alpha);
    put(&mut fields.r_squared, &self.r_squared);
    put(&mut fields.expense_ratio, &self.expense_ratio);
    put(&mut fields.nav, &self.nav);
    put(&mut fields.aum, &self.aum);
    put_opt(&mut fields.lock_in_period, &self.lock_in_period);
  }

  /// Build the fields of a brand-new fund from this patch alone.
  ///
  /// Fails with [`Error::MissingField`] naming the first required field
  /// (in [`FundField::ALL`] order) that has no value.
  pub fn into_fields(self) -> Result<FundFields> {
    fn need<T>(value: Option<T>, field: FundField) -> Result<T> {
      value.ok_or(Error::MissingField(field.column()))
    }

    Ok(FundFields {
      name:           need(self.name, FundField::Name)?,
      amc_name:       self.amc_name,
      primary_badge:  self.primary_badge,
      market_cap:     need(self.market_cap, FundField::MarketCap)?,
      cagr:           self.cagr,
      equity_size:    need(self.equity_size, FundField::EquitySize)?,
      high_return:    need(self.high_return, FundField::HighReturn)?,
      low_return:     need(self.low_return, FundField::LowReturn)?,
      std_deviation:  need(self.std_deviation, FundField::StdDeviation)?,
      sharpe_ratio:   need(self.sharpe_ratio, FundField::SharpeRatio)?,
      sortino_ratio:  need(self.sortino_ratio, FundField::SortinoRatio)?,
      beta:           need(self.beta, FundField::Beta)?,
      alpha:          need(self.alpha, FundField::Alpha)?,
      r_squared:      need(self.r_squared, FundField::RSquared)?,
      expense_ratio:  need(self.expense_ratio, FundField::ExpenseRatio)?,
      nav:            need(self.nav, FundField::Nav)?,
      aum:            need(self.aum, FundField::Aum)?,
      lock_in_period: self.lock_in_period,
    })
  }
}
