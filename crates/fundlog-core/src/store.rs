//! The `FundStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `fundlog-store-sqlite`).
//! Higher layers (`fundlog-api`, `fundlog-import`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  article::{ArticleQuery, ArticleUpdate, FundArticle, NewArticle},
  fund::{FundFields, FundRecord},
  history::{HistorySnapshot, Persisted},
};

/// Access to the domain error, if any, carried by a backend's error type.
///
/// Lets callers tell "the fund is gone" apart from a database failure
/// without knowing the concrete backend.
pub trait StoreError {
  fn as_core(&self) -> Option<&crate::Error>;
}

/// Abstraction over a fund store backend.
///
/// Every fund write runs the same explicit sequence: persist the record,
/// append one [`HistorySnapshot`] of the result, then trim the fund's history
/// to the retention limit. The appended snapshot is handed back in
/// [`Persisted`] so callers can address it directly.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait FundStore: Send + Sync {
  type Error: std::error::Error + StoreError + Send + Sync + 'static;

  // ── Funds ─────────────────────────────────────────────────────────────

  /// Create a fund. `fund_id` and `updated_at` are assigned by the store.
  fn create_fund(
    &self,
    fields: FundFields,
  ) -> impl Future<Output = Result<Persisted, Self::Error>> + Send + '_;

  /// Retrieve a fund by id. Returns `None` if not found.
  fn get_fund(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FundRecord>, Self::Error>> + Send + '_;

  /// Retrieve the fund called `name`.
  ///
  /// Names are not unique-enforced; more than one match is an error.
  fn find_fund_by_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<FundRecord>, Self::Error>> + Send + '_;

  /// List all funds ordered by name.
  fn list_funds(
    &self,
  ) -> impl Future<Output = Result<Vec<FundRecord>, Self::Error>> + Send + '_;

  /// Replace the fields of an existing fund.
  fn save_fund(
    &self,
    id: Uuid,
    fields: FundFields,
  ) -> impl Future<Output = Result<Persisted, Self::Error>> + Send + '_;

  /// Delete a fund and its articles. Its history is kept and gains a
  /// `deleted` snapshot. Returns `false` if the fund did not exist.
  fn delete_fund(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Articles ──────────────────────────────────────────────────────────

  /// Create an article; `date` is set by the store.
  fn create_article(
    &self,
    input: NewArticle,
  ) -> impl Future<Output = Result<FundArticle, Self::Error>> + Send + '_;

  fn get_article(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FundArticle>, Self::Error>> + Send + '_;

  /// List articles, newest first.
  fn list_articles<'a>(
    &'a self,
    query: &'a ArticleQuery,
  ) -> impl Future<Output = Result<Vec<FundArticle>, Self::Error>> + Send + 'a;

  /// Apply `update` to an article. Returns `None` if not found.
  fn update_article(
    &self,
    id: Uuid,
    update: ArticleUpdate,
  ) -> impl Future<Output = Result<Option<FundArticle>, Self::Error>> + Send + '_;

  fn delete_article(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// The newest `limit` snapshots of a fund, ordered by `history_date`
  /// descending.
  fn list_history(
    &self,
    fund_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<HistorySnapshot>, Self::Error>> + Send + '_;

  /// Overwrite the `history_date` of one snapshot.
  ///
  /// Retention is not re-run; the new ordering takes effect at the next trim.
  fn set_history_date(
    &self,
    history_id: Uuid,
    date: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete every snapshot of `fund_id` beyond the newest `keep` by
  /// `history_date`. Returns the number deleted.
  fn trim_history(
    &self,
    fund_id: Uuid,
    keep: usize,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
