//! Handlers for `/admin/funds` bulk endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/admin/funds/import` | CSV body; `?dry_run=true` writes nothing |
//! | `GET`  | `/admin/funds/export` | `text/csv`, one row per fund |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::header,
  response::IntoResponse,
};
use fundlog_core::store::FundStore;
use fundlog_import::{
  admin::{AdminImportResult, export_funds, import_funds},
  source::read_csv,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ImportParams {
  #[serde(default)]
  pub dry_run: bool,
}

/// `POST /admin/funds/import[?dry_run=true]`
///
/// A body that is not readable CSV is rejected whole with 400; per-row
/// problems are reported in the result.
pub async fn import<S: FundStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ImportParams>,
  body: String,
) -> Result<Json<AdminImportResult>, ApiError> {
  let rows = read_csv(body.as_bytes()).map_err(ApiError::InvalidCsv)?;
  Ok(Json(import_funds(store.as_ref(), &rows, params.dry_run).await))
}

/// `GET /admin/funds/export`
pub async fn export<S: FundStore>(
  State(store): State<Arc<S>>,
) -> Result<impl IntoResponse, ApiError> {
  let mut csv = Vec::new();
  export_funds(store.as_ref(), &mut csv)
    .await
    .map_err(ApiError::store)?;
  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
      (header::CONTENT_DISPOSITION, "attachment; filename=\"funds.csv\""),
    ],
    csv,
  ))
}
