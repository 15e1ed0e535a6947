//! Handlers for `/funds` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/funds` | Ordered by name |
//! | `POST`   | `/funds` | Body: every field; returns 201 |
//! | `GET`    | `/funds/:id` | 404 if not found |
//! | `PUT`    | `/funds/:id` | Body: every field |
//! | `PATCH`  | `/funds/:id` | Body: any subset of fields |
//! | `DELETE` | `/funds/:id` | 204; history is kept |
//! | `GET`    | `/funds/:id/history` | Newest first, optional `?limit=` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use fundlog_core::{
  fund::{FundFields, FundPatch, FundRecord},
  history::{HISTORY_LIMIT, HistorySnapshot},
  store::FundStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

async fn require_fund<S: FundStore>(store: &S, id: Uuid) -> Result<FundRecord, ApiError> {
  store
    .get_fund(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("fund {id}")))
}

// ─── List / create ───────────────────────────────────────────────────────────

/// `GET /funds`
pub async fn list<S: FundStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<FundRecord>>, ApiError> {
  let funds = store.list_funds().await.map_err(ApiError::store)?;
  Ok(Json(funds))
}

/// `POST /funds` — returns 201 + the stored fund.
pub async fn create<S: FundStore>(
  State(store): State<Arc<S>>,
  Json(fields): Json<FundFields>,
) -> Result<impl IntoResponse, ApiError> {
  let persisted = store.create_fund(fields).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(persisted.fund)))
}

// ─── Single fund ─────────────────────────────────────────────────────────────

/// `GET /funds/:id`
pub async fn get_one<S: FundStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<FundRecord>, ApiError> {
  Ok(Json(require_fund(store.as_ref(), id).await?))
}

/// `PUT /funds/:id`
pub async fn replace<S: FundStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(fields): Json<FundFields>,
) -> Result<Json<FundRecord>, ApiError> {
  require_fund(store.as_ref(), id).await?;
  let persisted = store.save_fund(id, fields).await.map_err(ApiError::store)?;
  Ok(Json(persisted.fund))
}

/// `PATCH /funds/:id` — absent and `null` fields keep their stored value.
pub async fn patch<S: FundStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<FundPatch>,
) -> Result<Json<FundRecord>, ApiError> {
  let mut fund = require_fund(store.as_ref(), id).await?;
  patch.apply_to(&mut fund.fields);
  let persisted = store
    .save_fund(id, fund.fields)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(persisted.fund))
}

/// `DELETE /funds/:id`
pub async fn delete_one<S: FundStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if store.delete_fund(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("fund {id}")))
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  /// Capped at the retention limit.
  pub limit: Option<usize>,
}

/// `GET /funds/:id/history[?limit=<n>]`
///
/// Snapshots outlive their fund, so a deleted fund still has a history.
/// 404 only when there is neither a fund nor any snapshot.
pub async fn history<S: FundStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<HistorySnapshot>>, ApiError> {
  let limit = params.limit.unwrap_or(HISTORY_LIMIT).min(HISTORY_LIMIT);
  let history = store
    .list_history(id, limit)
    .await
    .map_err(ApiError::store)?;
  if history.is_empty() {
    require_fund(store.as_ref(), id).await?;
  }
  Ok(Json(history))
}
