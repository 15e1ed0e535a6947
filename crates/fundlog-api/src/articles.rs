//! Handlers for `/articles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/articles` | Optional `?fund_id`, `?limit`, `?offset`; newest first |
//! | `POST`   | `/articles` | Body: [`NewArticle`]; 400 if the fund does not exist |
//! | `GET`    | `/articles/:id` | 404 if not found |
//! | `PUT`    | `/articles/:id` | Body: [`ArticleBody`] |
//! | `PATCH`  | `/articles/:id` | Body: any subset of [`ArticleBody`] |
//! | `DELETE` | `/articles/:id` | 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use fundlog_core::{
  article::{ArticleQuery, ArticleUpdate, FundArticle, NewArticle},
  store::{FundStore, StoreError},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("article {id}")) }

/// `GET /articles[?fund_id=<id>][&limit=<n>][&offset=<n>]`
pub async fn list<S: FundStore>(
  State(store): State<Arc<S>>,
  Query(query): Query<ArticleQuery>,
) -> Result<Json<Vec<FundArticle>>, ApiError> {
  let articles = store.list_articles(&query).await.map_err(ApiError::store)?;
  Ok(Json(articles))
}

/// `POST /articles` — returns 201 + the stored article.
pub async fn create<S: FundStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewArticle>,
) -> Result<impl IntoResponse, ApiError> {
  let fund = store.get_fund(body.fund_id).await.map_err(ApiError::store)?;
  if fund.is_none() {
    return Err(ApiError::BadRequest(format!("fund {} does not exist", body.fund_id)));
  }
  // The fund can still vanish between the check and the insert.
  let article = store.create_article(body).await.map_err(create_error)?;
  Ok((StatusCode::CREATED, Json(article)))
}

/// A missing fund is the caller's mistake, not a server fault.
pub(crate) fn create_error<E>(e: E) -> ApiError
where
  E: std::error::Error + StoreError + Send + Sync + 'static,
{
  match e.as_core() {
    Some(fundlog_core::Error::FundNotFound(id)) => {
      ApiError::BadRequest(format!("fund {id} does not exist"))
    }
    _ => ApiError::store(e),
  }
}

/// `GET /articles/:id`
pub async fn get_one<S: FundStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<FundArticle>, ApiError> {
  let article = store
    .get_article(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(article))
}

/// Full article content accepted by `PUT`.
#[derive(Debug, Deserialize)]
pub struct ArticleBody {
  pub title:   String,
  pub summary: String,
  pub content: String,
}

impl From<ArticleBody> for ArticleUpdate {
  fn from(b: ArticleBody) -> Self {
    ArticleUpdate {
      title:   Some(b.title),
      summary: Some(b.summary),
      content: Some(b.content),
    }
  }
}

/// `PUT /articles/:id`
pub async fn replace<S: FundStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ArticleBody>,
) -> Result<Json<FundArticle>, ApiError> {
  update(store.as_ref(), id, body.into()).await
}

/// `PATCH /articles/:id`
pub async fn patch<S: FundStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ArticleUpdate>,
) -> Result<Json<FundArticle>, ApiError> {
  update(store.as_ref(), id, body).await
}

async fn update<S: FundStore>(
  store: &S,
  id: Uuid,
  update: ArticleUpdate,
) -> Result<Json<FundArticle>, ApiError> {
  let article = store
    .update_article(id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(article))
}

/// `DELETE /articles/:id`
pub async fn delete_one<S: FundStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if store.delete_article(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(not_found(id))
  }
}
