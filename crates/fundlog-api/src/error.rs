//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"error": "<message>"}` with a matching status.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  /// The named resource, e.g. `"fund <id>"`, does not exist.
  #[error("{0} not found")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  #[error("unreadable csv body: {0}")]
  InvalidCsv(#[source] fundlog_import::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) | Self::InvalidCsv(_) => StatusCode::BAD_REQUEST,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
