//! JSON REST API over a [`fundlog_core::store::FundStore`].
//!
//! Funds and articles get the usual CRUD routes; fund history is read-only
//! and the `/admin` routes move funds in and out as CSV. Request tracing is
//! layered on by the binary.

pub mod admin;
pub mod articles;
pub mod error;
pub mod funds;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use fundlog_core::store::FundStore;

pub use error::ApiError;

/// Every route, with `store` as shared state.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: FundStore + 'static,
{
  Router::new()
    // Funds
    .route("/funds", get(funds::list::<S>).post(funds::create::<S>))
    .route(
      "/funds/{id}",
      get(funds::get_one::<S>)
        .put(funds::replace::<S>)
        .patch(funds::patch::<S>)
        .delete(funds::delete_one::<S>),
    )
    .route("/funds/{id}/history", get(funds::history::<S>))
    // Articles
    .route("/articles", get(articles::list::<S>).post(articles::create::<S>))
    .route(
      "/articles/{id}",
      get(articles::get_one::<S>)
        .put(articles::replace::<S>)
        .patch(articles::patch::<S>)
        .delete(articles::delete_one::<S>),
    )
    // Admin
    .route("/admin/funds/import", post(admin::import::<S>))
    .route("/admin/funds/export", get(admin::export::<S>))
    .with_state(store)
}
