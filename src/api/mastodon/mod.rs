//! Mastodon API compatible endpoints
//!
//! Implements the status subset of the Mastodon API.
//! See: https://docs.joinmastodon.org/methods/statuses/

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub mod statuses;

/// Create Mastodon API router
///
/// Read endpoints accept anonymous callers and filter by visibility.
/// Write endpoints require a `write:statuses` token inside the handler.
pub fn mastodon_api_router() -> Router<AppState> {
    Router::new()
        .route("/v1/statuses", post(statuses::create_status))
        .route(
            "/v1/statuses/:id",
            get(statuses::get_status).delete(statuses::delete_status),
        )
        .route(
            "/v1/statuses/:id/context",
            get(statuses::get_status_context),
        )
        .route("/v1/statuses/:id/card", get(statuses::get_status_card))
        // Form-post clients cannot send DELETE
        .route("/v1/statuses/:id/destroy", post(statuses::delete_status))
}
