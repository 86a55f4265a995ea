//! Prometheus metrics endpoint

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::AppState;
use crate::auth::{MaybePrincipal, Principal};
use crate::error::AppError;
use crate::metrics::REGISTRY;

/// Only the configured admin account may scrape metrics.
fn require_admin(principal: &Principal, state: &AppState) -> Result<(), AppError> {
    let Some(account) = principal.account() else {
        return Err(AppError::Unauthorized);
    };

    if account.username != state.config.admin.username.trim() {
        tracing::debug!(
            account_id = %account.id,
            "Metrics requested by non-admin account"
        );
        return Err(AppError::Forbidden);
    }

    Ok(())
}

/// GET /metrics
///
/// Renders every registered localtoot metric in Prometheus text format.
async fn metrics_handler(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
) -> Result<Response, AppError> {
    require_admin(&principal, &state)?;

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let response = match encoder.encode_to_string(&metric_families) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type())],
            body,
        )
            .into_response(),
        Err(error) => {
            tracing::error!(%error, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    };

    Ok(response)
}

/// Router exposing `/metrics` to the admin bearer token
pub fn metrics_router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}
