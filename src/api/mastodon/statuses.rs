//! Status endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;

use crate::AppState;
use crate::api::dto::{ContextResponse, StatusResponse};
use crate::api::extract::JsonOrForm;
use crate::auth::scope::WRITE_STATUSES;
use crate::auth::{MaybePrincipal, Principal};
use crate::data::{Account, Status, Visibility};
use crate::error::AppError;
use crate::metrics::{
    DB_QUERIES_TOTAL, DB_QUERY_DURATION_SECONDS, HTTP_REQUEST_DURATION_SECONDS,
    HTTP_REQUESTS_TOTAL, POSTS_TOTAL, VISIBILITY_DENIALS_TOTAL,
};
use crate::service::{NewStatus, StatusService, visibility};

const DEFAULT_VISIBILITY: Visibility = Visibility::Public;

/// Status creation request
#[derive(Debug, Deserialize)]
pub struct CreateStatusRequest {
    pub status: Option<String>,
    pub in_reply_to_id: Option<String>,
    pub sensitive: Option<bool>,
    pub spoiler_text: Option<String>,
    pub visibility: Option<String>,
    pub language: Option<String>,
    /// Explicit local-only choice; inferred from the text when absent
    pub local_only: Option<bool>,
}

fn normalize_visibility_input(raw_visibility: Option<String>) -> Result<Visibility, AppError> {
    match raw_visibility.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_VISIBILITY),
        Some(raw) => raw.parse().map_err(|_| {
            AppError::Validation(
                "visibility must be one of: public, unlisted, private, direct".to_string(),
            )
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn build_status_service(state: &AppState) -> StatusService {
    StatusService::new(state.db.clone(), state.config.server.base_url())
}

/// Load a status the caller is allowed to see
///
/// Absent and hidden statuses produce the same `NotFound`.
async fn load_visible_status(
    status_service: &StatusService,
    id: &str,
    principal: &Principal,
) -> Result<Status, AppError> {
    let db_timer = DB_QUERY_DURATION_SECONDS
        .with_label_values(&["SELECT", "statuses"])
        .start_timer();
    let status = status_service.get(id).await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["SELECT", "statuses"])
        .inc();
    db_timer.observe_duration();

    let Some(status) = status else {
        tracing::debug!(status_id = %id, "Status not found");
        return Err(AppError::NotFound);
    };

    if let Err(denial) = visibility::check_visibility(&status, principal) {
        VISIBILITY_DENIALS_TOTAL
            .with_label_values(&[denial.as_str()])
            .inc();
        tracing::debug!(
            status_id = %id,
            reason = denial.as_str(),
            "Status hidden from caller"
        );
        return Err(AppError::NotFound);
    }

    Ok(status)
}

async fn load_owner(state: &AppState, status: &Status) -> Result<Account, AppError> {
    state
        .db
        .get_account(&status.account_id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "status {} references missing account {}",
                status.id,
                status.account_id
            ))
        })
}

/// Render statuses, fetching each owner once
async fn render_statuses(
    state: &AppState,
    statuses: Vec<Status>,
) -> Result<Vec<StatusResponse>, AppError> {
    let mut owners: HashMap<String, Account> = HashMap::new();
    let mut rendered = Vec::with_capacity(statuses.len());

    for status in statuses {
        if !owners.contains_key(&status.account_id) {
            let owner = load_owner(state, &status).await?;
            owners.insert(owner.id.clone(), owner);
        }
        if let Some(owner) = owners.get(&status.account_id) {
            rendered.push(crate::api::status_to_response(
                &status,
                owner,
                &state.config,
            ));
        }
    }

    Ok(rendered)
}

fn to_json_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|error| {
        AppError::Internal(anyhow::anyhow!(
            "failed to serialize status response: {error}"
        ))
    })
}

/// POST /api/v1/statuses
pub async fn create_status(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    JsonOrForm(req): JsonOrForm<CreateStatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    // Start timing the request
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/statuses"])
        .start_timer();

    let account = principal.require_scope(WRITE_STATUSES)?;

    let CreateStatusRequest {
        status,
        in_reply_to_id,
        sensitive,
        spoiler_text,
        visibility,
        language,
        local_only,
    } = req;

    let visibility = normalize_visibility_input(visibility)?;
    let text = status.unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation("status must not be empty".to_string()));
    }
    let max_characters = state.config.statuses.max_characters;
    if text.chars().count() > max_characters {
        return Err(AppError::Unprocessable(format!(
            "status must be at most {} characters",
            max_characters
        )));
    }
    let spoiler_text = spoiler_text.unwrap_or_default().trim().to_string();

    let status_service = build_status_service(&state);

    // Resolve reply target if provided.
    let parent = match non_empty(in_reply_to_id) {
        Some(parent_id) => {
            Some(load_visible_status(&status_service, &parent_id, &principal).await?)
        }
        None => None,
    };

    // Replies to a local-only status stay local unless the author says otherwise.
    let explicit_local_only =
        local_only.or_else(|| parent.as_ref().filter(|p| p.local_only).map(|_| true));
    let local_only = visibility::compute_local_only(&text, explicit_local_only);

    let new_status = NewStatus {
        text,
        sensitive: sensitive.unwrap_or(false) || !spoiler_text.is_empty(),
        spoiler_text,
        visibility,
        language: non_empty(language),
        local_only,
        in_reply_to: parent.as_ref(),
    };

    // Save to database
    let db_timer = DB_QUERY_DURATION_SECONDS
        .with_label_values(&["INSERT", "statuses"])
        .start_timer();
    let status = status_service.create(account, new_status).await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["INSERT", "statuses"])
        .inc();
    db_timer.observe_duration();

    // Update posts total metric
    POSTS_TOTAL.inc();

    let response = crate::api::status_to_response(&status, account, &state.config);

    // Record successful request
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/v1/statuses", "200"])
        .inc();

    Ok(Json(response))
}

/// GET /api/v1/statuses/:id
pub async fn get_status(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    // Start timing the request
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/v1/statuses/:id"])
        .start_timer();

    let status_service = build_status_service(&state);
    let status = load_visible_status(&status_service, &id, &principal).await?;
    let account = load_owner(&state, &status).await?;

    let response = crate::api::status_to_response(&status, &account, &state.config);

    // Record successful request
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/v1/statuses/:id", "200"])
        .inc();

    Ok(Json(response))
}

/// GET /api/v1/statuses/:id/context
///
/// Hidden members are omitted individually. A visible reply below a hidden
/// one is still listed, and its `in_reply_to_id` and `in_reply_to_account_id`
/// name the hidden parent, as Mastodon does.
pub async fn get_status_context(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(id): Path<String>,
) -> Result<Json<ContextResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/v1/statuses/:id/context"])
        .start_timer();

    let status_service = build_status_service(&state);
    let status = load_visible_status(&status_service, &id, &principal).await?;

    let db_timer = DB_QUERY_DURATION_SECONDS
        .with_label_values(&["SELECT", "statuses"])
        .start_timer();
    let context = status_service.get_context(&status).await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["SELECT", "statuses"])
        .inc();
    db_timer.observe_duration();

    // Thread members the caller cannot see are dropped, not reported.
    let ancestors = context
        .ancestors
        .into_iter()
        .filter(|member| visibility::is_visible(member, &principal))
        .collect();
    let descendants = context
        .descendants
        .into_iter()
        .filter(|member| visibility::is_visible(member, &principal))
        .collect();

    let response = ContextResponse {
        ancestors: render_statuses(&state, ancestors).await?,
        descendants: render_statuses(&state, descendants).await?,
    };

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/v1/statuses/:id/context", "200"])
        .inc();

    Ok(Json(response))
}

/// GET /api/v1/statuses/:id/card
///
/// Returns an empty object when no preview card is stored.
pub async fn get_status_card(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/v1/statuses/:id/card"])
        .start_timer();

    let status_service = build_status_service(&state);
    let status = load_visible_status(&status_service, &id, &principal).await?;

    let card = status_service.get_card(&status.id).await?;
    let body = match card {
        Some(card) => to_json_value(&crate::api::card_to_response(&card))?,
        None => serde_json::json!({}),
    };

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/v1/statuses/:id/card", "200"])
        .inc();

    Ok(Json(body))
}

/// DELETE /api/v1/statuses/:id
///
/// Deleting an absent status succeeds with an empty object.
pub async fn delete_status(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    // Start timing the request
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["DELETE", "/api/v1/statuses/:id"])
        .start_timer();

    let account = principal.require_scope(WRITE_STATUSES)?;
    let status_service = build_status_service(&state);

    let Some(status) = status_service.get(&id).await? else {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["DELETE", "/api/v1/statuses/:id", "200"])
            .inc();
        return Ok(Json(serde_json::json!({})));
    };

    if !status.is_owned_by(account) {
        tracing::debug!(
            status_id = %status.id,
            owner_id = %status.account_id,
            requester_id = %account.id,
            "Refusing to delete status owned by another account"
        );
        return Err(AppError::Forbidden);
    }

    // Delete the status
    let db_timer = DB_QUERY_DURATION_SECONDS
        .with_label_values(&["DELETE", "statuses"])
        .start_timer();
    let deleted = status_service.delete(&status.id).await?;
    DB_QUERIES_TOTAL
        .with_label_values(&["DELETE", "statuses"])
        .inc();
    db_timer.observe_duration();

    // Update posts total metric
    if deleted {
        POSTS_TOTAL.dec();
    }

    // Return the deleted status with its source for redrafting
    let mut response = crate::api::status_to_response(&status, account, &state.config);
    response.text = Some(status.text.clone());

    // Record successful request
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["DELETE", "/api/v1/statuses/:id", "200"])
        .inc();

    Ok(Json(to_json_value(&response)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_defaults_to_public() {
        assert_eq!(normalize_visibility_input(None).unwrap(), Visibility::Public);
        assert_eq!(
            normalize_visibility_input(Some("  ".to_string())).unwrap(),
            Visibility::Public
        );
    }

    #[test]
    fn visibility_is_case_insensitive() {
        assert_eq!(
            normalize_visibility_input(Some("Private".to_string())).unwrap(),
            Visibility::Private
        );
    }

    #[test]
    fn unknown_visibility_is_rejected() {
        let error = normalize_visibility_input(Some("friends-only".to_string())).unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }

    #[test]
    fn blank_reply_target_is_ignored() {
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(Some(" 01J ".to_string())).as_deref(), Some("01J"));
    }
}
