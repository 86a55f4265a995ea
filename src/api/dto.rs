//! Mastodon API response DTOs
//!
//! Data Transfer Objects for Mastodon-compatible API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Visibility;

/// Account response (Mastodon API compatible subset)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub acct: String,
    pub display_name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Status response (Mastodon API compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub in_reply_to_id: Option<String>,
    pub in_reply_to_account_id: Option<String>,
    pub sensitive: bool,
    pub spoiler_text: String,
    pub visibility: Visibility,
    pub local_only: bool,
    pub language: Option<String>,
    pub uri: String,
    pub url: String,
    pub content: String,
    /// Source text, only present in delete responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub account: AccountResponse,
}

/// Context response (ancestors and descendants)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResponse {
    pub ancestors: Vec<StatusResponse>,
    pub descendants: Vec<StatusResponse>,
}

/// Preview card response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewCardResponse {
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub author_name: String,
    pub provider_name: String,
    pub image: Option<String>,
    pub width: i64,
    pub height: i64,
}
