//! Conversion functions from database models to API DTOs

use crate::api::dto::*;
use crate::config::AppConfig;
use crate::data::{Account, PreviewCard, Status};

/// Convert Account to AccountResponse
pub fn account_to_response(account: &Account, config: &AppConfig) -> AccountResponse {
    let base_url = config.server.base_url();

    AccountResponse {
        id: account.id.clone(),
        username: account.username.clone(),
        acct: account.username.clone(), // Local account, no @domain
        display_name: account
            .display_name
            .clone()
            .unwrap_or_else(|| account.username.clone()),
        url: format!("{}/@{}", base_url, account.username),
        created_at: account.created_at,
    }
}

/// Convert Status to StatusResponse
///
/// `account` must be the owner of `status`.
pub fn status_to_response(status: &Status, account: &Account, config: &AppConfig) -> StatusResponse {
    StatusResponse {
        id: status.id.clone(),
        created_at: status.created_at,
        in_reply_to_id: status.in_reply_to_id.clone(),
        in_reply_to_account_id: status.in_reply_to_account_id.clone(),
        sensitive: status.sensitive,
        spoiler_text: status.spoiler_text.clone(),
        visibility: status.visibility,
        local_only: status.local_only,
        language: status.language.clone(),
        uri: status.uri.clone(),
        url: format!(
            "{}/@{}/{}",
            config.server.base_url(),
            account.username,
            status.id
        ),
        content: status.content.clone(),
        text: None,
        account: account_to_response(account, config),
    }
}

/// Convert PreviewCard to PreviewCardResponse
pub fn card_to_response(card: &PreviewCard) -> PreviewCardResponse {
    PreviewCardResponse {
        url: card.url.clone(),
        title: card.title.clone(),
        description: card.description.clone(),
        card_type: card.card_type.clone(),
        author_name: card.author_name.clone(),
        provider_name: card.provider_name.clone(),
        image: card.image.clone(),
        width: card.width,
        height: card.height,
    }
}
