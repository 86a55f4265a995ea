//! Access token issuance
//!
//! The OAuth flow lives outside this service; this module only mints
//! tokens for already-authorized grants (bootstrap and tests).

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::RngCore;

use super::scope::Scopes;
use crate::data::{Database, EntityId, OAuthToken};
use crate::error::AppError;

const ACCESS_TOKEN_BYTES: usize = 32;

fn generate_access_token() -> String {
    let mut bytes = [0u8; ACCESS_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Issue a bearer token for `account_id` with the given scopes
///
/// # Returns
/// The bearer value; only its digest is persisted
pub async fn issue_access_token(
    db: &Database,
    account_id: &str,
    scopes: &Scopes,
) -> Result<String, AppError> {
    let access_token = generate_access_token();
    let token = OAuthToken {
        id: EntityId::new().0,
        account_id: account_id.to_string(),
        access_token: access_token.clone(),
        scopes: scopes.to_string(),
        created_at: Utc::now(),
        revoked: false,
    };

    db.insert_oauth_token(&token).await?;

    tracing::info!(
        token_id = %token.id,
        account_id = %token.account_id,
        scopes = %token.scopes,
        "Access token issued"
    );

    Ok(access_token)
}
