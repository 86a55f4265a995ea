//! Credential resolution
//!
//! Turns the bearer token of a request into a [`Principal`].

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use super::principal::Principal;
use super::scope::Scopes;
use crate::AppState;
use crate::data::Database;
use crate::error::AppError;

/// Resolve a bearer token against stored access tokens
///
/// Missing, unknown and revoked tokens all resolve to `Anonymous`.
pub async fn resolve_principal(token: Option<&str>, db: &Database) -> Result<Principal, AppError> {
    let Some(token) = token else {
        return Ok(Principal::Anonymous);
    };

    let Some(grant) = db.get_oauth_token(token).await? else {
        tracing::debug!("Bearer token not recognised; treating caller as anonymous");
        return Ok(Principal::Anonymous);
    };

    let Some(account) = db.get_account(&grant.account_id).await? else {
        tracing::warn!(
            token_id = %grant.id,
            account_id = %grant.account_id,
            "Access token references a missing account"
        );
        return Ok(Principal::Anonymous);
    };

    Ok(Principal::from_grant(account, Scopes::parse(&grant.scopes)))
}

/// Extractor for the requesting principal
///
/// Never rejects an unauthenticated request; handlers decide what
/// an anonymous caller may do.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     MaybePrincipal(principal): MaybePrincipal,
/// ) -> impl IntoResponse {
///     format!("authenticated: {}", principal.is_authenticated())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for MaybePrincipal
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(MaybePrincipal(principal));
        }

        let app_state = AppState::from_ref(state);
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok();
        let token = bearer.as_ref().map(|TypedHeader(auth)| auth.token());

        let principal = resolve_principal(token, &app_state.db).await?;
        parts.extensions.insert(principal.clone());

        Ok(MaybePrincipal(principal))
    }
}
