//! Resolved request identity

use super::scope::Scopes;
use crate::data::Account;
use crate::error::AppError;

/// Who is making a request
#[derive(Debug, Clone)]
pub enum Principal {
    /// No credential, an unknown credential, or a credential with no scopes
    Anonymous,
    /// A local account presenting a live access token
    Authenticated { account: Account, scopes: Scopes },
}

impl Principal {
    /// Build a principal from a resolved token; an empty scope set is anonymous.
    pub fn from_grant(account: Account, scopes: Scopes) -> Self {
        if scopes.is_empty() {
            Self::Anonymous
        } else {
            Self::Authenticated { account, scopes }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn account(&self) -> Option<&Account> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { account, .. } => Some(account),
        }
    }

    /// Require an authenticated principal holding `scope`
    ///
    /// # Errors
    /// `Unauthorized` when anonymous, `Forbidden` when the scope is missing
    pub fn require_scope(&self, scope: &str) -> Result<&Account, AppError> {
        match self {
            Self::Anonymous => Err(AppError::Unauthorized),
            Self::Authenticated { account, scopes } if scopes.allows(scope) => Ok(account),
            Self::Authenticated { account, scopes } => {
                tracing::debug!(
                    account_id = %account.id,
                    granted = %scopes,
                    required = scope,
                    "Credential lacks required scope"
                );
                Err(AppError::Forbidden)
            }
        }
    }
}
