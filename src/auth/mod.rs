//! Bearer-token authentication
//!
//! Handles:
//! - Credential resolution (token → principal)
//! - Scope checks
//! - Access token issuance

mod middleware;
mod principal;
pub mod scope;
pub mod token;

pub use middleware::{MaybePrincipal, resolve_principal};
pub use principal::Principal;
pub use scope::Scopes;
pub use token::issue_access_token;
