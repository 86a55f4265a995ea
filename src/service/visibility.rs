//! Status visibility policy
//!
//! Pure decisions about who may see a status and whether a new status is
//! local-only. Nothing here touches the database.

use crate::auth::Principal;
use crate::data::{Status, Visibility};

/// Marker that flags a status as local-only when no explicit choice is made.
///
/// Clients may append U+FE0F after it; a substring test covers both forms.
pub const LOCAL_ONLY_EMOJI: &str = "\u{1F441}";

/// Why a status was withheld from a caller
///
/// Only used for logging and metrics; callers always see "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Local-only status requested by an anonymous caller
    LocalOnly,
    /// Private or direct status requested by an anonymous caller
    Restricted,
}

impl Denial {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalOnly => "local_only",
            Self::Restricted => "restricted",
        }
    }
}

/// Decide whether `principal` may see `status`
///
/// # Errors
/// The reason the status is hidden
pub fn check_visibility(status: &Status, principal: &Principal) -> Result<(), Denial> {
    if principal.is_authenticated() {
        return Ok(());
    }

    match status.visibility {
        Visibility::Private | Visibility::Direct => Err(Denial::Restricted),
        Visibility::Public | Visibility::Unlisted if status.local_only => Err(Denial::LocalOnly),
        Visibility::Public | Visibility::Unlisted => Ok(()),
    }
}

pub fn is_visible(status: &Status, principal: &Principal) -> bool {
    check_visibility(status, principal).is_ok()
}

/// Decide the `local_only` flag of a new status
///
/// An explicit value wins; otherwise the eyeball marker in the text decides.
pub fn compute_local_only(content: &str, explicit: Option<bool>) -> bool {
    explicit.unwrap_or_else(|| content.contains(LOCAL_ONLY_EMOJI))
}
