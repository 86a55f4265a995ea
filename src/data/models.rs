//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

lazy_static! {
    static ref ID_GENERATOR: Mutex<ulid::Generator> = Mutex::new(ulid::Generator::new());
}

/// Entity ID wrapper (ULID format, 26 characters)
///
/// IDs handed out by one process are strictly increasing, so ordering by
/// ID is ordering by creation.
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new monotonic ULID
    pub fn new() -> Self {
        let generated = ID_GENERATOR
            .lock()
            .ok()
            .and_then(|mut generator| generator.generate().ok());
        Self(generated.unwrap_or_else(ulid::Ulid::new).to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Account
// =============================================================================

/// A local account that owns statuses
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    /// Unique handle
    pub username: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Status
// =============================================================================

/// Declared audience of a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown visibility name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVisibility(pub String);

impl fmt::Display for UnknownVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown visibility: {}", self.0)
    }
}

impl std::error::Error for UnknownVisibility {}

impl FromStr for Visibility {
    type Err = UnknownVisibility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "unlisted" => Ok(Self::Unlisted),
            "private" => Ok(Self::Private),
            "direct" => Ok(Self::Direct),
            _ => Err(UnknownVisibility(s.to_string())),
        }
    }
}

/// A post/toot
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    pub id: String,
    /// Canonical URI (globally unique)
    pub uri: String,
    /// Owning account
    pub account_id: String,
    /// Raw text as submitted
    pub text: String,
    /// Rendered HTML content
    pub content: String,
    /// Content warning text (empty when unset)
    pub spoiler_text: String,
    pub sensitive: bool,
    pub visibility: Visibility,
    /// Language code (ISO 639-1)
    pub language: Option<String>,
    /// Hidden from callers that are not authenticated on this instance
    pub local_only: bool,
    /// Parent status; may point at a deleted status
    pub in_reply_to_id: Option<String>,
    pub in_reply_to_account_id: Option<String>,
    /// ID of the first status of the thread (own ID for a root)
    pub thread_root_id: String,
    pub created_at: DateTime<Utc>,
}

impl Status {
    pub fn is_owned_by(&self, account: &Account) -> bool {
        self.account_id == account.id
    }
}

// =============================================================================
// Preview cards
// =============================================================================

/// Link preview attached to a status
///
/// Rows are written by the card fetcher; this crate only reads them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PreviewCard {
    pub status_id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    /// Type: link, photo, video, rich
    pub card_type: String,
    pub author_name: String,
    pub provider_name: String,
    pub image: Option<String>,
    pub width: i64,
    pub height: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// OAuth Tokens
// =============================================================================

/// OAuth access token
///
/// `access_token` holds the digest, never the bearer value.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OAuthToken {
    pub id: String,
    pub account_id: String,
    pub access_token: String,
    /// Space-separated scope list
    pub scopes: String,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}
