//! OAuth scopes
//!
//! Mastodon scopes form a two-level hierarchy: a top-level scope such as
//! `write` grants every `write:*` sub-scope.

use std::collections::BTreeSet;
use std::fmt;

/// Sub-scope required to create or delete statuses
pub const WRITE_STATUSES: &str = "write:statuses";

/// Set of scopes granted to a credential
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scopes(BTreeSet<String>);

impl Scopes {
    /// Parse a space-separated scope list
    pub fn parse(raw: &str) -> Self {
        Self(raw.split_whitespace().map(ToOwned::to_owned).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `required` is granted directly or through its parent scope
    pub fn allows(&self, required: &str) -> bool {
        if self.0.contains(required) {
            return true;
        }

        required
            .split_once(':')
            .is_some_and(|(parent, _)| self.0.contains(parent))
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.0.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
        f.write_str(&joined)
    }
}
