//! SQLite database operations
//!
//! All database access goes through this module.

use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use super::models::*;
use crate::error::AppError;

const OAUTH_ACCESS_TOKEN_HASH_PREFIX: &str = "sha256:";

/// Digest stored in place of a bearer token.
pub(crate) fn hash_oauth_access_token(access_token: &str) -> String {
    let digest = Sha256::digest(access_token.as_bytes());
    format!(
        "{}{}",
        OAUTH_ACCESS_TOKEN_HASH_PREFIX,
        URL_SAFE_NO_PAD.encode(digest)
    )
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a new account
    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, display_name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.display_name)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get account by ID
    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get account by handle
    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Update the display name of an account
    pub async fn update_account_display_name(
        &self,
        id: &str,
        display_name: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET display_name = ? WHERE id = ?")
            .bind(display_name)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Get status by ID
    pub async fn get_status(&self, id: &str) -> Result<Option<Status>, AppError> {
        let status = sqlx::query_as::<_, Status>("SELECT * FROM statuses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(status)
    }

    /// Insert a new status
    pub async fn insert_status(&self, status: &Status) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO statuses (
                id, uri, account_id, text, content, spoiler_text, sensitive,
                visibility, language, local_only, in_reply_to_id,
                in_reply_to_account_id, thread_root_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&status.id)
        .bind(&status.uri)
        .bind(&status.account_id)
        .bind(&status.text)
        .bind(&status.content)
        .bind(&status.spoiler_text)
        .bind(status.sensitive)
        .bind(status.visibility)
        .bind(&status.language)
        .bind(status.local_only)
        .bind(&status.in_reply_to_id)
        .bind(&status.in_reply_to_account_id)
        .bind(&status.thread_root_id)
        .bind(status.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete status by ID together with its preview card
    ///
    /// # Returns
    /// `true` if a status row was removed
    pub async fn delete_status(&self, id: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM preview_cards WHERE status_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM statuses WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get every status of a thread except `exclude_id`, oldest first
    pub async fn get_thread_statuses(
        &self,
        thread_root_id: &str,
        exclude_id: &str,
    ) -> Result<Vec<Status>, AppError> {
        let statuses = sqlx::query_as::<_, Status>(
            "SELECT * FROM statuses WHERE thread_root_id = ? AND id != ? ORDER BY id ASC",
        )
        .bind(thread_root_id)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(statuses)
    }

    /// Count all stored statuses
    pub async fn count_statuses(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM statuses")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Preview cards
    // =========================================================================

    /// Get the preview card attached to a status
    pub async fn get_preview_card(&self, status_id: &str) -> Result<Option<PreviewCard>, AppError> {
        let card =
            sqlx::query_as::<_, PreviewCard>("SELECT * FROM preview_cards WHERE status_id = ?")
                .bind(status_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(card)
    }

    /// Create or replace the preview card of a status
    pub async fn upsert_preview_card(&self, card: &PreviewCard) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO preview_cards (
                status_id, url, title, description, card_type, author_name,
                provider_name, image, width, height, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&card.status_id)
        .bind(&card.url)
        .bind(&card.title)
        .bind(&card.description)
        .bind(&card.card_type)
        .bind(&card.author_name)
        .bind(&card.provider_name)
        .bind(&card.image)
        .bind(card.width)
        .bind(card.height)
        .bind(card.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // OAuth Tokens
    // =========================================================================

    /// Insert OAuth token
    ///
    /// `token.access_token` is the bearer value; only its digest is stored.
    pub async fn insert_oauth_token(&self, token: &OAuthToken) -> Result<(), AppError> {
        let access_token_hash = hash_oauth_access_token(&token.access_token);
        sqlx::query(
            r#"
            INSERT INTO oauth_tokens (
                id, account_id, access_token, scopes, created_at, revoked
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.id)
        .bind(&token.account_id)
        .bind(&access_token_hash)
        .bind(&token.scopes)
        .bind(token.created_at)
        .bind(token.revoked)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a live OAuth token by bearer value
    pub async fn get_oauth_token(
        &self,
        access_token: &str,
    ) -> Result<Option<OAuthToken>, AppError> {
        let access_token_hash = hash_oauth_access_token(access_token);
        let token = sqlx::query_as::<_, OAuthToken>(
            "SELECT * FROM oauth_tokens WHERE access_token = ? AND revoked = 0",
        )
        .bind(&access_token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }
}
