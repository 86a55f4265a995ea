//! localtoot - status visibility for a Mastodon-compatible server
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Mastodon status endpoints                                │
//! │  - Prometheus metrics                                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Visibility policy (local-only, private, direct)          │
//! │  - Status storage and thread context                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers for the Mastodon status API
//! - `service`: Visibility policy and status storage
//! - `data`: Database layer
//! - `auth`: Bearer token resolution and scopes
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::Arc;

/// Largest accepted request body
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Ensure the admin account exists
    /// 3. Seed the posts gauge
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        // 2. Initialize admin account
        Self::ensure_admin_account(&db, &config).await?;

        // 3. Seed metrics from persisted state
        let status_count = db.count_statuses().await?;
        metrics::POSTS_TOTAL.set(status_count);

        tracing::info!(
            statuses = status_count,
            "Application state initialized successfully"
        );

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
        })
    }

    /// Ensure the configured admin account exists
    ///
    /// The account is looked up by username; an existing row is left as is
    /// except for its display name.
    async fn ensure_admin_account(
        db: &data::Database,
        config: &config::AppConfig,
    ) -> Result<(), error::AppError> {
        let username = config.admin.username.trim();

        if let Some(account) = db.get_account_by_username(username).await? {
            if account.display_name.as_deref() != Some(config.admin.display_name.as_str()) {
                db.update_account_display_name(&account.id, &config.admin.display_name)
                    .await?;
                tracing::info!(username = %account.username, "Admin account updated");
            } else {
                tracing::info!(username = %account.username, "Admin account exists");
            }
            return Ok(());
        }

        let account = data::Account {
            id: data::EntityId::new().0,
            username: username.to_string(),
            display_name: Some(config.admin.display_name.clone()),
            created_at: chrono::Utc::now(),
        };
        db.insert_account(&account).await?;

        tracing::info!(
            username = %account.username,
            display_name = ?account.display_name,
            "Admin account created"
        );

        Ok(())
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
    };

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::mastodon_api_router())
        .merge(api::metrics_router())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
