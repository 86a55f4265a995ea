//! Common test utilities for E2E tests

#![allow(dead_code)]

use chrono::Utc;
use localtoot::auth::{Scopes, issue_access_token};
use localtoot::data::{Account, EntityId, PreviewCard, Status, Visibility};
use localtoot::service::{NewStatus, StatusService};
use localtoot::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_max_characters(500).await
    }

    /// Create a test server with a custom status length limit
    pub async fn with_max_characters(max_characters: usize) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "https".to_string(),
            },
            database: config::DatabaseConfig { path: db_path },
            admin: config::AdminConfig {
                username: "admin".to_string(),
                display_name: "Admin".to_string(),
            },
            statuses: config::StatusesConfig { max_characters },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        localtoot::metrics::init_metrics();

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = localtoot::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a local account in the database
    pub async fn create_account(&self, username: &str) -> Account {
        let account = Account {
            id: EntityId::new().0,
            username: username.to_string(),
            display_name: Some(username.to_string()),
            created_at: Utc::now(),
        };
        self.state.db.insert_account(&account).await.unwrap();
        account
    }

    /// Issue a bearer token for `account` with space-separated `scopes`
    pub async fn create_token(&self, account: &Account, scopes: &str) -> String {
        issue_access_token(&self.state.db, &account.id, &Scopes::parse(scopes))
            .await
            .unwrap()
    }

    /// Store a status directly, bypassing the HTTP layer
    pub async fn create_status(
        &self,
        account: &Account,
        visibility: Visibility,
        local_only: bool,
        in_reply_to: Option<&Status>,
    ) -> Status {
        let service = StatusService::new(
            self.state.db.clone(),
            self.state.config.server.base_url(),
        );
        service
            .create(
                account,
                NewStatus {
                    text: "Hello world".to_string(),
                    spoiler_text: String::new(),
                    sensitive: false,
                    visibility,
                    language: Some("en".to_string()),
                    local_only,
                    in_reply_to,
                },
            )
            .await
            .unwrap()
    }

    /// Attach a preview card to `status`
    pub async fn create_card(&self, status: &Status) -> PreviewCard {
        let card = PreviewCard {
            status_id: status.id.clone(),
            url: "https://example.org/article".to_string(),
            title: "An article".to_string(),
            description: "Something worth linking".to_string(),
            card_type: "link".to_string(),
            author_name: String::new(),
            provider_name: "example.org".to_string(),
            image: None,
            width: 0,
            height: 0,
            created_at: Utc::now(),
        };
        self.state.db.upsert_preview_card(&card).await.unwrap();
        card
    }
}
