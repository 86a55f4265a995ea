//! Status service
//!
//! Handles status (post/toot) storage: create, lookup, thread
//! traversal and delete.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::data::{Account, Database, EntityId, PreviewCard, Status, Visibility};
use crate::error::AppError;

/// Input for a new status
///
/// `local_only` is already decided; see `service::visibility`.
#[derive(Debug, Clone)]
pub struct NewStatus<'a> {
    pub text: String,
    pub spoiler_text: String,
    pub sensitive: bool,
    pub visibility: Visibility,
    pub language: Option<String>,
    pub local_only: bool,
    pub in_reply_to: Option<&'a Status>,
}

/// Ancestors and descendants of a status, oldest first
#[derive(Debug, Clone, Default)]
pub struct ThreadContext {
    pub ancestors: Vec<Status>,
    pub descendants: Vec<Status>,
}

/// Status service
pub struct StatusService {
    db: Arc<Database>,
    base_url: String,
}

impl StatusService {
    /// Create new status service
    pub fn new(db: Arc<Database>, base_url: String) -> Self {
        Self { db, base_url }
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Create a new status owned by `account`
    ///
    /// The caller has already checked the `write` capability.
    ///
    /// # Returns
    /// Created status
    pub async fn create(&self, account: &Account, new: NewStatus<'_>) -> Result<Status, AppError> {
        let status_id = EntityId::new().0;
        let uri = format!(
            "{}/users/{}/statuses/{}",
            self.base_url.trim_end_matches('/'),
            account.username,
            status_id
        );
        let thread_root_id = new
            .in_reply_to
            .map(|parent| parent.thread_root_id.clone())
            .unwrap_or_else(|| status_id.clone());

        let status = Status {
            id: status_id,
            uri,
            account_id: account.id.clone(),
            content: render_content(&new.text),
            text: new.text,
            spoiler_text: new.spoiler_text,
            sensitive: new.sensitive,
            visibility: new.visibility,
            language: new.language,
            local_only: new.local_only,
            in_reply_to_id: new.in_reply_to.map(|parent| parent.id.clone()),
            in_reply_to_account_id: new.in_reply_to.map(|parent| parent.account_id.clone()),
            thread_root_id,
            created_at: chrono::Utc::now(),
        };

        self.db.insert_status(&status).await?;

        tracing::info!(
            status_id = %status.id,
            account_id = %status.account_id,
            visibility = %status.visibility,
            local_only = status.local_only,
            "Status created"
        );

        Ok(status)
    }

    /// Try to get status by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Status>, AppError> {
        self.db.get_status(id).await
    }

    /// Delete a status
    ///
    /// # Returns
    /// `true` if the status existed
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let deleted = self.db.delete_status(id).await?;
        if deleted {
            tracing::info!(status_id = %id, "Status deleted");
        } else {
            tracing::debug!(status_id = %id, "Delete requested for absent status");
        }
        Ok(deleted)
    }

    // =========================================================================
    // Threads
    // =========================================================================

    /// Every other status sharing the thread root of `status`, oldest first
    pub async fn get_thread(&self, status: &Status) -> Result<Vec<Status>, AppError> {
        self.db
            .get_thread_statuses(&status.thread_root_id, &status.id)
            .await
    }

    /// Split the thread around `status` into ancestors and descendants
    ///
    /// Siblings and cousins are not part of the context. The ancestor walk
    /// stops at the first deleted parent.
    pub async fn get_context(&self, status: &Status) -> Result<ThreadContext, AppError> {
        let thread = self.get_thread(status).await?;
        Ok(split_thread(status, thread))
    }

    // =========================================================================
    // Cards
    // =========================================================================

    /// Get the stored preview card of a status
    pub async fn get_card(&self, status_id: &str) -> Result<Option<PreviewCard>, AppError> {
        self.db.get_preview_card(status_id).await
    }
}

fn render_content(text: &str) -> String {
    format!("<p>{}</p>", html_escape::encode_text(text))
}

fn split_thread(status: &Status, thread: Vec<Status>) -> ThreadContext {
    let by_id: HashMap<&str, &Status> = thread.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut ancestors = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = status.in_reply_to_id.as_deref();
    while let Some(parent_id) = cursor {
        let Some(parent) = by_id.get(parent_id) else {
            break;
        };
        if !seen.insert(parent_id) {
            break;
        }
        ancestors.push((*parent).clone());
        cursor = parent.in_reply_to_id.as_deref();
    }
    ancestors.reverse();

    // Thread rows come oldest first, so a parent is always seen before its replies.
    let mut subtree: HashSet<&str> = HashSet::from([status.id.as_str()]);
    let mut descendants = Vec::new();
    for candidate in &thread {
        let Some(parent_id) = candidate.in_reply_to_id.as_deref() else {
            continue;
        };
        if subtree.contains(parent_id) {
            subtree.insert(candidate.id.as_str());
            descendants.push(candidate.clone());
        }
    }

    ThreadContext {
        ancestors,
        descendants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Database::connect(&db_path).await.unwrap();
        (Arc::new(db), temp_dir)
    }

    async fn seed_account(db: &Database, username: &str) -> Account {
        let account = Account {
            id: EntityId::new().0,
            username: username.to_string(),
            display_name: Some(username.to_string()),
            created_at: Utc::now(),
        };
        db.insert_account(&account).await.unwrap();
        account
    }

    fn new_status<'a>(text: &str, in_reply_to: Option<&'a Status>) -> NewStatus<'a> {
        NewStatus {
            text: text.to_string(),
            spoiler_text: String::new(),
            sensitive: false,
            visibility: Visibility::Public,
            language: Some("en".to_string()),
            local_only: false,
            in_reply_to,
        }
    }

    fn ids(statuses: &[Status]) -> Vec<&str> {
        statuses.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn create_persists_local_status() {
        let (db, _temp_dir) = create_test_db().await;
        let account = seed_account(&db, "alice").await;
        let service = StatusService::new(db.clone(), "https://test.example.com/".to_string());

        let mut input = new_status("hello <b>world</b>", None);
        input.local_only = true;
        let status = service.create(&account, input).await.unwrap();

        assert_eq!(
            status.uri,
            format!("https://test.example.com/users/alice/statuses/{}", status.id)
        );
        assert_eq!(status.content, "<p>hello &lt;b&gt;world&lt;/b&gt;</p>");
        assert_eq!(status.thread_root_id, status.id);

        let persisted = service.get(&status.id).await.unwrap().unwrap();
        assert_eq!(persisted.text, "hello <b>world</b>");
        assert!(persisted.local_only);
        assert_eq!(persisted.account_id, account.id);
    }

    #[tokio::test]
    async fn replies_join_the_parent_thread() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_account(&db, "alice").await;
        let bob = seed_account(&db, "bob").await;
        let service = StatusService::new(db, "https://test.example.com".to_string());

        let root = service.create(&alice, new_status("root", None)).await.unwrap();
        let reply = service
            .create(&bob, new_status("reply", Some(&root)))
            .await
            .unwrap();

        assert_eq!(reply.thread_root_id, root.id);
        assert_eq!(reply.in_reply_to_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(reply.in_reply_to_account_id.as_deref(), Some(alice.id.as_str()));
    }

    #[tokio::test]
    async fn delete_then_get_is_absent() {
        let (db, _temp_dir) = create_test_db().await;
        let account = seed_account(&db, "alice").await;
        let service = StatusService::new(db, "https://test.example.com".to_string());

        let status = service.create(&account, new_status("bye", None)).await.unwrap();

        assert!(service.delete(&status.id).await.unwrap());
        assert!(service.get(&status.id).await.unwrap().is_none());
        assert!(!service.delete(&status.id).await.unwrap());
        assert!(service.get(&status.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn context_separates_ancestors_descendants_and_siblings() {
        let (db, _temp_dir) = create_test_db().await;
        let account = seed_account(&db, "alice").await;
        let service = StatusService::new(db, "https://test.example.com".to_string());

        let root = service.create(&account, new_status("root", None)).await.unwrap();
        let middle = service
            .create(&account, new_status("middle", Some(&root)))
            .await
            .unwrap();
        let sibling = service
            .create(&account, new_status("sibling", Some(&root)))
            .await
            .unwrap();
        let child = service
            .create(&account, new_status("child", Some(&middle)))
            .await
            .unwrap();
        let grandchild = service
            .create(&account, new_status("grandchild", Some(&child)))
            .await
            .unwrap();

        let thread = service.get_thread(&middle).await.unwrap();
        assert_eq!(
            ids(&thread),
            vec![
                root.id.as_str(),
                sibling.id.as_str(),
                child.id.as_str(),
                grandchild.id.as_str()
            ]
        );

        let context = service.get_context(&middle).await.unwrap();
        assert_eq!(ids(&context.ancestors), vec![root.id.as_str()]);
        assert_eq!(
            ids(&context.descendants),
            vec![child.id.as_str(), grandchild.id.as_str()]
        );

        let leaf_context = service.get_context(&grandchild).await.unwrap();
        assert_eq!(
            ids(&leaf_context.ancestors),
            vec![root.id.as_str(), middle.id.as_str(), child.id.as_str()]
        );
        assert!(leaf_context.descendants.is_empty());
    }

    #[tokio::test]
    async fn context_tolerates_deleted_parent() {
        let (db, _temp_dir) = create_test_db().await;
        let account = seed_account(&db, "alice").await;
        let service = StatusService::new(db, "https://test.example.com".to_string());

        let root = service.create(&account, new_status("root", None)).await.unwrap();
        let middle = service
            .create(&account, new_status("middle", Some(&root)))
            .await
            .unwrap();
        let leaf = service
            .create(&account, new_status("leaf", Some(&middle)))
            .await
            .unwrap();

        service.delete(&middle.id).await.unwrap();

        let context = service.get_context(&leaf).await.unwrap();
        assert!(context.ancestors.is_empty());

        let root_context = service.get_context(&root).await.unwrap();
        assert!(root_context.descendants.is_empty());
    }
}
