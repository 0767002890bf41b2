use std::collections::HashMap;

use async_trait::async_trait;
use despachos_application::PermissionSource;
use despachos_core::AppResult;
use serde_json::Value;
use tokio::sync::RwLock;

/// In-memory permission source keyed by subject.
///
/// Subjects without an entry receive an empty grant list.
#[derive(Debug, Default)]
pub struct InMemoryPermissionSource {
    grants: RwLock<HashMap<String, Value>>,
}

impl InMemoryPermissionSource {
    /// Creates an empty in-memory permission source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the raw grant payload of a subject.
    pub async fn set_grants(&self, subject: &str, raw: Value) {
        self.grants.write().await.insert(subject.to_owned(), raw);
    }

    /// Removes every grant of a subject.
    pub async fn revoke_all(&self, subject: &str) {
        self.grants.write().await.remove(subject);
    }
}

#[async_trait]
impl PermissionSource for InMemoryPermissionSource {
    async fn fetch_granted(&self, subject: &str) -> AppResult<Value> {
        Ok(self
            .grants
            .read()
            .await
            .get(subject)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())))
    }
}
