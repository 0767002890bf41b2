use async_trait::async_trait;
use despachos_core::AppResult;
use serde_json::Value;

use crate::NavigationCatalog;

/// Port supplying a user's granted permissions as the backend delivers them.
///
/// The payload is either an array of codes or an object of code to flag; it is
/// normalized by the caller.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Fetches the raw grant payload for a subject.
    async fn fetch_granted(&self, subject: &str) -> AppResult<Value>;
}

/// Port loading the static navigation configuration.
#[async_trait]
pub trait NavigationCatalogSource: Send + Sync {
    /// Loads the hierarchy table and menu tree.
    async fn load_catalog(&self) -> AppResult<NavigationCatalog>;
}
