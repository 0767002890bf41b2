use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use despachos_application::{NavigationCatalog, NavigationCatalogSource};
use despachos_core::{AppError, AppResult};
use tracing::warn;

/// Catalog source reading `{ "hierarchy": {...}, "menu": [...] }` from disk.
#[derive(Debug, Clone)]
pub struct JsonFileCatalogSource {
    path: PathBuf,
}

impl JsonFileCatalogSource {
    /// Creates a source for the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the configured file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

#[async_trait]
impl NavigationCatalogSource for JsonFileCatalogSource {
    async fn load_catalog(&self) -> AppResult<NavigationCatalog> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => AppError::NotFound(format!(
                    "navigation catalog '{}' does not exist",
                    self.path.display()
                )),
                _ => AppError::Internal(format!(
                    "failed to read navigation catalog '{}': {error}",
                    self.path.display()
                )),
            })?;

        let catalog = serde_json::from_str::<NavigationCatalog>(&contents).map_err(|error| {
            AppError::Validation(format!(
                "invalid navigation catalog '{}': {error}",
                self.path.display()
            ))
        })?;

        for code in catalog.hierarchy().cycles() {
            warn!(
                path = %self.path.display(),
                permission = %code,
                "permission hierarchy entry implies itself"
            );
        }

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use despachos_application::NavigationCatalogSource;
    use despachos_core::AppError;

    use super::JsonFileCatalogSource;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "despachos-catalog-{}-{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap_or_else(|_| unreachable!("temp dir is writable"));
        path
    }

    #[tokio::test]
    async fn loads_catalog_from_file() {
        let path = scratch_file(
            "valid",
            r#"{
                "hierarchy": {"almacen.can_manage_warehouse": ["almacen.view_stock"]},
                "menu": [
                    {"key": "almacen", "label": "Almacén", "children": [
                        {"key": "stock", "label": "Stock", "target": "/almacen/stock",
                         "required_permission": "almacen.view_stock"}
                    ]}
                ]
            }"#,
        );

        let catalog = JsonFileCatalogSource::new(&path).load_catalog().await;
        let _ = std::fs::remove_file(&path);

        assert!(catalog.is_ok());
        let catalog = catalog.unwrap_or_default();
        assert_eq!(catalog.hierarchy().len(), 1);
        assert_eq!(catalog.menu().nodes().len(), 1);
    }

    #[tokio::test]
    async fn cyclic_hierarchy_still_loads() {
        let path = scratch_file(
            "cyclic",
            r#"{"hierarchy": {"a": ["b"], "b": ["a"]}, "menu": []}"#,
        );

        let catalog = JsonFileCatalogSource::new(&path).load_catalog().await;
        let _ = std::fs::remove_file(&path);

        assert!(catalog.is_ok());
    }

    #[tokio::test]
    async fn duplicate_menu_keys_are_rejected() {
        let path = scratch_file(
            "duplicate",
            r#"{"menu": [
                {"key": "stock", "label": "Stock", "target": "/a"},
                {"key": "stock", "label": "Stock", "target": "/b"}
            ]}"#,
        );

        let catalog = JsonFileCatalogSource::new(&path).load_catalog().await;
        let _ = std::fs::remove_file(&path);

        assert!(matches!(catalog, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let source = JsonFileCatalogSource::new("/nonexistent/despachos/catalog.json");
        let catalog = source.load_catalog().await;
        assert!(matches!(catalog, Err(AppError::NotFound(_))));
    }
}
