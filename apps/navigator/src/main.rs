//! Despachos navigation resolver.
//!
//! Resolves the sidebar a user would see in the despachos front-end from the
//! configured catalog and a granted-permissions payload, and prints it as JSON.

#![forbid(unsafe_code)]

mod dto;
mod navigator_config;

use despachos_application::{AuthSession, NavigationCatalog, NavigationService};
use despachos_core::{AppError, UserIdentity};
use despachos_infrastructure::{InMemoryPermissionSource, JsonFileCatalogSource};
use tracing::info;

use crate::dto::NavigationResponse;
use crate::navigator_config::{NavigatorConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = NavigatorConfig::load()?;
    let service = match &config.catalog_path {
        Some(path) => {
            NavigationService::from_source(
                &JsonFileCatalogSource::new(path),
                config.expansion_mode,
            )
            .await?
        }
        None => NavigationService::new(NavigationCatalog::builtin()?, config.expansion_mode),
    };

    let permission_source = InMemoryPermissionSource::new();
    permission_source
        .set_grants(config.subject.as_str(), config.granted.clone())
        .await;

    let mut session = AuthSession::new();
    let identity = UserIdentity::new(config.subject.as_str(), config.subject.as_str(), None);
    service
        .login(&mut session, identity, &permission_source)
        .await?;

    let view = service.build_view(&session, config.current_path.as_str());
    info!(
        subject = %config.subject,
        current_path = %config.current_path,
        visible_roots = view.visible().len(),
        selected_key = view.selected_key().unwrap_or("-"),
        "navigation resolved"
    );

    let payload = serde_json::to_string_pretty(&NavigationResponse::from_view(&session, &view))
        .map_err(|error| {
            AppError::Internal(format!("failed to encode navigation response: {error}"))
        })?;
    println!("{payload}");

    session.logout();
    Ok(())
}
