//! Application services and ports.

#![forbid(unsafe_code)]

mod auth_session;
mod navigation_catalog;
mod navigation_ports;
mod navigation_service;

pub use auth_session::AuthSession;
pub use navigation_catalog::NavigationCatalog;
pub use navigation_ports::{NavigationCatalogSource, PermissionSource};
pub use navigation_service::{NavigationService, NavigationView};
