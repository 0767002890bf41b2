use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use despachos_core::AppError;
use despachos_domain::ExpansionMode;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    pub catalog_path: Option<PathBuf>,
    pub expansion_mode: ExpansionMode,
    pub subject: String,
    pub granted: Value,
    pub current_path: String,
}

impl NavigatorConfig {
    pub fn load() -> Result<Self, AppError> {
        let granted_argument = env::args().nth(1);
        Self::from_lookup(|name| env::var(name).ok(), granted_argument)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        granted_argument: Option<String>,
    ) -> Result<Self, AppError> {
        let catalog_path = lookup("NAVIGATION_CATALOG_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let expansion_mode = lookup("PERMISSION_EXPANSION_MODE")
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                ExpansionMode::from_str(value.trim()).map_err(|_| {
                    AppError::Validation(format!(
                        "PERMISSION_EXPANSION_MODE must be either 'one_level' or 'full_closure', got '{value}'"
                    ))
                })
            })
            .transpose()?
            .unwrap_or_default();

        let subject = lookup("NAVIGATOR_SUBJECT")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "local-user".to_owned());

        let granted = match granted_argument.or_else(|| lookup("NAVIGATOR_GRANTED")) {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Value>(&raw)
                .map_err(|error| {
                    AppError::Validation(format!("granted permissions must be JSON: {error}"))
                })?,
            _ => Value::Array(Vec::new()),
        };

        let current_path = lookup("NAVIGATOR_CURRENT_PATH")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "/".to_owned());

        Ok(Self {
            catalog_path,
            expansion_mode,
            subject,
            granted,
            current_path,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
