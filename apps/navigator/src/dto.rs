use despachos_application::{AuthSession, NavigationView};
use despachos_domain::VisibleMenuNode;
use serde::Serialize;
use ts_rs::TS;

/// Sidebar entry the authenticated user may see.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "menu-item-response.ts")]
pub struct MenuItemResponse {
    pub key: String,
    pub label: String,
    pub icon: Option<String>,
    pub target: Option<String>,
    pub children: Vec<MenuItemResponse>,
}

impl From<&VisibleMenuNode> for MenuItemResponse {
    fn from(node: &VisibleMenuNode) -> Self {
        Self {
            key: node.key.clone(),
            label: node.label.clone(),
            icon: node.icon.clone(),
            target: node.target.clone(),
            children: node.children.iter().map(Self::from).collect(),
        }
    }
}

/// Navigation state resolved for the current session.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "navigation-response.ts")]
pub struct NavigationResponse {
    pub subject: Option<String>,
    pub session_id: String,
    pub permissions: Vec<String>,
    pub menu: Vec<MenuItemResponse>,
    pub selected_key: Option<String>,
    pub open_keys: Vec<String>,
}

impl NavigationResponse {
    pub fn from_view(session: &AuthSession, view: &NavigationView) -> Self {
        Self {
            subject: session
                .identity()
                .map(|identity| identity.subject().to_owned()),
            session_id: session.session_id().to_string(),
            permissions: view
                .expanded()
                .iter()
                .map(|code| code.as_str().to_owned())
                .collect(),
            menu: view.visible().iter().map(MenuItemResponse::from).collect(),
            selected_key: view.selected_key().map(ToOwned::to_owned),
            open_keys: view.open_submenus().open_keys().to_vec(),
        }
    }
}
