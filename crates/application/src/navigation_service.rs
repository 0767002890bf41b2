use std::sync::Arc;

use despachos_core::{AppError, AppResult, UserIdentity};
use despachos_domain::{
    ExpandedPermissions, ExpansionMode, GrantedPermissions, OpenSubmenus, VisibleMenuNode,
    expand_permissions, filter_menu, open_path_for, selected_key,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{AuthSession, NavigationCatalog, NavigationCatalogSource, PermissionSource};


/// Application service deriving what a session may navigate to.
#[derive(Clone)]
pub struct NavigationService {
    catalog: Arc<NavigationCatalog>,
    mode: ExpansionMode,
}

impl NavigationService {
    /// Creates a navigation service over a loaded catalog.
    #[must_use]
    pub fn new(catalog: NavigationCatalog, mode: ExpansionMode) -> Self {
        Self {
            catalog: Arc::new(catalog),
            mode,
        }
    }

    /// Loads the catalog from a source and creates the service.
    pub async fn from_source(
        source: &dyn NavigationCatalogSource,
        mode: ExpansionMode,
    ) -> AppResult<Self> {
        let catalog = source.load_catalog().await?;
        info!(
            hierarchy_entries = catalog.hierarchy().len(),
            menu_roots = catalog.menu().nodes().len(),
            mode = mode.as_str(),
            "navigation catalog loaded"
        );

        Ok(Self::new(catalog, mode))
    }

    /// Returns the catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &NavigationCatalog {
        &self.catalog
    }

    /// Returns the expansion mode in use.
    #[must_use]
    pub fn mode(&self) -> ExpansionMode {
        self.mode
    }

    /// Fetches grants for `identity` and logs it into the session.
    pub async fn login(
        &self,
        session: &mut AuthSession,
        identity: UserIdentity,
        source: &dyn PermissionSource,
    ) -> AppResult<()> {
        let raw = source.fetch_granted(identity.subject()).await?;
        let granted = GrantedPermissions::from_value(&raw);
        info!(
            subject = %identity.subject(),
            session_id = %session.session_id(),
            granted = granted.len(),
            "session logged in"
        );

        session.login(identity, granted);
        Ok(())
    }

    /// Refetches grants for the logged-in user, e.g. after a pushed role change.
    pub async fn refresh_session(
        &self,
        session: &mut AuthSession,
        source: &dyn PermissionSource,
    ) -> AppResult<()> {
        let subject = session
            .identity()
            .map(|identity| identity.subject().to_owned())
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "cannot refresh permissions without an authenticated user".to_owned(),
                )
            })?;

        let raw = source.fetch_granted(subject.as_str()).await?;
        let granted = GrantedPermissions::from_value(&raw);
        debug!(
            subject = %subject,
            granted = granted.len(),
            "session permissions refreshed"
        );

        session.refresh_permissions(granted)
    }

    /// Returns granted plus implied permissions of the session.
    #[must_use]
    pub fn expanded_permissions(&self, session: &AuthSession) -> ExpandedPermissions {
        expand_permissions(session.granted(), self.catalog.hierarchy(), self.mode)
    }

    /// Returns the menu entries the session may see. Empty when anonymous.
    #[must_use]
    pub fn visible_menu(&self, session: &AuthSession) -> Vec<VisibleMenuNode> {
        if !session.is_authenticated() {
            return Vec::new();
        }

        let expanded = self.expanded_permissions(session);
        filter_menu(self.catalog.menu().nodes(), &expanded)
    }

    /// Builds the sidebar state for a session at `current_path`.
    ///
    /// Submenus enclosing the selected entry start open.
    #[must_use]
    pub fn build_view(&self, session: &AuthSession, current_path: &str) -> NavigationView {
        let mut view = self.empty_view(session);
        view.select(current_path);

        let default_open = view
            .selected_key()
            .and_then(|key| open_path_for(&view.visible, key))
            .unwrap_or_default();
        view.open = OpenSubmenus::with_open(&view.visible, &default_open);
        view
    }

    /// Rebuilds `view` when the session changed since it was built.
    ///
    /// A rebuild closes every submenu and keeps the current path selection.
    /// Returns whether a rebuild happened.
    pub fn refresh_view(&self, session: &AuthSession, view: &mut NavigationView) -> bool {
        if !view.is_stale(session) {
            return false;
        }

        let current_path = view.current_path.clone();
        let mut rebuilt = self.empty_view(session);
        if let Some(path) = current_path {
            rebuilt.select(path.as_str());
        }
        debug!(
            generation = rebuilt.generation,
            visible_roots = rebuilt.visible.len(),
            "navigation view rebuilt"
        );

        *view = rebuilt;
        true
    }

    fn empty_view(&self, session: &AuthSession) -> NavigationView {
        let expanded = if session.is_authenticated() {
            self.expanded_permissions(session)
        } else {
            ExpandedPermissions::default()
        };
        let visible = if session.is_authenticated() {
            filter_menu(self.catalog.menu().nodes(), &expanded)
        } else {
            Vec::new()
        };

        NavigationView {
            session_id: session.session_id(),
            generation: session.generation(),
            open: OpenSubmenus::new(&visible),
            expanded,
            visible,
            current_path: None,
            selected_key: None,
        }
    }
}

/// Derived sidebar state for one session generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationView {
    session_id: Uuid,
    generation: u64,
    expanded: ExpandedPermissions,
    visible: Vec<VisibleMenuNode>,
    open: OpenSubmenus,
    current_path: Option<String>,
    selected_key: Option<String>,
}

impl NavigationView {
    /// Returns the visible menu tree.
    #[must_use]
    pub fn visible(&self) -> &[VisibleMenuNode] {
        self.visible.as_slice()
    }

    /// Returns the expanded permissions the view was built from.
    #[must_use]
    pub fn expanded(&self) -> &ExpandedPermissions {
        &self.expanded
    }

    /// Returns whether the session holds `code`, directly or by implication.
    #[must_use]
    pub fn can(&self, code: &str) -> bool {
        self.expanded.contains_str(code)
    }

    /// Returns the highlighted entry key.
    #[must_use]
    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    /// Returns the current navigation path.
    #[must_use]
    pub fn current_path(&self) -> Option<&str> {
        self.current_path.as_deref()
    }

    /// Returns the open submenu state.
    #[must_use]
    pub fn open_submenus(&self) -> &OpenSubmenus {
        &self.open
    }

    /// Returns the open submenu state for user interaction.
    pub fn open_submenus_mut(&mut self) -> &mut OpenSubmenus {
        &mut self.open
    }

    /// Records a navigation and updates the highlighted entry.
    pub fn select(&mut self, current_path: &str) {
        self.selected_key = selected_key(&self.visible, current_path).map(ToOwned::to_owned);
        self.current_path = Some(current_path.to_owned());
    }

    /// Returns the navigation target of a visible leaf, for activation.
    #[must_use]
    pub fn target_of(&self, key: &str) -> Option<&str> {
        find_node(&self.visible, key).and_then(|node| node.target.as_deref())
    }

    /// Returns the session the view was built from.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Returns the session generation the view was built from.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns whether `session` is not the session state this view was built
    /// from, either because it changed since or because it is another session.
    #[must_use]
    pub fn is_stale(&self, session: &AuthSession) -> bool {
        self.session_id != session.session_id() || self.generation != session.generation()
    }
}

fn find_node<'a>(nodes: &'a [VisibleMenuNode], key: &str) -> Option<&'a VisibleMenuNode> {
    nodes.iter().find_map(|node| {
        if node.key == key {
            Some(node)
        } else {
            find_node(&node.children, key)
        }
    })
}
