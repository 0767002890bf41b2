use std::collections::BTreeMap;

use crate::VisibleMenuNode;

/// Open submenu keys of a rendered menu.
///
/// Opening a submenu closes any other open submenu at the same depth. Submenus
/// at other depths keep their state, so a parent stays open while its children
/// toggle among themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenSubmenus {
    depths: BTreeMap<String, usize>,
    open: Vec<String>,
}

impl OpenSubmenus {
    /// Creates a closed state over the branches of a visible tree.
    #[must_use]
    pub fn new(visible: &[VisibleMenuNode]) -> Self {
        let mut depths = BTreeMap::new();
        collect_branch_depths(visible, 0, &mut depths);

        Self {
            depths,
            open: Vec::new(),
        }
    }

    /// Creates a state with `keys` already open, applying the same-depth rule.
    #[must_use]
    pub fn with_open(visible: &[VisibleMenuNode], keys: &[String]) -> Self {
        let mut state = Self::new(visible);
        for key in keys {
            if !state.is_open(key) {
                state.toggle(key);
            }
        }
        state
    }

    /// Returns open keys in the order they were opened.
    #[must_use]
    pub fn open_keys(&self) -> &[String] {
        self.open.as_slice()
    }

    /// Returns whether the submenu is open.
    #[must_use]
    pub fn is_open(&self, key: &str) -> bool {
        self.open.iter().any(|open| open == key)
    }

    /// Applies the key set requested by the menu widget.
    ///
    /// When the request opens a new submenu, open siblings at its depth are
    /// closed. When it only closes submenus, it is accepted as is. Keys that are
    /// not submenus of the current tree are dropped.
    pub fn on_open_change(&mut self, requested: &[String]) {
        let requested: Vec<String> = requested
            .iter()
            .filter(|key| self.depths.contains_key(key.as_str()))
            .fold(Vec::new(), |mut keys, key| {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
                keys
            });

        let opened = requested
            .iter()
            .rev()
            .find(|key| !self.is_open(key))
            .cloned();

        self.open = match opened.and_then(|key| self.depths.get(&key).map(|depth| (key, *depth))) {
            Some((opened_key, opened_depth)) => requested
                .into_iter()
                .filter(|key| {
                    *key == opened_key || self.depths.get(key) != Some(&opened_depth)
                })
                .collect(),
            None => requested,
        };
    }

    /// Closes an open submenu, or opens a closed one.
    pub fn toggle(&mut self, key: &str) {
        let mut requested: Vec<String> = self
            .open
            .iter()
            .filter(|open| open.as_str() != key)
            .cloned()
            .collect();
        if !self.is_open(key) {
            requested.push(key.to_owned());
        }

        self.on_open_change(&requested);
    }

    /// Closes every submenu.
    pub fn reset(&mut self) {
        self.open.clear();
    }
}

fn collect_branch_depths(
    nodes: &[VisibleMenuNode],
    depth: usize,
    depths: &mut BTreeMap<String, usize>,
) {
    for node in nodes.iter().filter(|node| node.is_branch()) {
        depths.insert(node.key.clone(), depth);
        collect_branch_depths(&node.children, depth + 1, depths);
    }
}
