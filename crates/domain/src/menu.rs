use std::collections::BTreeSet;

use despachos_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{ExpandedPermissions, PermissionCode};

/// Declarative navigation entry of the static menu configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNode {
    key: NonEmptyString,
    label: NonEmptyString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required_permission: Option<PermissionCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<MenuNode>>,
}

impl MenuNode {
    /// Creates a leaf entry that navigates to `target`.
    pub fn leaf(
        key: impl Into<String>,
        label: impl Into<String>,
        target: impl Into<String>,
        required_permission: Option<PermissionCode>,
    ) -> AppResult<Self> {
        Ok(Self {
            key: NonEmptyString::new(key)?,
            label: NonEmptyString::new(label)?,
            icon: None,
            target: Some(target.into()),
            required_permission,
            children: None,
        })
    }

    /// Creates a submenu entry.
    ///
    /// A submenu has no requirement of its own; it is visible while any of its
    /// children is.
    pub fn branch(
        key: impl Into<String>,
        label: impl Into<String>,
        children: Vec<MenuNode>,
    ) -> AppResult<Self> {
        Ok(Self {
            key: NonEmptyString::new(key)?,
            label: NonEmptyString::new(label)?,
            icon: None,
            target: None,
            required_permission: None,
            children: Some(children),
        })
    }

    /// Returns the entry with an icon name attached.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        let icon = icon.into();
        self.icon = (!icon.trim().is_empty()).then_some(icon);
        self
    }

    /// Returns the unique entry key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the icon name, if any.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Returns the navigation target, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Returns the permission needed to see this leaf. `None` means public.
    #[must_use]
    pub fn required_permission(&self) -> Option<&PermissionCode> {
        self.required_permission.as_ref()
    }

    /// Returns nested entries. `None` for leaves.
    #[must_use]
    pub fn children(&self) -> Option<&[MenuNode]> {
        self.children.as_deref()
    }

    fn is_permitted(&self, expanded: &ExpandedPermissions) -> bool {
        self.required_permission
            .as_ref()
            .is_none_or(|code| expanded.contains(code))
    }
}

/// Full static menu configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MenuTree(Vec<MenuNode>);

impl MenuTree {
    /// Creates a menu tree.
    ///
    /// Rejects duplicate keys anywhere in the tree and submenus that declare a
    /// required permission.
    pub fn new(nodes: Vec<MenuNode>) -> AppResult<Self> {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<&MenuNode> = nodes.iter().collect();
        while let Some(node) = pending.pop() {
            if !seen.insert(node.key()) {
                return Err(AppError::Validation(format!(
                    "duplicate menu key '{}'",
                    node.key()
                )));
            }
            if let Some(children) = node.children() {
                if let Some(code) = node.required_permission() {
                    return Err(AppError::Validation(format!(
                        "submenu '{}' cannot require permission '{code}'",
                        node.key()
                    )));
                }
                pending.extend(children.iter());
            }
        }

        Ok(Self(nodes))
    }

    /// Returns top-level entries in configuration order.
    #[must_use]
    pub fn nodes(&self) -> &[MenuNode] {
        self.0.as_slice()
    }
}

impl<'de> Deserialize<'de> for MenuTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let nodes = Vec::<MenuNode>::deserialize(deserializer)?;
        Self::new(nodes).map_err(serde::de::Error::custom)
    }
}

/// Menu entry the current user is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleMenuNode {
    /// Unique entry key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Icon name.
    pub icon: Option<String>,
    /// Navigation target for leaves.
    pub target: Option<String>,
    /// Surviving nested entries; empty for leaves.
    pub children: Vec<VisibleMenuNode>,
}

impl VisibleMenuNode {
    /// Returns whether this entry opens a submenu.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Projects the menu onto what `expanded` allows, keeping sibling order.
///
/// A leaf is kept when it is public or its requirement is held. A branch is kept
/// when at least one of its children is; it never appears with an empty child
/// list.
#[must_use]
pub fn filter_menu(nodes: &[MenuNode], expanded: &ExpandedPermissions) -> Vec<VisibleMenuNode> {
    nodes
        .iter()
        .filter_map(|node| filter_node(node, expanded))
        .collect()
}

fn filter_node(node: &MenuNode, expanded: &ExpandedPermissions) -> Option<VisibleMenuNode> {
    let children = match node.children() {
        Some(children) => {
            let visible = filter_menu(children, expanded);
            if visible.is_empty() {
                return None;
            }
            visible
        }
        None if node.is_permitted(expanded) => Vec::new(),
        None => return None,
    };

    Some(VisibleMenuNode {
        key: node.key().to_owned(),
        label: node.label().to_owned(),
        icon: node.icon().map(ToOwned::to_owned),
        target: node.target().map(ToOwned::to_owned),
        children,
    })
}

/// Returns the key of the first leaf, depth-first, whose target equals `path`.
#[must_use]
pub fn selected_key<'a>(visible: &'a [VisibleMenuNode], path: &str) -> Option<&'a str> {
    for node in visible {
        if node.is_branch() {
            if let Some(key) = selected_key(&node.children, path) {
                return Some(key);
            }
        } else if node.target.as_deref() == Some(path) {
            return Some(node.key.as_str());
        }
    }

    None
}

/// Returns the keys of the branches enclosing `key`, outermost first.
///
/// Returns `None` when the key is not in the visible tree.
#[must_use]
pub fn open_path_for(visible: &[VisibleMenuNode], key: &str) -> Option<Vec<String>> {
    for node in visible {
        if node.key == key {
            return Some(Vec::new());
        }
        if let Some(mut path) = open_path_for(&node.children, key) {
            path.insert(0, node.key.clone());
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{MenuNode, MenuTree, VisibleMenuNode, filter_menu, open_path_for, selected_key};
    use crate::{
        ExpandedPermissions, ExpansionMode, GrantedPermissions, HierarchyTable, PermissionCode,
        expand_permissions,
    };

    fn code(value: &str) -> PermissionCode {
        PermissionCode::new(value).unwrap_or_else(|_| unreachable!("test codes are non-empty"))
    }

    fn expanded(values: &[&str]) -> ExpandedPermissions {
        let granted: GrantedPermissions = values.iter().map(|value| code(value)).collect();
        expand_permissions(&granted, &HierarchyTable::default(), ExpansionMode::OneLevel)
    }

    fn leaf(key: &str, target: &str, required: Option<&str>) -> MenuNode {
        MenuNode::leaf(key, key, target, required.map(code))
            .unwrap_or_else(|_| unreachable!("test keys are non-empty"))
    }

    fn branch(key: &str, children: Vec<MenuNode>) -> MenuNode {
        MenuNode::branch(key, key, children)
            .unwrap_or_else(|_| unreachable!("test keys are non-empty"))
    }

    fn keys(nodes: &[VisibleMenuNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.key.as_str()).collect()
    }

    fn warehouse_menu() -> Vec<MenuNode> {
        vec![
            leaf("inicio", "/", None),
            branch(
                "almacen",
                vec![
                    leaf("almacen-stock", "/almacen/stock", Some("almacen.view_stock")),
                    leaf(
                        "almacen-movimientos",
                        "/almacen/movimientos",
                        Some("almacen.view_movimiento"),
                    ),
                ],
            ),
            branch(
                "administracion",
                vec![
                    leaf("usuarios", "/usuarios", Some("users.view_user")),
                    leaf("ayuda", "/ayuda", None),
                ],
            ),
        ]
    }

    #[test]
    fn branch_without_surviving_children_is_dropped() {
        let menu = vec![branch("1", vec![leaf("2", "/2", Some("X"))])];
        assert!(filter_menu(&menu, &expanded(&[])).is_empty());
    }

    #[test]
    fn public_leaves_keep_their_branch() {
        let menu = vec![branch("1", vec![leaf("2", "/2", None)])];
        let visible = filter_menu(&menu, &expanded(&[]));

        assert_eq!(keys(&visible), vec!["1"]);
        assert_eq!(keys(&visible[0].children), vec!["2"]);
    }

    #[test]
    fn explicitly_empty_submenu_is_dropped() {
        let menu = vec![branch("vacio", Vec::new()), leaf("inicio", "/", None)];
        assert_eq!(keys(&filter_menu(&menu, &expanded(&[]))), vec!["inicio"]);
    }

    #[test]
    fn branches_follow_their_surviving_children() {
        let visible = filter_menu(&warehouse_menu(), &expanded(&["almacen.view_stock"]));
        assert_eq!(keys(&visible), vec!["inicio", "almacen", "administracion"]);
        assert_eq!(keys(&visible[1].children), vec!["almacen-stock"]);
        assert_eq!(keys(&visible[2].children), vec!["ayuda"]);

        let visible = filter_menu(&warehouse_menu(), &expanded(&["users.view_user"]));
        assert_eq!(keys(&visible), vec!["inicio", "administracion"]);
        assert_eq!(keys(&visible[1].children), vec!["usuarios", "ayuda"]);
    }

    #[test]
    fn public_leaf_is_visible_without_any_grant() {
        let menu = vec![branch(
            "1",
            vec![leaf("2", "/2", None), leaf("3", "/3", Some("X"))],
        )];
        let visible = filter_menu(&menu, &expanded(&[]));

        assert_eq!(keys(&visible), vec!["1"]);
        assert_eq!(keys(&visible[0].children), vec!["2"]);
    }

    #[test]
    fn menu_tree_rejects_submenu_requirements() {
        let raw = r#"[{"key": "administracion", "label": "Administracion",
            "required_permission": "users.view_user",
            "children": [{"key": "ayuda", "label": "Ayuda", "target": "/ayuda"}]}]"#;
        assert!(serde_json::from_str::<MenuTree>(raw).is_err());
    }

    #[test]
    fn empty_menu_filters_to_empty() {
        assert!(filter_menu(&[], &expanded(&["almacen.view_stock"])).is_empty());
    }

    #[test]
    fn selected_key_requires_exact_target_match() {
        let visible = filter_menu(&warehouse_menu(), &expanded(&["almacen.view_stock"]));

        assert_eq!(selected_key(&visible, "/almacen/stock"), Some("almacen-stock"));
        assert_eq!(selected_key(&visible, "/almacen/stock/extra"), None);
        assert_eq!(selected_key(&visible, "/almacen"), None);
    }

    #[test]
    fn selected_key_ignores_hidden_entries() {
        let visible = filter_menu(&warehouse_menu(), &expanded(&[]));
        assert_eq!(selected_key(&visible, "/almacen/stock"), None);
        assert_eq!(selected_key(&visible, "/"), Some("inicio"));
    }

    #[test]
    fn selected_key_returns_first_match_depth_first() {
        let menu = vec![
            branch("a", vec![leaf("a-1", "/shared", None)]),
            leaf("b", "/shared", None),
        ];
        let visible = filter_menu(&menu, &expanded(&[]));
        assert_eq!(selected_key(&visible, "/shared"), Some("a-1"));
    }

    #[test]
    fn open_path_lists_enclosing_branches() {
        let menu = vec![branch(
            "despachos",
            vec![branch(
                "despachos-aduana",
                vec![leaf("despachos-dua", "/despachos/dua", None)],
            )],
        )];
        let visible = filter_menu(&menu, &expanded(&[]));

        assert_eq!(
            open_path_for(&visible, "despachos-dua"),
            Some(vec!["despachos".to_owned(), "despachos-aduana".to_owned()])
        );
        assert_eq!(open_path_for(&visible, "despachos"), Some(Vec::new()));
        assert_eq!(open_path_for(&visible, "missing"), None);
    }

    #[test]
    fn menu_tree_rejects_duplicate_keys() {
        let result = MenuTree::new(vec![
            leaf("stock", "/a", None),
            branch("almacen", vec![leaf("stock", "/b", None)]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn menu_tree_deserializes_configuration() {
        let raw = r#"[
            {"key": "inicio", "label": "Inicio", "target": "/"},
            {"key": "almacen", "label": "Almacen", "icon": "inbox", "children": [
                {"key": "stock", "label": "Stock", "target": "/almacen/stock",
                 "required_permission": "almacen.view_stock"}
            ]}
        ]"#;

        let tree = serde_json::from_str::<MenuTree>(raw);
        assert!(tree.is_ok());
        let tree = tree.unwrap_or_default();
        assert_eq!(tree.nodes().len(), 2);
        assert_eq!(tree.nodes()[1].icon(), Some("inbox"));
        assert_eq!(
            tree.nodes()[1].children().map(|children| children.len()),
            Some(1)
        );
    }

    #[test]
    fn menu_tree_deserialization_rejects_blank_keys() {
        let raw = r#"[{"key": " ", "label": "Inicio", "target": "/"}]"#;
        assert!(serde_json::from_str::<MenuTree>(raw).is_err());
    }

    fn requirement_strategy() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop::sample::select(vec!["p", "q", "r"]).prop_map(str::to_owned))
    }

    fn menu_strategy() -> impl Strategy<Value = Vec<MenuNode>> {
        let leaf_nodes = prop::collection::vec(requirement_strategy(), 0..5);
        prop::collection::vec(leaf_nodes, 0..5).prop_map(|sections| {
            sections
                .into_iter()
                .enumerate()
                .map(|(section_index, leaves)| {
                    let children = leaves
                        .into_iter()
                        .enumerate()
                        .map(|(leaf_index, leaf_required)| {
                            let key = format!("n{section_index}-{leaf_index}");
                            leaf(&key, &format!("/{key}"), leaf_required.as_deref())
                        })
                        .collect();
                    branch(&format!("n{section_index}"), children)
                })
                .collect()
        })
    }

    fn flatten_keys(nodes: &[VisibleMenuNode], into: &mut Vec<String>) {
        for node in nodes {
            into.push(node.key.clone());
            flatten_keys(&node.children, into);
        }
    }

    fn flatten_source_keys(nodes: &[MenuNode], into: &mut Vec<String>) {
        for node in nodes {
            into.push(node.key().to_owned());
            if let Some(children) = node.children() {
                flatten_source_keys(children, into);
            }
        }
    }

    proptest! {
        #[test]
        fn filtering_never_emits_empty_branches(
            menu in menu_strategy(),
            held in prop::collection::vec(prop::sample::select(vec!["p", "q", "r"]), 0..3),
        ) {
            let visible = filter_menu(&menu, &expanded(&held));
            for section in &visible {
                prop_assert!(!section.children.is_empty());
            }
        }

        #[test]
        fn filtering_preserves_sibling_order(
            menu in menu_strategy(),
            held in prop::collection::vec(prop::sample::select(vec!["p", "q", "r"]), 0..3),
        ) {
            let visible = filter_menu(&menu, &expanded(&held));

            let mut source_order = Vec::new();
            flatten_source_keys(&menu, &mut source_order);
            let mut visible_order = Vec::new();
            flatten_keys(&visible, &mut visible_order);

            let positions: Vec<usize> = visible_order
                .iter()
                .filter_map(|key| source_order.iter().position(|source| source == key))
                .collect();
            prop_assert_eq!(positions.len(), visible_order.len());
            prop_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        }

        #[test]
        fn public_leaves_are_always_visible(
            menu in menu_strategy(),
            held in prop::collection::vec(prop::sample::select(vec!["p", "q", "r"]), 0..3),
        ) {
            let visible = filter_menu(&menu, &expanded(&held));
            let mut visible_keys = Vec::new();
            flatten_keys(&visible, &mut visible_keys);

            for node in &menu {
                for child in node.children().unwrap_or_default() {
                    if child.required_permission().is_none() {
                        prop_assert!(visible_keys.iter().any(|key| key == child.key()));
                    }
                }
            }
        }
    }
}
