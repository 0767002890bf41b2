//! Domain entities and invariants for permission-aware navigation.

#![forbid(unsafe_code)]

mod hierarchy;
mod menu;
mod open_submenus;
mod permission;

pub use hierarchy::{ExpansionMode, HierarchyTable, expand_permissions};
pub use menu::{MenuNode, MenuTree, VisibleMenuNode, filter_menu, open_path_for, selected_key};
pub use open_submenus::OpenSubmenus;
pub use permission::{ExpandedPermissions, GrantedPermissions, PermissionCode};
