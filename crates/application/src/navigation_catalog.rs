use despachos_core::AppResult;
use despachos_domain::{HierarchyTable, MenuNode, MenuTree, PermissionCode};
use serde::{Deserialize, Serialize};

/// Static navigation configuration: permission hierarchy plus menu tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationCatalog {
    #[serde(default)]
    hierarchy: HierarchyTable,
    menu: MenuTree,
}

impl NavigationCatalog {
    /// Creates a catalog from already validated parts.
    #[must_use]
    pub fn new(hierarchy: HierarchyTable, menu: MenuTree) -> Self {
        Self { hierarchy, menu }
    }

    /// Returns the permission hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> &HierarchyTable {
        &self.hierarchy
    }

    /// Returns the menu tree.
    #[must_use]
    pub fn menu(&self) -> &MenuTree {
        &self.menu
    }

    /// Returns the catalog shipped with the despachos front-end.
    pub fn builtin() -> AppResult<Self> {
        let hierarchy = HierarchyTable::from_strs(BUILTIN_HIERARCHY.iter().copied())?;
        let menu = MenuTree::new(vec![
            leaf("inicio", "Inicio", "/", None)?.with_icon("home"),
            MenuNode::branch(
                "despachos",
                "Despachos",
                vec![
                    leaf(
                        "despachos-listado",
                        "Listado",
                        "/despachos",
                        Some("despachos.view_despacho"),
                    )?,
                    leaf(
                        "despachos-nuevo",
                        "Nuevo despacho",
                        "/despachos/nuevo",
                        Some("despachos.add_despacho"),
                    )?,
                ],
            )?
            .with_icon("container"),
            MenuNode::branch(
                "documentos",
                "Documentos",
                vec![
                    leaf(
                        "documentos-listado",
                        "Listado",
                        "/documentos",
                        Some("documentos.view_documento"),
                    )?,
                    leaf(
                        "documentos-carga",
                        "Carga masiva",
                        "/documentos/carga",
                        Some("documentos.add_documento"),
                    )?,
                ],
            )?
            .with_icon("file"),
            MenuNode::branch(
                "almacen",
                "Almacén",
                vec![
                    leaf(
                        "almacen-stock",
                        "Stock",
                        "/almacen/stock",
                        Some("almacen.view_stock"),
                    )?,
                    leaf(
                        "almacen-movimientos",
                        "Movimientos",
                        "/almacen/movimientos",
                        Some("almacen.view_movimiento"),
                    )?,
                ],
            )?
            .with_icon("inbox"),
            MenuNode::branch(
                "administracion",
                "Administración",
                vec![
                    leaf(
                        "administracion-usuarios",
                        "Usuarios",
                        "/admin/usuarios",
                        Some("users.view_user"),
                    )?,
                    leaf(
                        "administracion-roles",
                        "Roles",
                        "/admin/roles",
                        Some("auth.view_group"),
                    )?,
                    leaf(
                        "administracion-permisos",
                        "Permisos",
                        "/admin/permisos",
                        Some("auth.view_permission"),
                    )?,
                ],
            )?
            .with_icon("setting"),
            leaf("perfil", "Mi perfil", "/perfil", None)?.with_icon("user"),
        ])?;

        Ok(Self::new(hierarchy, menu))
    }
}

const BUILTIN_HIERARCHY: &[(&str, &[&str])] = &[
    (
        "despachos.can_manage_despachos",
        &[
            "despachos.view_despacho",
            "despachos.add_despacho",
            "despachos.change_despacho",
            "despachos.delete_despacho",
        ],
    ),
    (
        "documentos.can_manage_documentos",
        &[
            "documentos.view_documento",
            "documentos.add_documento",
            "documentos.change_documento",
            "documentos.delete_documento",
        ],
    ),
    (
        "almacen.can_manage_warehouse",
        &[
            "almacen.view_stock",
            "almacen.change_stock",
            "almacen.view_movimiento",
            "almacen.add_movimiento",
        ],
    ),
    (
        "users.can_manage_users",
        &[
            "users.view_user",
            "users.add_user",
            "users.change_user",
            "users.delete_user",
            "auth.view_group",
            "auth.change_group",
            "auth.view_permission",
        ],
    ),
];

fn leaf(key: &str, label: &str, target: &str, required: Option<&str>) -> AppResult<MenuNode> {
    let required = required.map(PermissionCode::new).transpose()?;
    MenuNode::leaf(key, label, target, required)
}
