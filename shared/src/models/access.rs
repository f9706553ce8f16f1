//! Role based access to application sections
//!
//! The permission table is fixed at compile time. Each role maps to the
//! sections it may open and to the subset of those it may only read.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Administrador,
    Contador,
    Vendedor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrador, Role::Contador, Role::Vendedor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrador => "Administrador",
            Role::Contador => "Contador",
            Role::Vendedor => "Vendedor",
        }
    }

    /// Sections this role may open
    pub fn sections(&self) -> &'static [Section] {
        match self {
            Role::Administrador => &Section::ALL,
            Role::Contador => &CONTADOR_SECTIONS,
            Role::Vendedor => &VENDEDOR_SECTIONS,
        }
    }

    /// Sections this role may open but not modify
    pub fn read_only_sections(&self) -> &'static [Section] {
        match self {
            Role::Administrador => &[],
            Role::Contador | Role::Vendedor => &[Section::Inventario],
        }
    }
}

text_enum!(Role, "role");

/// Application sections guarded by the access table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Dashboard,
    Pos,
    Inventario,
    Movimientos,
    Merma,
    Alertas,
    Reportes,
    Proveedores,
    FacturasProveedores,
    PagosProveedores,
    Produccion,
    Usuarios,
    AjustesStock,
    HistorialBoletas,
}

impl Section {
    pub const ALL: [Section; 14] = [
        Section::Dashboard,
        Section::Pos,
        Section::Inventario,
        Section::Movimientos,
        Section::Merma,
        Section::Alertas,
        Section::Reportes,
        Section::Proveedores,
        Section::FacturasProveedores,
        Section::PagosProveedores,
        Section::Produccion,
        Section::Usuarios,
        Section::AjustesStock,
        Section::HistorialBoletas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Pos => "pos",
            Section::Inventario => "inventario",
            Section::Movimientos => "movimientos",
            Section::Merma => "merma",
            Section::Alertas => "alertas",
            Section::Reportes => "reportes",
            Section::Proveedores => "proveedores",
            Section::FacturasProveedores => "facturas_proveedores",
            Section::PagosProveedores => "pagos_proveedores",
            Section::Produccion => "produccion",
            Section::Usuarios => "usuarios",
            Section::AjustesStock => "ajustes_stock",
            Section::HistorialBoletas => "historial_boletas",
        }
    }
}

text_enum!(Section, "section");

const CONTADOR_SECTIONS: [Section; 4] = [
    Section::Dashboard,
    Section::Inventario,
    Section::Reportes,
    Section::HistorialBoletas,
];

const VENDEDOR_SECTIONS: [Section; 5] = [
    Section::Dashboard,
    Section::Pos,
    Section::Inventario,
    Section::Alertas,
    Section::HistorialBoletas,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
}

/// Account facts that decide the effective role
#[derive(Debug, Clone, Default)]
pub struct RoleSource<'a> {
    pub is_superuser: bool,
    /// Name of the role attached to the user profile
    pub profile_role: Option<&'a str>,
    /// Group names in membership order
    pub groups: &'a [String],
}

/// Resolves the effective role: superuser, then profile role, then first
/// group. A profile or group naming an unknown role yields no role.
pub fn resolve_role(source: &RoleSource<'_>) -> Option<Role> {
    if source.is_superuser {
        return Some(Role::Administrador);
    }
    if let Some(name) = source.profile_role {
        return name.parse().ok();
    }
    source.groups.first().and_then(|name| name.parse().ok())
}

pub fn can_access(role: Option<Role>, section: Section) -> bool {
    match role {
        None => false,
        Some(Role::Administrador) => true,
        Some(role) => role.sections().contains(&section),
    }
}

pub fn can_write(role: Option<Role>, section: Section) -> bool {
    match role {
        None => false,
        Some(Role::Administrador) => true,
        Some(role) => can_access(Some(role), section) && !role.read_only_sections().contains(&section),
    }
}

pub fn is_permitted(role: Option<Role>, section: Section, mode: AccessMode) -> bool {
    match mode {
        AccessMode::Read => can_access(role, section),
        AccessMode::Write => can_write(role, section),
    }
}

/// Sections listed for the user, in table order
pub fn permitted_sections(role: Option<Role>) -> Vec<Section> {
    role.map(|r| r.sections().to_vec()).unwrap_or_default()
}

/// Role gate for operations restricted to a list of roles. Administrador
/// always passes.
/// Roles allowed to correct stock by hand
pub const STOCK_ADJUSTMENT_ROLES: [Role; 2] = [Role::Administrador, Role::Contador];

pub fn role_allowed(role: Option<Role>, allowed: &[Role]) -> bool {
    match role {
        None => false,
        Some(Role::Administrador) => true,
        Some(role) => allowed.contains(&role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_profile_role_has_no_access() {
        let groups = vec!["Vendedor".to_string()];
        let source = RoleSource {
            is_superuser: false,
            profile_role: Some("Bodeguero"),
            groups: &groups,
        };
        assert_eq!(resolve_role(&source), None);
    }

    #[test]
    fn test_first_group_used_without_profile() {
        let groups = vec!["Contador".to_string(), "Vendedor".to_string()];
        let source = RoleSource {
            is_superuser: false,
            profile_role: None,
            groups: &groups,
        };
        assert_eq!(resolve_role(&source), Some(Role::Contador));
    }

    #[test]
    fn test_vendedor_writes_alertas() {
        assert!(can_write(Some(Role::Vendedor), Section::Alertas));
        assert!(!can_write(Some(Role::Vendedor), Section::Inventario));
        assert!(!can_access(Some(Role::Vendedor), Section::Merma));
    }

    #[test]
    fn test_permitted_sections_for_admin_is_everything() {
        assert_eq!(permitted_sections(Some(Role::Administrador)).len(), 14);
        assert!(permitted_sections(None).is_empty());
    }
}
