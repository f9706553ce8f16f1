//! Role and section access tests

use proptest::prelude::*;
use shared::{
    can_access, can_write, is_permitted, permitted_sections, resolve_role, role_allowed,
    AccessMode, Role, RoleSource, Section, STOCK_ADJUSTMENT_ROLES,
};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_contador_cannot_write_inventory() {
        assert!(is_permitted(Some(Role::Contador), Section::Inventario, AccessMode::Read));
        assert!(!is_permitted(Some(Role::Contador), Section::Inventario, AccessMode::Write));
    }

    #[test]
    fn test_contador_sections() {
        let sections = permitted_sections(Some(Role::Contador));
        assert_eq!(
            sections,
            vec![
                Section::Dashboard,
                Section::Inventario,
                Section::Reportes,
                Section::HistorialBoletas
            ]
        );
        assert!(!can_access(Some(Role::Contador), Section::Pos));
    }

    #[test]
    fn test_stock_adjustment_roles() {
        assert!(role_allowed(Some(Role::Administrador), &STOCK_ADJUSTMENT_ROLES));
        assert!(role_allowed(Some(Role::Contador), &STOCK_ADJUSTMENT_ROLES));
        assert!(!role_allowed(Some(Role::Vendedor), &STOCK_ADJUSTMENT_ROLES));
        assert!(!role_allowed(None, &STOCK_ADJUSTMENT_ROLES));
        // Contador has no ajustes_stock section, the role alone admits it
        assert!(!can_write(Some(Role::Contador), Section::AjustesStock));
    }

    #[test]
    fn test_vendedor_uses_pos() {
        assert!(can_write(Some(Role::Vendedor), Section::Pos));
        assert!(!can_access(Some(Role::Vendedor), Section::Proveedores));
        assert!(!can_access(Some(Role::Vendedor), Section::AjustesStock));
    }

    #[test]
    fn test_administrador_has_everything() {
        for section in Section::ALL {
            assert!(can_write(Some(Role::Administrador), section));
        }
    }

    #[test]
    fn test_no_role_has_nothing() {
        assert!(permitted_sections(None).is_empty());
        assert!(!role_allowed(None, &[Role::Administrador]));
    }

    #[test]
    fn test_role_resolution_order() {
        let groups = vec!["Vendedor".to_string()];

        let superuser = RoleSource {
            is_superuser: true,
            profile_role: Some("Vendedor"),
            groups: &groups,
        };
        assert_eq!(resolve_role(&superuser), Some(Role::Administrador));

        let profile = RoleSource {
            is_superuser: false,
            profile_role: Some("Contador"),
            groups: &groups,
        };
        assert_eq!(resolve_role(&profile), Some(Role::Contador));

        let group = RoleSource {
            is_superuser: false,
            profile_role: None,
            groups: &groups,
        };
        assert_eq!(resolve_role(&group), Some(Role::Vendedor));

        let unknown = RoleSource {
            is_superuser: false,
            profile_role: Some("Panadero"),
            groups: &groups,
        };
        assert_eq!(resolve_role(&unknown), None);
    }

    #[test]
    fn test_section_names_round_trip() {
        for section in Section::ALL {
            assert_eq!(section.as_str().parse::<Section>().unwrap(), section);
        }
        assert!("bodega".parse::<Section>().is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn role_strategy() -> impl Strategy<Value = Option<Role>> {
        prop::option::of(prop::sample::select(Role::ALL.to_vec()))
    }

    fn section_strategy() -> impl Strategy<Value = Section> {
        prop::sample::select(Section::ALL.to_vec())
    }

    proptest! {
        /// Write access always implies read access
        #[test]
        fn prop_write_implies_read(role in role_strategy(), section in section_strategy()) {
            if can_write(role, section) {
                prop_assert!(can_access(role, section));
            }
        }

        /// Read access matches membership in the permitted sections
        #[test]
        fn prop_read_matches_permitted(role in role_strategy(), section in section_strategy()) {
            prop_assert_eq!(
                is_permitted(role, section, AccessMode::Read),
                permitted_sections(role).contains(&section)
            );
        }
    }
}
