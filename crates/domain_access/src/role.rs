//! Roles and the permission check

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use core_kernel::RoleId;

use crate::error::AccessError;

/// Permission strings recognised by the hospital system
pub mod permissions {
    /// View patient records.
    pub const PATIENTS_READ: &str = "patients:read";

    /// Register and edit patients.
    pub const PATIENTS_WRITE: &str = "patients:write";

    /// View appointments.
    pub const APPOINTMENTS_READ: &str = "appointments:read";

    /// Book and reschedule appointments.
    pub const APPOINTMENTS_WRITE: &str = "appointments:write";

    /// View stock levels.
    pub const INVENTORY_READ: &str = "inventory:read";

    /// Adjust stock.
    pub const INVENTORY_WRITE: &str = "inventory:write";

    /// View prescriptions.
    pub const PRESCRIPTIONS_READ: &str = "prescriptions:read";

    /// Write and dispense prescriptions.
    pub const PRESCRIPTIONS_WRITE: &str = "prescriptions:write";

    /// View invoices.
    pub const BILLING_READ: &str = "billing:read";

    /// Create and edit invoices.
    pub const BILLING_WRITE: &str = "billing:write";

    /// Administrator marker; not expanded by the permission check.
    pub const ADMIN_FULL: &str = "admin:full";

    /// Every permission above
    pub const ALL: [&str; 11] = [
        PATIENTS_READ,
        PATIENTS_WRITE,
        APPOINTMENTS_READ,
        APPOINTMENTS_WRITE,
        INVENTORY_READ,
        INVENTORY_WRITE,
        PRESCRIPTIONS_READ,
        PRESCRIPTIONS_WRITE,
        BILLING_READ,
        BILLING_WRITE,
        ADMIN_FULL,
    ];
}

/// The permission strings a role holds
///
/// Strings are opaque and compared exactly, case included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the stored form of a permission list, a JSON array of strings
    ///
    /// # Errors
    ///
    /// Returns `AccessError::MalformedPermissions` if `json` is not an array
    /// of strings.
    pub fn from_json_array(json: &str) -> Result<Self, AccessError> {
        let list: Vec<String> = serde_json::from_str(json)?;
        Ok(list.into_iter().collect())
    }

    /// Encodes the set in its stored form
    pub fn to_json_array(&self) -> String {
        serde_json::Value::from(self.0.iter().cloned().collect::<Vec<_>>()).to_string()
    }

    pub fn insert(&mut self, permission: impl Into<String>) -> bool {
        self.0.insert(permission.into())
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A named bundle of permissions assigned to staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Lowercase name, e.g. `receptionist`
    pub name: String,
    pub description: Option<String>,
    pub permissions: PermissionSet,
}

impl Role {
    pub fn new(name: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            description: None,
            permissions,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true if the role carries the `admin:full` marker
    pub fn is_admin(&self) -> bool {
        self.permissions.contains(permissions::ADMIN_FULL)
    }
}

/// Returns true iff `permission` is one of `role`'s permissions
pub fn has_permission(role: &Role, permission: &str) -> bool {
    role.permissions.contains(permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clerk() -> Role {
        Role::new("clerk", [permissions::PATIENTS_READ, permissions::BILLING_READ].into_iter().collect())
    }

    #[test]
    fn test_has_permission_is_membership() {
        let role = clerk();
        assert!(has_permission(&role, "patients:read"));
        assert!(has_permission(&role, "billing:read"));
        assert!(!has_permission(&role, "billing:write"));
    }

    #[test]
    fn test_has_permission_is_case_sensitive() {
        assert!(!has_permission(&clerk(), "Patients:Read"));
        assert!(!has_permission(&clerk(), "patients:read "));
    }

    #[test]
    fn test_empty_role_has_nothing() {
        let role = Role::new("nobody", PermissionSet::new());
        for permission in permissions::ALL {
            assert!(!has_permission(&role, permission));
        }
        assert!(!has_permission(&role, ""));
    }

    #[test]
    fn test_admin_marker_is_not_a_wildcard() {
        let role = Role::new("admin", [permissions::ADMIN_FULL].into_iter().collect());
        assert!(role.is_admin());
        assert!(has_permission(&role, permissions::ADMIN_FULL));
        assert!(!has_permission(&role, permissions::BILLING_WRITE));
    }

    #[test]
    fn test_no_prefix_inheritance() {
        let role = Role::new("billing", ["billing"].into_iter().collect());
        assert!(!has_permission(&role, permissions::BILLING_READ));
    }

    #[test]
    fn test_permission_set_from_json_array() {
        let set = PermissionSet::from_json_array(r#"["billing:read","patients:read","billing:read"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("billing:read"));
        assert_eq!(set.to_json_array(), r#"["billing:read","patients:read"]"#);
    }

    #[test]
    fn test_permission_set_rejects_malformed_json() {
        assert!(matches!(
            PermissionSet::from_json_array(r#"{"billing:read":true}"#),
            Err(AccessError::MalformedPermissions(_))
        ));
        assert!(PermissionSet::from_json_array("[1, 2]").is_err());
    }

    #[test]
    fn test_role_serializes_permissions_as_array() {
        let json = serde_json::to_value(clerk()).unwrap();
        assert_eq!(json["permissions"], serde_json::json!(["billing:read", "patients:read"]));
    }
}
