//! Standard hospital roles and role lookup

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::AccessError;
use crate::role::{permissions::*, PermissionSet, Role};

/// Roles known to the system, keyed by name
#[derive(Debug, Clone, Default)]
pub struct RoleDirectory {
    roles: BTreeMap<String, Role>,
}

impl RoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a role
    ///
    /// # Errors
    ///
    /// `AccessError::InvalidRole` if the name is blank or already registered.
    pub fn register(&mut self, role: Role) -> Result<(), AccessError> {
        if role.name.trim().is_empty() {
            return Err(AccessError::InvalidRole("role name is required".to_string()));
        }
        if self.roles.contains_key(&role.name) {
            return Err(AccessError::InvalidRole(format!("{} is already registered", role.name)));
        }
        self.roles.insert(role.name.clone(), role);
        Ok(())
    }

    /// Looks a role up by its exact name
    pub fn find(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// The roles a fresh installation starts with
pub struct StandardRoles;

impl StandardRoles {
    pub fn admin() -> Role {
        Role::new("admin", ALL.into_iter().collect())
            .with_description("System administrator")
    }

    pub fn doctor() -> Role {
        Role::new(
            "doctor",
            set(&[
                PATIENTS_READ,
                PATIENTS_WRITE,
                APPOINTMENTS_READ,
                APPOINTMENTS_WRITE,
                PRESCRIPTIONS_READ,
                PRESCRIPTIONS_WRITE,
                INVENTORY_READ,
            ]),
        )
        .with_description("Attending physician")
    }

    pub fn nurse() -> Role {
        Role::new(
            "nurse",
            set(&[
                PATIENTS_READ,
                PATIENTS_WRITE,
                APPOINTMENTS_READ,
                PRESCRIPTIONS_READ,
                INVENTORY_READ,
            ]),
        )
        .with_description("Ward and clinic nursing staff")
    }

    pub fn receptionist() -> Role {
        Role::new(
            "receptionist",
            set(&[
                PATIENTS_READ,
                PATIENTS_WRITE,
                APPOINTMENTS_READ,
                APPOINTMENTS_WRITE,
                BILLING_READ,
            ]),
        )
        .with_description("Front desk")
    }

    pub fn pharmacist() -> Role {
        Role::new(
            "pharmacist",
            set(&[
                PATIENTS_READ,
                PRESCRIPTIONS_READ,
                PRESCRIPTIONS_WRITE,
                INVENTORY_READ,
                INVENTORY_WRITE,
            ]),
        )
        .with_description("Dispensary")
    }

    pub fn accountant() -> Role {
        Role::new(
            "accountant",
            set(&[PATIENTS_READ, BILLING_READ, BILLING_WRITE, INVENTORY_READ]),
        )
        .with_description("Billing office")
    }

    /// Builds a directory holding every standard role
    pub fn create_standard_roles() -> RoleDirectory {
        let roles = [
            Self::admin(),
            Self::doctor(),
            Self::nurse(),
            Self::receptionist(),
            Self::pharmacist(),
            Self::accountant(),
        ];

        let mut directory = RoleDirectory::new();
        for role in roles {
            directory.roles.insert(role.name.clone(), role);
        }
        debug!(roles = directory.len(), "Standard roles created");
        directory
    }
}

fn set(permissions: &[&str]) -> PermissionSet {
    permissions.iter().copied().collect()
}
