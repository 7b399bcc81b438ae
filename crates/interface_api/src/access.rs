//! Caller identity and permission checks

use core_kernel::OperationMetadata;
use domain_access::{has_permission, Role};

use crate::error::ApiError;

/// The resolved role of the caller, placed in request extensions by
/// [`crate::middleware::role_middleware`]
#[derive(Debug, Clone)]
pub struct Caller {
    pub role: Role,
    pub request_id: Option<String>,
}

impl Caller {
    /// Fails with 403 unless the caller's role holds `permission`
    pub fn require(&self, permission: &str) -> Result<(), ApiError> {
        if has_permission(&self.role, permission) {
            Ok(())
        } else {
            tracing::warn!(role = %self.role.name, permission, "Permission denied");
            Err(ApiError::Forbidden(format!(
                "Role {} lacks permission {permission}",
                self.role.name
            )))
        }
    }

    /// Operation metadata for store calls made on behalf of this caller
    pub fn metadata(&self) -> OperationMetadata {
        let metadata = match &self.request_id {
            Some(id) => OperationMetadata::with_correlation_id(id.clone()),
            None => OperationMetadata::default(),
        };
        metadata.initiated_by(self.role.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_access::{permissions, StandardRoles};

    #[test]
    fn test_require_follows_role_permissions() {
        let caller = Caller { role: StandardRoles::receptionist(), request_id: None };
        assert!(caller.require(permissions::BILLING_READ).is_ok());
        assert!(matches!(
            caller.require(permissions::BILLING_WRITE),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_marker_does_not_bypass() {
        let role = Role::new("auditor", [permissions::ADMIN_FULL].into_iter().collect());
        let caller = Caller { role, request_id: None };
        assert!(caller.require(permissions::BILLING_READ).is_err());
    }

    #[test]
    fn test_metadata_carries_request_id_and_role() {
        let caller = Caller {
            role: StandardRoles::accountant(),
            request_id: Some("req-1".to_string()),
        };
        let metadata = caller.metadata();
        assert_eq!(metadata.correlation_id.as_deref(), Some("req-1"));
        assert_eq!(metadata.initiated_by.as_deref(), Some("accountant"));
    }
}
