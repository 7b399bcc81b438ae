//! Access Domain
//!
//! Hospital staff act through roles. A role owns a flat set of permission
//! strings such as `patients:read`; checking access is plain set membership,
//! with no hierarchy, wildcards or inheritance.
//!
//! `admin:full` is a naming convention only. It grants nothing by itself:
//! callers that want an administrator bypass check [`Role::is_admin`]
//! explicitly.
//!
//! # Examples
//!
//! ```rust
//! use domain_access::{has_permission, permissions, StandardRoles};
//!
//! let roles = StandardRoles::create_standard_roles();
//! let nurse = roles.find("nurse").unwrap();
//!
//! assert!(has_permission(nurse, permissions::PATIENTS_READ));
//! assert!(!has_permission(nurse, permissions::BILLING_WRITE));
//! ```

pub mod role;
pub mod standard;
pub mod error;

pub use role::{has_permission, permissions, PermissionSet, Role};
pub use standard::{RoleDirectory, StandardRoles};
pub use error::AccessError;
