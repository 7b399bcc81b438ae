//! Core Kernel - Foundational types and utilities for the hospital system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Clock abstraction and calendar-day handling in a configured time zone
//! - Strongly-typed identifiers and human-readable sequence allocation
//! - Port error types shared by every persistence adapter

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod sequence;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{Clock, SystemClock, FixedClock, Timezone, TemporalError};
pub use identifiers::{InvoiceId, PatientId, PrescriptionId, RoleId, LineItemId};
pub use ports::{
    PortError, DomainPort, OperationMetadata, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use sequence::{
    IdentifierAllocator, IdentifierKind, IdentifierScheme, SequenceSource,
    MemorySequenceSource, next_in_sequence, compare_identifiers,
};
pub use error::CoreError;
