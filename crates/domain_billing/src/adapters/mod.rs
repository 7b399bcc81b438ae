//! Adapters for the invoice store port
//!
//! - **InMemoryInvoiceStore**: a process-local store implementing both
//!   `InvoicePort` and `SequenceSource`, used by tests and the demo server
//!
//! A production deployment supplies its own adapter for the hosted document
//! database behind the same traits.

pub mod memory;

pub use memory::InMemoryInvoiceStore;
