//! Billing Domain - Invoice Lifecycle
//!
//! This crate owns patient invoices: their line items and totals, the status
//! they should carry at any moment, and how new ones are numbered.
//!
//! # Invoice lifecycle
//!
//! ```text
//!   draft ──┐
//!           ├──► pending ──► partial ──► paid
//!   pending ┘       │           │
//!                   └──► overdue ◄┘      cancelled (manual, terminal)
//! ```
//!
//! Statuses are not advanced by events. Each read re-derives the status from
//! balance, total and due date (see [`status`]) and the service writes the
//! correction back before returning the invoice.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{InvoiceService, InvoiceQuery};
//! use domain_billing::adapters::InMemoryInvoiceStore;
//!
//! let store = Arc::new(InMemoryInvoiceStore::new());
//! let service = InvoiceService::new(store.clone(), store, Arc::new(SystemClock));
//!
//! let invoice = service.create_invoice(draft, None).await?;
//! let overdue = service.list_invoices(InvoiceQuery::default(), None).await?;
//! ```

pub mod invoice;
pub mod status;
pub mod ports;
pub mod adapters;
pub mod service;
pub mod error;

pub use invoice::{Invoice, InvoiceDraft, InvoicePatch, InvoiceStatus, LineItem, NewInvoice, WriteOrigin};
pub use status::{derive_status, StatusAnomaly, StatusEvaluation, StatusPolicy, SuppressionClock};
pub use ports::{InvoicePort, InvoiceQuery, InvoiceSortField, SortDirection};
pub use service::{InvoiceService, NumberingConfig};
pub use error::BillingError;
