//! Invoice store port
//!
//! The billing domain treats its document store as a collaborator: get one
//! invoice, list with filters, apply a partial update, create. Any adapter
//! must give read-after-write consistency for a single invoice and must
//! reject a duplicate invoice number with [`PortError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, HealthCheckable, InvoiceId, OperationMetadata, PatientId, PortError};

use crate::invoice::{Invoice, InvoicePatch, InvoiceStatus, NewInvoice, WriteOrigin};

/// Field an invoice listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceSortField {
    InvoiceNumber,
    IssueDate,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Query parameters for listing invoices
#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    pub patient_id: Option<PatientId>,
    pub status: Option<InvoiceStatus>,
    pub sort_by: InvoiceSortField,
    pub direction: SortDirection,
    pub limit: Option<u32>,
}

impl InvoiceQuery {
    /// All invoices billed to one patient
    pub fn for_patient(patient_id: PatientId) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn sorted_by(mut self, field: InvoiceSortField, direction: SortDirection) -> Self {
        self.sort_by = field;
        self.direction = direction;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if `invoice` passes the filters of this query
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.patient_id.map_or(true, |p| invoice.patient_id == p)
            && self.status.map_or(true, |s| invoice.status == s)
    }
}

/// The port the billing domain needs from its invoice store
///
/// All methods return `Result<T, PortError>` so services can tell "not found"
/// and "duplicate number" apart from store outages whatever the adapter.
#[async_trait]
pub trait InvoicePort: DomainPort + HealthCheckable {
    /// Retrieves an invoice by id, or `PortError::NotFound`
    async fn get_invoice(
        &self,
        id: InvoiceId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, PortError>;

    /// Lists invoices matching `query`, sorted and truncated as requested
    async fn list_invoices(
        &self,
        query: InvoiceQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Invoice>, PortError>;

    /// Applies `patch` and stamps the write with `at`
    ///
    /// The invoice keeps `origin` as its `last_write_origin`. Automatic
    /// corrections also record `at` as its `last_auto_corrected_at`.
    async fn update_invoice(
        &self,
        id: InvoiceId,
        patch: InvoicePatch,
        origin: WriteOrigin,
        at: DateTime<Utc>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, PortError>;

    /// Stores a new invoice under a fresh id
    ///
    /// Fails with `PortError::Conflict` if the invoice number is taken.
    async fn create_invoice(
        &self,
        invoice: NewInvoice,
        metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, PortError>;
}
