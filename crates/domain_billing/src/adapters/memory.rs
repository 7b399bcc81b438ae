//! In-memory invoice store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use core_kernel::{
    compare_identifiers, AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable,
    IdentifierKind, InvoiceId, OperationMetadata, PortError, SequenceSource,
};

use crate::invoice::{Invoice, InvoicePatch, NewInvoice, WriteOrigin};
use crate::ports::{InvoicePort, InvoiceQuery, InvoiceSortField, SortDirection};

/// Invoice store backed by a map guarded by an async `RwLock`
///
/// Invoice numbers are unique: creating a second invoice with a number that
/// is already stored fails with `PortError::Conflict`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceStore {
    invoices: Arc<RwLock<HashMap<InvoiceId, Invoice>>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an invoice exactly as given, timestamps included
    ///
    /// Used to load existing records and to set up test scenarios.
    pub async fn seed(&self, invoice: Invoice) -> Result<(), PortError> {
        let mut invoices = self.invoices.write().await;
        if invoices
            .values()
            .any(|i| i.invoice_number == invoice.invoice_number && i.id != invoice.id)
        {
            return Err(PortError::conflict(format!(
                "Invoice number {} already exists",
                invoice.invoice_number
            )));
        }
        invoices.insert(invoice.id, invoice);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.invoices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.invoices.read().await.is_empty()
    }
}

fn compare(a: &Invoice, b: &Invoice, field: InvoiceSortField) -> Ordering {
    match field {
        InvoiceSortField::InvoiceNumber => compare_identifiers(&a.invoice_number, &b.invoice_number),
        InvoiceSortField::IssueDate => a.issue_date.cmp(&b.issue_date),
        InvoiceSortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
    .then_with(|| a.id.cmp(&b.id))
}

impl DomainPort for InMemoryInvoiceStore {}

#[async_trait]
impl HealthCheckable for InMemoryInvoiceStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in_memory_invoices".to_string(),
            status: AdapterHealth::Healthy,
            message: Some(format!("{} invoices held in memory", self.len().await)),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl InvoicePort for InMemoryInvoiceStore {
    async fn get_invoice(
        &self,
        id: InvoiceId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, PortError> {
        self.invoices
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Invoice", id))
    }

    async fn list_invoices(
        &self,
        query: InvoiceQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Invoice>, PortError> {
        let invoices = self.invoices.read().await;
        let mut matching: Vec<Invoice> = invoices
            .values()
            .filter(|i| query.matches(i))
            .cloned()
            .collect();

        matching.sort_by(|a, b| match query.direction {
            SortDirection::Ascending => compare(a, b, query.sort_by),
            SortDirection::Descending => compare(b, a, query.sort_by),
        });
        if let Some(limit) = query.limit {
            matching.truncate(limit as usize);
        }
        Ok(matching)
    }

    async fn update_invoice(
        &self,
        id: InvoiceId,
        patch: InvoicePatch,
        origin: WriteOrigin,
        at: DateTime<Utc>,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, PortError> {
        let mut invoices = self.invoices.write().await;
        let invoice = invoices
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Invoice", id))?;

        invoice
            .apply_patch(&patch, origin, at)
            .map_err(|e| PortError::validation(e.to_string()))?;
        Ok(invoice.clone())
    }

    async fn create_invoice(
        &self,
        new: NewInvoice,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, PortError> {
        let mut invoices = self.invoices.write().await;
        if invoices.values().any(|i| i.invoice_number == new.invoice_number) {
            return Err(PortError::conflict(format!(
                "Invoice number {} already exists",
                new.invoice_number
            )));
        }

        let invoice = Invoice::create(InvoiceId::new_v7(), new);
        invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }
}

#[async_trait]
impl SequenceSource for InMemoryInvoiceStore {
    async fn latest_identifier(
        &self,
        kind: IdentifierKind,
        prefix: &str,
    ) -> Result<Option<String>, PortError> {
        if kind != IdentifierKind::Invoice {
            return Err(PortError::validation_field(
                format!("This store only numbers invoices, not {kind}"),
                "kind",
            ));
        }

        Ok(self
            .invoices
            .read()
            .await
            .values()
            .map(|i| i.invoice_number.as_str())
            .filter(|n| n.starts_with(prefix))
            .max_by(|a, b| compare_identifiers(a, b))
            .map(str::to_string))
    }
}
