//! Invoice application service
//!
//! Route handlers go through [`InvoiceService`] rather than the store port so
//! that every read re-derives the status and writes back corrections, and
//! every creation gets a sequential invoice number.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use core_kernel::{
    Clock, IdentifierAllocator, IdentifierKind, IdentifierScheme, InvoiceId, OperationMetadata,
    PortError, SequenceSource,
};

use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceDraft, InvoicePatch, NewInvoice, WriteOrigin};
use crate::ports::{InvoicePort, InvoiceQuery};
use crate::status::StatusPolicy;

/// How invoice numbers are allocated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingConfig {
    pub scheme: IdentifierScheme,
    /// Allocation attempts before giving up on repeated conflicts
    pub max_attempts: u32,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            scheme: IdentifierKind::Invoice.default_scheme(),
            max_attempts: 3,
        }
    }
}

/// Reads, creates and edits invoices on top of an [`InvoicePort`]
pub struct InvoiceService {
    port: Arc<dyn InvoicePort>,
    allocator: IdentifierAllocator,
    clock: Arc<dyn Clock>,
    policy: StatusPolicy,
    numbering: NumberingConfig,
}

impl InvoiceService {
    /// Creates a service with the default status policy and numbering
    ///
    /// # Arguments
    ///
    /// * `port` - The invoice store
    /// * `sequence` - Source of the latest issued invoice number
    /// * `clock` - Source of "now" for status derivation and write stamps
    pub fn new(
        port: Arc<dyn InvoicePort>,
        sequence: Arc<dyn SequenceSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            port,
            allocator: IdentifierAllocator::new(sequence, clock.clone()),
            clock,
            policy: StatusPolicy::default(),
            numbering: NumberingConfig::default(),
        }
    }

    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_numbering(mut self, numbering: NumberingConfig) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    pub fn port(&self) -> &Arc<dyn InvoicePort> {
        &self.port
    }

    /// The current calendar day in the policy's time zone
    pub fn today(&self) -> NaiveDate {
        self.policy.timezone.calendar_day(self.clock.now())
    }

    /// Loads an invoice with its status brought up to date
    pub async fn get_invoice(
        &self,
        id: InvoiceId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, BillingError> {
        let invoice = self
            .port
            .get_invoice(id, metadata.clone())
            .await
            .map_err(|e| not_found_or(e, id))?;
        self.reconcile(invoice, metadata).await
    }

    /// Lists invoices with their statuses brought up to date
    ///
    /// The query's status filter applies to the stored status.
    pub async fn list_invoices(
        &self,
        query: InvoiceQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Invoice>, BillingError> {
        let invoices = self.port.list_invoices(query, metadata.clone()).await?;
        let mut reconciled = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            reconciled.push(self.reconcile(invoice, metadata.clone()).await?);
        }
        Ok(reconciled)
    }

    /// Validates a draft, numbers it and stores it
    ///
    /// A number that collides with an existing invoice is re-allocated, up to
    /// `NumberingConfig::max_attempts` times.
    ///
    /// # Errors
    ///
    /// * `BillingError::Validation` if the draft is malformed
    /// * `BillingError::NumberingExhausted` if every attempt collided
    /// * `BillingError::Port` for any other store failure
    pub async fn create_invoice(
        &self,
        draft: InvoiceDraft,
        metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, BillingError> {
        draft.validate()?;
        let attempts = self.numbering.max_attempts.max(1);

        for attempt in 1..=attempts {
            let number = self
                .allocator
                .next_for_scheme(IdentifierKind::Invoice, &self.numbering.scheme, self.policy.timezone)
                .await?;
            let new = NewInvoice::new(draft.clone(), number.clone(), self.clock.now())?;

            match self.port.create_invoice(new, metadata.clone()).await {
                Ok(invoice) => {
                    info!(
                        invoice_id = %invoice.id,
                        invoice_number = %invoice.invoice_number,
                        total = %invoice.total_amount,
                        "Invoice created"
                    );
                    return Ok(invoice);
                }
                Err(e) if e.is_conflict() => {
                    warn!(
                        invoice_number = %number,
                        attempt,
                        attempts,
                        "Invoice number already taken, allocating again"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(BillingError::NumberingExhausted { attempts })
    }

    /// Applies a manual edit
    ///
    /// The edit restarts the suppression window, so the status set here
    /// survives reads for the configured time.
    pub async fn edit_invoice(
        &self,
        id: InvoiceId,
        patch: InvoicePatch,
        metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, BillingError> {
        if patch.is_empty() {
            return Err(BillingError::validation("Nothing to update"));
        }

        let updated = self
            .port
            .update_invoice(id, patch, WriteOrigin::Manual, self.clock.now(), metadata)
            .await
            .map_err(|e| not_found_or(e, id))?;

        info!(
            invoice_id = %updated.id,
            invoice_number = %updated.invoice_number,
            status = %updated.status,
            "Invoice edited"
        );
        Ok(updated)
    }

    /// Re-derives the status of a freshly loaded invoice and persists a change
    async fn reconcile(
        &self,
        invoice: Invoice,
        metadata: Option<OperationMetadata>,
    ) -> Result<Invoice, BillingError> {
        let now = self.clock.now();
        let evaluation = self.policy.evaluate(&invoice, now);

        for anomaly in &evaluation.anomalies {
            warn!(
                invoice_id = %invoice.id,
                invoice_number = %invoice.invoice_number,
                anomaly = %anomaly,
                "Invoice data anomaly during status derivation"
            );
        }

        if !evaluation.differs_from(invoice.status) {
            return Ok(invoice);
        }

        let updated = self
            .port
            .update_invoice(
                invoice.id,
                InvoicePatch::status(evaluation.status),
                WriteOrigin::AutoCorrection,
                now,
                metadata,
            )
            .await?;

        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            from = %invoice.status,
            to = %updated.status,
            "Invoice status corrected"
        );
        Ok(updated)
    }
}

fn not_found_or(error: PortError, id: InvoiceId) -> BillingError {
    if error.is_not_found() {
        BillingError::InvoiceNotFound(id.to_string())
    } else {
        BillingError::Port(error)
    }
}
