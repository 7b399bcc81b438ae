//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{Currency, InvoiceId, Money, PatientId};
use domain_billing::{Invoice, InvoiceDraft, InvoiceStatus, LineItem, WriteOrigin};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{IdFixtures, TemporalFixtures};

/// Builder for stored invoices, timestamps included
///
/// Defaults: a pending USD 100.00 invoice due a month after the reference
/// date, nothing paid, last written long before the reference "now".
pub struct InvoiceBuilder {
    id: InvoiceId,
    invoice_number: String,
    patient_id: PatientId,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    currency: Currency,
    total: Decimal,
    balance: Decimal,
    status: InvoiceStatus,
    notes: Option<String>,
    last_modified_at: DateTime<Utc>,
    last_write_origin: WriteOrigin,
    last_auto_corrected_at: Option<DateTime<Utc>>,
}

impl Default for InvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            id: InvoiceId::new_v7(),
            invoice_number: IdFixtures::invoice_number().to_string(),
            patient_id: IdFixtures::patient_id(),
            issue_date: TemporalFixtures::past_due_date(),
            due_date: Some(TemporalFixtures::future_due_date()),
            currency: Currency::USD,
            total: dec!(100.00),
            balance: dec!(100.00),
            status: InvoiceStatus::Pending,
            notes: None,
            last_modified_at: TemporalFixtures::long_ago(),
            last_write_origin: WriteOrigin::Manual,
            last_auto_corrected_at: None,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = number.into();
        self
    }

    pub fn with_patient(mut self, patient_id: PatientId) -> Self {
        self.patient_id = patient_id;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn without_due_date(mut self) -> Self {
        self.due_date = None;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Sets the total; the balance follows unless set afterwards
    pub fn with_total(mut self, total: Decimal) -> Self {
        self.total = total;
        self.balance = total;
        self
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the time of the last write and marks it as manual
    ///
    /// An earlier automatic correction stays on record.
    pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified_at = at;
        self.last_write_origin = WriteOrigin::Manual;
        self
    }

    /// Sets the time of the last write and marks it as an automatic correction
    pub fn auto_corrected_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified_at = at;
        self.last_write_origin = WriteOrigin::AutoCorrection;
        self.last_auto_corrected_at = Some(at);
        self
    }

    /// Builds the invoice
    pub fn build(self) -> Invoice {
        let total = Money::new(self.total, self.currency);
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            patient_id: self.patient_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            currency: self.currency,
            line_items: vec![LineItem::new("Consultation", Decimal::ONE, total)],
            total_amount: total,
            balance: Money::new(self.balance, self.currency),
            status: self.status,
            notes: self.notes,
            created_at: self.last_modified_at,
            last_modified_at: self.last_modified_at,
            last_auto_corrected_at: self.last_auto_corrected_at,
            last_write_origin: self.last_write_origin,
        }
    }
}

/// Builder for drafts submitted to `InvoiceService::create_invoice`
pub struct InvoiceDraftBuilder {
    draft: InvoiceDraft,
}

impl Default for InvoiceDraftBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceDraftBuilder {
    /// A pending USD draft issued on the reference day, no line items yet
    pub fn new() -> Self {
        Self {
            draft: InvoiceDraft {
                patient_id: IdFixtures::patient_id(),
                issue_date: TemporalFixtures::today(),
                due_date: Some(TemporalFixtures::future_due_date()),
                currency: Currency::USD,
                line_items: Vec::new(),
                status: InvoiceStatus::Pending,
                notes: None,
            },
        }
    }

    pub fn for_patient(mut self, patient_id: PatientId) -> Self {
        self.draft.patient_id = patient_id;
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.draft.due_date = Some(due_date);
        self
    }

    pub fn as_draft(mut self) -> Self {
        self.draft.status = InvoiceStatus::Draft;
        self
    }

    /// Adds a line priced in the draft's currency
    pub fn line(mut self, description: &str, quantity: Decimal, unit_price: Decimal) -> Self {
        let price = Money::new(unit_price, self.draft.currency);
        self.draft.line_items.push(LineItem::new(description, quantity, price));
        self
    }

    pub fn build(self) -> InvoiceDraft {
        self.draft
    }
}
