//! Invoice model
//!
//! An invoice bills a patient for one or more line items. Its total is fixed
//! when it is created; afterwards only the balance, due date, status and notes
//! move, through payments recorded elsewhere, manual edits, and the automatic
//! status correction in [`crate::status`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Currency, InvoiceId, LineItemId, Money, PatientId};

use crate::error::BillingError;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being prepared, not yet sent to the patient
    Draft,
    /// Issued, nothing paid yet, not past due
    Pending,
    /// Part of the total has been paid, not past due
    Partial,
    /// Nothing left to pay
    Paid,
    /// Balance outstanding after the due date
    Overdue,
    /// Voided by staff; never changed automatically
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true for statuses the automatic rule must never leave
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Cancelled)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "pending" => Ok(InvoiceStatus::Pending),
            "partial" => Ok(InvoiceStatus::Partial),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(BillingError::validation(format!("Unknown invoice status: {other}"))),
        }
    }
}

/// A line on an invoice: a consultation, a dispensed medication, a lab test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Money) -> Self {
        Self {
            id: LineItemId::new(),
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// `quantity × unit_price`
    pub fn line_total(&self) -> Result<Money, BillingError> {
        Ok(self.unit_price.checked_mul(self.quantity)?)
    }

    fn validate(&self, index: usize, currency: Currency) -> Result<(), BillingError> {
        if self.description.trim().is_empty() {
            return Err(BillingError::validation(format!(
                "Line item {index}: description is required"
            )));
        }
        if self.quantity < Decimal::ZERO {
            return Err(BillingError::validation(format!(
                "Line item {index}: quantity must not be negative"
            )));
        }
        if self.unit_price.currency() != currency {
            return Err(BillingError::validation(format!(
                "Line item {index}: priced in {}, invoice is in {currency}",
                self.unit_price.currency()
            )));
        }
        if self.unit_price.is_negative() {
            return Err(BillingError::validation(format!(
                "Line item {index}: unit price must not be negative"
            )));
        }
        Ok(())
    }
}

/// What the billing form submits to open a new invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub patient_id: PatientId,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: Currency,
    pub line_items: Vec<LineItem>,
    /// Either `draft` or `pending`
    pub status: InvoiceStatus,
    pub notes: Option<String>,
}

impl InvoiceDraft {
    /// Checks the draft and returns its total
    ///
    /// # Errors
    ///
    /// `BillingError::Validation` when there are no line items, a line item is
    /// malformed or in another currency, the due date precedes the issue date,
    /// or the initial status is neither `draft` nor `pending`.
    pub fn validate(&self) -> Result<Money, BillingError> {
        if self.line_items.is_empty() {
            return Err(BillingError::validation("An invoice needs at least one line item"));
        }
        if !matches!(self.status, InvoiceStatus::Draft | InvoiceStatus::Pending) {
            return Err(BillingError::validation(format!(
                "A new invoice must start as draft or pending, not {}",
                self.status
            )));
        }
        if let Some(due) = self.due_date {
            if due < self.issue_date {
                return Err(BillingError::validation(format!(
                    "Due date {due} is before issue date {}",
                    self.issue_date
                )));
            }
        }

        let mut total = Money::zero(self.currency);
        for (index, item) in self.line_items.iter().enumerate() {
            item.validate(index, self.currency)?;
            total = total.checked_add(&item.line_total()?)?;
        }
        Ok(total)
    }
}

/// A validated draft with its allocated number, ready to be stored
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub draft: InvoiceDraft,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl NewInvoice {
    pub fn new(
        draft: InvoiceDraft,
        invoice_number: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        let total_amount = draft.validate()?;
        Ok(Self {
            invoice_number: invoice_number.into(),
            draft,
            total_amount,
            created_at,
        })
    }
}

/// A stored invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Human-readable number, e.g. `INV-202501-000123`; never changes
    pub invoice_number: String,
    pub patient_id: PatientId,
    pub issue_date: NaiveDate,
    /// Missing on some legacy records
    pub due_date: Option<NaiveDate>,
    pub currency: Currency,
    pub line_items: Vec<LineItem>,
    pub total_amount: Money,
    /// Amount still owed
    pub balance: Money,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Time of the most recent write of any kind
    pub last_modified_at: DateTime<Utc>,
    /// Time of the most recent automatic status correction
    pub last_auto_corrected_at: Option<DateTime<Utc>>,
    /// Who made the write stamped in `last_modified_at`
    #[serde(default)]
    pub last_write_origin: WriteOrigin,
}

impl Invoice {
    /// Materialises a new invoice under the id the store assigned
    pub fn create(id: InvoiceId, new: NewInvoice) -> Self {
        let NewInvoice {
            invoice_number,
            draft,
            total_amount,
            created_at,
        } = new;

        Self {
            id,
            invoice_number,
            patient_id: draft.patient_id,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            currency: draft.currency,
            line_items: draft.line_items,
            total_amount,
            balance: total_amount,
            status: draft.status,
            notes: draft.notes,
            created_at,
            last_modified_at: created_at,
            last_auto_corrected_at: None,
            last_write_origin: WriteOrigin::Manual,
        }
    }

    /// `total_amount - balance`
    pub fn amount_paid(&self) -> Result<Money, BillingError> {
        Ok(self.total_amount.checked_sub(&self.balance)?)
    }

    /// Returns true if the most recent write was an automatic status correction
    pub fn last_write_was_automatic(&self) -> bool {
        self.last_write_origin == WriteOrigin::AutoCorrection
    }

    /// Applies a partial update and stamps the write time
    ///
    /// Amounts in the patch are taken to be in the invoice's currency.
    ///
    /// # Errors
    ///
    /// `BillingError::Validation` if an amount is negative. The invoice is
    /// left untouched on error.
    pub fn apply_patch(
        &mut self,
        patch: &InvoicePatch,
        origin: WriteOrigin,
        at: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        for (field, value) in [("total_amount", patch.total_amount), ("balance", patch.balance)] {
            if value.is_some_and(|amount| amount < Decimal::ZERO) {
                return Err(BillingError::validation(format!("{field} must not be negative")));
            }
        }

        if let Some(total) = patch.total_amount {
            self.total_amount = Money::new(total, self.currency);
        }
        if let Some(balance) = patch.balance {
            self.balance = Money::new(balance, self.currency);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }

        self.last_modified_at = at;
        self.last_write_origin = origin;
        if origin == WriteOrigin::AutoCorrection {
            self.last_auto_corrected_at = Some(at);
        }
        Ok(())
    }
}

/// Fields a write may change; `None` leaves the field as it is
///
/// There is no invoice number field: numbers never change once assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoicePatch {
    pub total_amount: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
}

impl InvoicePatch {
    /// A patch that only changes the status
    pub fn status(status: InvoiceStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_amount.is_none()
            && self.balance.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.notes.is_none()
    }
}

/// Who made a write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOrigin {
    /// A person editing the invoice, or a payment being recorded
    #[default]
    Manual,
    /// The status rule correcting a stale status on read
    AutoCorrection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn draft() -> InvoiceDraft {
        InvoiceDraft {
            patient_id: PatientId::new(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            currency: Currency::USD,
            line_items: vec![
                LineItem::new("Consultation", dec!(1), usd(dec!(60))),
                LineItem::new("Amoxicillin 500mg", dec!(2), usd(dec!(20))),
            ],
            status: InvoiceStatus::Pending,
            notes: None,
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            InvoiceStatus::Draft,
            InvoiceStatus::Pending,
            InvoiceStatus::Partial,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<InvoiceStatus>().unwrap(), status);
        }
        assert!("Paid".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&InvoiceStatus::Overdue).unwrap(), "\"overdue\"");
    }

    #[test]
    fn test_draft_total_is_sum_of_line_totals() {
        assert_eq!(draft().validate().unwrap(), usd(dec!(100)));
    }

    #[test]
    fn test_draft_rejects_foreign_currency_line() {
        let mut d = draft();
        d.line_items.push(LineItem::new("Bed", dec!(1), Money::new(dec!(5), Currency::KES)));
        assert!(matches!(d.validate(), Err(BillingError::Validation(_))));
    }

    #[test]
    fn test_draft_rejects_negative_quantity_and_price() {
        let mut d = draft();
        d.line_items[0].quantity = dec!(-1);
        assert!(d.validate().is_err());

        let mut d = draft();
        d.line_items[0].unit_price = usd(dec!(-5));
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_draft_rejects_bad_dates_and_status() {
        let mut d = draft();
        d.due_date = NaiveDate::from_ymd_opt(2023, 12, 31);
        assert!(d.validate().is_err());

        let mut d = draft();
        d.status = InvoiceStatus::Paid;
        assert!(d.validate().is_err());

        let mut d = draft();
        d.line_items.clear();
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_create_starts_with_full_balance() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let new = NewInvoice::new(draft(), "INV-202401-000001", at).unwrap();
        let invoice = Invoice::create(InvoiceId::new_v7(), new);

        assert_eq!(invoice.balance, invoice.total_amount);
        assert_eq!(invoice.amount_paid().unwrap(), Money::zero(Currency::USD));
        assert_eq!(invoice.last_modified_at, at);
        assert!(invoice.last_auto_corrected_at.is_none());
    }

    #[test]
    fn test_apply_patch_stamps_origin() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let mut invoice = Invoice::create(
            InvoiceId::new_v7(),
            NewInvoice::new(draft(), "INV-202401-000001", at).unwrap(),
        );

        let later = at + chrono::Duration::hours(1);
        invoice
            .apply_patch(&InvoicePatch::status(InvoiceStatus::Overdue), WriteOrigin::AutoCorrection, later)
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Overdue);
        assert!(invoice.last_write_was_automatic());

        let patch = InvoicePatch {
            balance: Some(dec!(40)),
            ..Default::default()
        };
        let latest = later + chrono::Duration::hours(1);
        invoice.apply_patch(&patch, WriteOrigin::Manual, latest).unwrap();
        assert_eq!(invoice.balance, usd(dec!(40)));
        assert_eq!(invoice.last_modified_at, latest);
        assert!(!invoice.last_write_was_automatic());
    }

    #[test]
    fn test_manual_write_at_same_instant_as_correction_is_manual() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let mut invoice = Invoice::create(
            InvoiceId::new_v7(),
            NewInvoice::new(draft(), "INV-202401-000001", at).unwrap(),
        );

        let corrected = at + chrono::Duration::days(31);
        invoice
            .apply_patch(&InvoicePatch::status(InvoiceStatus::Overdue), WriteOrigin::AutoCorrection, corrected)
            .unwrap();
        invoice
            .apply_patch(&InvoicePatch::status(InvoiceStatus::Partial), WriteOrigin::Manual, corrected)
            .unwrap();

        assert_eq!(invoice.last_auto_corrected_at, Some(invoice.last_modified_at));
        assert_eq!(invoice.last_write_origin, WriteOrigin::Manual);
        assert!(!invoice.last_write_was_automatic());
    }

    #[test]
    fn test_stored_record_without_origin_reads_as_manual() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let invoice = Invoice::create(
            InvoiceId::new_v7(),
            NewInvoice::new(draft(), "INV-202401-000001", at).unwrap(),
        );
        let mut json = serde_json::to_value(&invoice).unwrap();
        json.as_object_mut().unwrap().remove("last_write_origin");

        let restored: Invoice = serde_json::from_value(json).unwrap();
        assert_eq!(restored.last_write_origin, WriteOrigin::Manual);
    }

    #[test]
    fn test_apply_patch_rejects_negative_amounts() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let mut invoice = Invoice::create(
            InvoiceId::new_v7(),
            NewInvoice::new(draft(), "INV-202401-000001", at).unwrap(),
        );
        let before = invoice.clone();

        let patch = InvoicePatch {
            balance: Some(dec!(-10)),
            status: Some(InvoiceStatus::Paid),
            ..Default::default()
        };
        assert!(invoice.apply_patch(&patch, WriteOrigin::Manual, at).is_err());
        assert_eq!(invoice, before);
    }
}
