//! Invoice DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use core_kernel::{Currency, InvoiceId, Money, PatientId};
use domain_billing::{Invoice, InvoiceDraft, InvoicePatch, InvoiceQuery, InvoiceStatus, LineItem};

use crate::error::ApiError;
use crate::InvoiceDefaults;

/// Listing limit when the query names none
pub const DEFAULT_LIST_LIMIT: u32 = 100;

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub patient_id: PatientId,
    /// Defaults to today
    pub issue_date: Option<NaiveDate>,
    /// Defaults to the issue date plus the payment terms
    pub due_date: Option<NaiveDate>,
    /// ISO code; defaults to the configured currency
    pub currency: Option<String>,
    #[validate(length(min = 1, message = "at least one line item is required"), nested)]
    pub line_items: Vec<LineItemRequest>,
    /// `draft` or `pending`; defaults to `pending`
    pub status: Option<InvoiceStatus>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LineItemRequest {
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(custom(function = "non_negative"))]
    pub quantity: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub unit_price: Decimal,
}

impl CreateInvoiceRequest {
    /// Fills in defaults and converts to a domain draft
    pub fn into_draft(self, defaults: &InvoiceDefaults, today: NaiveDate) -> Result<InvoiceDraft, ApiError> {
        let currency = match &self.currency {
            Some(code) => code
                .parse::<Currency>()
                .map_err(|e| ApiError::Validation(e.to_string()))?,
            None => defaults.currency,
        };
        let issue_date = self.issue_date.unwrap_or(today);
        let due_date = match self.due_date {
            Some(due) => due,
            None => issue_date
                .checked_add_signed(defaults.payment_terms)
                .ok_or_else(|| ApiError::Validation(format!("No due date can follow {issue_date}")))?,
        };

        let line_items = self
            .line_items
            .into_iter()
            .map(|item| LineItem::new(item.description, item.quantity, Money::new(item.unit_price, currency)))
            .collect();

        Ok(InvoiceDraft {
            patient_id: self.patient_id,
            issue_date,
            due_date: Some(due_date),
            currency,
            line_items,
            status: self.status.unwrap_or(InvoiceStatus::Pending),
            notes: self.notes,
        })
    }
}

/// Manual edit; amounts are in the invoice's currency
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInvoiceRequest {
    #[validate(custom(function = "non_negative"))]
    pub total_amount: Option<Decimal>,
    #[validate(custom(function = "non_negative"))]
    pub balance: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<UpdateInvoiceRequest> for InvoicePatch {
    fn from(request: UpdateInvoiceRequest) -> Self {
        InvoicePatch {
            total_amount: request.total_amount,
            balance: request.balance,
            due_date: request.due_date,
            status: request.status,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListInvoicesQuery {
    pub patient_id: Option<PatientId>,
    pub status: Option<InvoiceStatus>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u32>,
}

impl From<ListInvoicesQuery> for InvoiceQuery {
    fn from(params: ListInvoicesQuery) -> Self {
        InvoiceQuery {
            patient_id: params.patient_id,
            status: params.status,
            limit: Some(params.limit.unwrap_or(DEFAULT_LIST_LIMIT)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineItemResponse {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub patient_id: PatientId,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: Currency,
    pub line_items: Vec<LineItemResponse>,
    pub total_amount: Decimal,
    pub balance: Decimal,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        let line_items = invoice
            .line_items
            .iter()
            .map(|item| LineItemResponse {
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price.amount(),
                line_total: item.line_total().ok().map(|m| m.amount()),
            })
            .collect();

        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            patient_id: invoice.patient_id,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            currency: invoice.currency,
            line_items,
            total_amount: invoice.total_amount.amount(),
            balance: invoice.balance.amount(),
            status: invoice.status,
            notes: invoice.notes,
            created_at: invoice.created_at,
            last_modified_at: invoice.last_modified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn defaults() -> InvoiceDefaults {
        InvoiceDefaults {
            currency: Currency::KES,
            payment_terms: Duration::days(30),
        }
    }

    fn request() -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            patient_id: PatientId::new(),
            issue_date: None,
            due_date: None,
            currency: None,
            line_items: vec![LineItemRequest {
                description: "Consultation".to_string(),
                quantity: dec!(1),
                unit_price: dec!(1500),
            }],
            status: None,
            notes: None,
        }
    }

    #[test]
    fn test_into_draft_fills_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let draft = request().into_draft(&defaults(), today).unwrap();

        assert_eq!(draft.currency, Currency::KES);
        assert_eq!(draft.issue_date, today);
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2024, 3, 2));
        assert_eq!(draft.status, InvoiceStatus::Pending);
        assert_eq!(draft.line_items[0].unit_price, Money::new(dec!(1500), Currency::KES));
    }

    #[test]
    fn test_into_draft_rejects_unknown_currency() {
        let mut req = request();
        req.currency = Some("ZZZ".to_string());
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(matches!(req.into_draft(&defaults(), today), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_validation_catches_negative_price_and_empty_items() {
        let mut req = request();
        req.line_items[0].unit_price = dec!(-1);
        assert!(req.validate().is_err());

        let mut req = request();
        req.line_items.clear();
        assert!(req.validate().is_err());

        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_list_query_defaults_limit() {
        let query: InvoiceQuery = ListInvoicesQuery { patient_id: None, status: None, limit: None }.into();
        assert_eq!(query.limit, Some(DEFAULT_LIST_LIMIT));
    }
}
