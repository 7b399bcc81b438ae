//! Invoice status derivation
//!
//! The stored status of an invoice goes stale: the due date passes, a payment
//! lands, a manual edit zeroes the balance. Every read re-derives the status
//! from the balance, the total and the due date, in this order:
//!
//! 1. `cancelled` stays `cancelled`
//! 2. an invoice written within the suppression window keeps its status
//! 3. `balance <= 0` → `paid`
//! 4. `balance > 0` and today is after the due date → `overdue`
//! 5. `balance < total` → `partial`
//! 6. otherwise → `pending`
//!
//! "Today" and the due date are compared as calendar days in one configured
//! time zone, so an invoice due on the 1st is not overdue at 23:59 on the 1st.
//!
//! Derivation never fails. Inputs that break the model's assumptions are
//! reported as [`StatusAnomaly`] values for the caller to log.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::Timezone;

use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceStatus};

/// Default length of the suppression window after a write
pub const DEFAULT_SUPPRESSION_WINDOW_MINUTES: i64 = 10;

/// Which writes restart the suppression window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionClock {
    /// Every write, including automatic corrections
    AnyWrite,
    /// Only manual edits; a record whose last write was an automatic
    /// correction is re-evaluated immediately
    ManualEditsOnly,
}

impl FromStr for SuppressionClock {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any_write" => Ok(SuppressionClock::AnyWrite),
            "manual_edits_only" => Ok(SuppressionClock::ManualEditsOnly),
            other => Err(BillingError::validation(format!("Unknown suppression clock: {other}"))),
        }
    }
}

/// Input that breaks an assumption of the status rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAnomaly {
    /// No due date on an invoice with money owed; treated as `pending`
    MissingDueDate,
    /// Balance below zero; treated as `paid`
    NegativeBalance,
    /// Balance above the invoice total
    BalanceExceedsTotal,
    /// Balance and total carry different currencies; amounts compared as-is
    CurrencyMismatch,
}

impl fmt::Display for StatusAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusAnomaly::MissingDueDate => "missing due date",
            StatusAnomaly::NegativeBalance => "negative balance",
            StatusAnomaly::BalanceExceedsTotal => "balance exceeds total",
            StatusAnomaly::CurrencyMismatch => "balance and total currencies differ",
        };
        f.write_str(text)
    }
}

/// Result of evaluating an invoice against the status rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvaluation {
    pub status: InvoiceStatus,
    pub anomalies: Vec<StatusAnomaly>,
}

impl StatusEvaluation {
    fn settled(status: InvoiceStatus) -> Self {
        Self {
            status,
            anomalies: Vec::new(),
        }
    }

    /// Returns true if the derived status differs from `stored`
    pub fn differs_from(&self, stored: InvoiceStatus) -> bool {
        self.status != stored
    }
}

/// Parameters of the status rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    /// How long after a write the stored status is left alone
    pub suppression_window: Duration,
    pub suppression_clock: SuppressionClock,
    /// Zone in which `now` is truncated to a calendar day
    pub timezone: Timezone,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            suppression_window: Duration::minutes(DEFAULT_SUPPRESSION_WINDOW_MINUTES),
            suppression_clock: SuppressionClock::ManualEditsOnly,
            timezone: Timezone::default(),
        }
    }
}

impl StatusPolicy {
    pub fn with_suppression_window(mut self, window: Duration) -> Self {
        self.suppression_window = window;
        self
    }

    pub fn with_suppression_clock(mut self, clock: SuppressionClock) -> Self {
        self.suppression_clock = clock;
        self
    }

    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    /// Returns true if a write within the window protects the stored status
    pub fn is_recently_modified(&self, invoice: &Invoice, now: DateTime<Utc>) -> bool {
        if self.suppression_clock == SuppressionClock::ManualEditsOnly
            && invoice.last_write_was_automatic()
        {
            return false;
        }
        now.signed_duration_since(invoice.last_modified_at) < self.suppression_window
    }

    /// Derives the status `invoice` should have at `now`
    pub fn evaluate(&self, invoice: &Invoice, now: DateTime<Utc>) -> StatusEvaluation {
        if invoice.status.is_terminal() {
            return StatusEvaluation::settled(invoice.status);
        }
        if self.is_recently_modified(invoice, now) {
            return StatusEvaluation::settled(invoice.status);
        }

        let mut anomalies = Vec::new();
        if invoice.balance.currency() != invoice.total_amount.currency() {
            anomalies.push(StatusAnomaly::CurrencyMismatch);
        }
        let balance = invoice.balance.amount();
        let total = invoice.total_amount.amount();

        if balance <= Decimal::ZERO {
            if balance < Decimal::ZERO {
                anomalies.push(StatusAnomaly::NegativeBalance);
            }
            return StatusEvaluation {
                status: InvoiceStatus::Paid,
                anomalies,
            };
        }
        if balance > total {
            anomalies.push(StatusAnomaly::BalanceExceedsTotal);
        }

        let status = match invoice.due_date {
            None => {
                anomalies.push(StatusAnomaly::MissingDueDate);
                InvoiceStatus::Pending
            }
            Some(due) if self.timezone.calendar_day(now) > due => InvoiceStatus::Overdue,
            Some(_) if balance < total => InvoiceStatus::Partial,
            Some(_) => InvoiceStatus::Pending,
        };

        StatusEvaluation { status, anomalies }
    }
}

/// Derives the status `invoice` should have at `now` under the default policy
pub fn derive_status(invoice: &Invoice, now: DateTime<Utc>) -> InvoiceStatus {
    StatusPolicy::default().evaluate(invoice, now).status
}
