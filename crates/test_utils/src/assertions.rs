//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use chrono::{DateTime, Utc};
use core_kernel::Money;
use domain_billing::{Invoice, InvoiceStatus, StatusPolicy};
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts the status `policy` derives for `invoice` at `now`
pub fn assert_derived_status(
    policy: &StatusPolicy,
    invoice: &Invoice,
    now: DateTime<Utc>,
    expected: InvoiceStatus,
) {
    let evaluation = policy.evaluate(invoice, now);
    assert_eq!(
        evaluation.status, expected,
        "Invoice {} (stored {}, balance {}, total {}, due {:?}, last written {}) derived {} at {}, expected {}",
        invoice.invoice_number,
        invoice.status,
        invoice.balance,
        invoice.total_amount,
        invoice.due_date,
        invoice.last_modified_at,
        evaluation.status,
        now,
        expected
    );
}

/// Asserts that an invoice's balance has not gone below zero or above its total
pub fn assert_balance_within_total(invoice: &Invoice) {
    assert!(
        !invoice.balance.is_negative(),
        "Invoice {} has negative balance {}",
        invoice.invoice_number,
        invoice.balance
    );
    assert!(
        invoice.balance.amount() <= invoice.total_amount.amount(),
        "Invoice {} balance {} exceeds total {}",
        invoice.invoice_number,
        invoice.balance,
        invoice.total_amount
    );
}
