//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{DateTime, Duration, Utc};
use core_kernel::Currency;
use domain_billing::{Invoice, InvoiceStatus};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::InvoiceBuilder;
use crate::fixtures::TemporalFixtures;

/// Strategy for generating Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
        Just(Currency::INR),
        Just(Currency::NGN),
        Just(Currency::KES),
        Just(Currency::ZAR),
    ]
}

/// Strategy for amounts in cents, negative included
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for any invoice status
pub fn invoice_status_strategy() -> impl Strategy<Value = InvoiceStatus> {
    prop_oneof![
        Just(InvoiceStatus::Draft),
        Just(InvoiceStatus::Pending),
        Just(InvoiceStatus::Partial),
        Just(InvoiceStatus::Paid),
        Just(InvoiceStatus::Overdue),
        Just(InvoiceStatus::Cancelled),
    ]
}

/// Strategy for last-write timestamps from a year before to an hour after
/// the reference "now"
pub fn write_time_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (-60i64..525_600i64).prop_map(|minutes_ago| TemporalFixtures::now() - Duration::minutes(minutes_ago))
}

/// Strategy for stored invoices with arbitrary balances, due dates and write times
pub fn invoice_strategy() -> impl Strategy<Value = Invoice> {
    (
        amount_strategy(),
        amount_strategy(),
        proptest::option::of(-400i64..400i64),
        invoice_status_strategy(),
        write_time_strategy(),
        currency_strategy(),
    )
        .prop_map(|(total, balance, due_offset, status, written, currency)| {
            let builder = InvoiceBuilder::new()
                .with_currency(currency)
                .with_total(total)
                .with_balance(balance)
                .with_status(status)
                .modified_at(written);
            match due_offset {
                Some(days) => builder.with_due_date(TemporalFixtures::today() + Duration::days(days)),
                None => builder.without_due_date(),
            }
            .build()
        })
}
