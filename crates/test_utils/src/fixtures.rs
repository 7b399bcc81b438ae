//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the hospital
//! system. These fixtures are designed to be consistent and predictable.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{Currency, FixedClock, Money, PatientId};
use domain_billing::adapters::InMemoryInvoiceStore;
use domain_billing::InvoiceService;
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Creates a standard USD amount for testing
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// Creates a KES amount for currency mismatch tests
    pub fn kes_1500() -> Money {
        Money::new(dec!(1500), Currency::KES)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Reference "now" used across tests (Feb 1, 2024, 10:00 UTC)
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap()
    }

    /// Calendar day of [`TemporalFixtures::now`]
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    /// A due date a month before `now`
    pub fn past_due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// A due date a month after `now`
    pub fn future_due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    /// A write long enough ago to be outside any suppression window
    pub fn long_ago() -> DateTime<Utc> {
        Self::now() - Duration::days(60)
    }

    /// A write inside the default suppression window
    pub fn moments_ago() -> DateTime<Utc> {
        Self::now() - Duration::minutes(5)
    }

    /// A clock pinned at [`TemporalFixtures::now`]
    pub fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(Self::now()))
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn patient_id() -> PatientId {
        PatientId::new()
    }

    /// First invoice number of the reference month
    pub fn invoice_number() -> &'static str {
        "INV-202402-000001"
    }
}

/// An in-memory store with a service wired on top of it
pub struct ServiceFixture {
    pub store: InMemoryInvoiceStore,
    pub clock: Arc<FixedClock>,
    pub service: InvoiceService,
}

impl ServiceFixture {
    /// Default policy and numbering, clock pinned at [`TemporalFixtures::now`]
    pub fn new() -> Self {
        let store = InMemoryInvoiceStore::new();
        let clock = TemporalFixtures::clock();
        let service = InvoiceService::new(Arc::new(store.clone()), Arc::new(store.clone()), clock.clone());
        Self { store, clock, service }
    }
}

impl Default for ServiceFixture {
    fn default() -> Self {
        Self::new()
    }
}
