//! Human-readable sequential identifiers
//!
//! Patients, invoices and prescriptions carry a short number (`P042`,
//! `INV-202501-000123`, `RX-00017`) next to their opaque UUID. A new number is
//! derived from the most recent one of the same kind: fetch the latest, parse
//! its numeric suffix, add one, zero-pad.
//!
//! # Concurrency
//!
//! The read-increment-write sequence is not atomic. Two concurrent creations
//! can compute the same candidate; the store must reject the second write with
//! [`PortError::Conflict`] and the caller must allocate again (bounded).
//!
//! # Malformed history
//!
//! If the latest identifier does not parse as `prefix + digits`, the allocator
//! falls back to `prefix + unix millis`. Uniqueness is preferred over strict
//! sequentiality in that case.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{DomainPort, PortError};
use crate::temporal::{Clock, Timezone};

/// The kind of record a number is allocated for; each kind has its own sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Patient,
    Invoice,
    Prescription,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Patient => "patient",
            IdentifierKind::Invoice => "invoice",
            IdentifierKind::Prescription => "prescription",
        }
    }

    /// The numbering scheme used for this kind unless configured otherwise
    pub fn default_scheme(&self) -> IdentifierScheme {
        match self {
            IdentifierKind::Patient => IdentifierScheme::fixed("P", 3),
            IdentifierKind::Invoice => IdentifierScheme::monthly("INV-", 6),
            IdentifierKind::Prescription => IdentifierScheme::fixed("RX-", 5),
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the prefix and padding of a kind's numbers are chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierScheme {
    /// Static part of the prefix
    pub prefix: String,
    /// Minimum number of digits in the numeric suffix
    pub pad: usize,
    /// When true, `YYYYMM-` is appended to the prefix so each month restarts at 1
    pub monthly: bool,
}

impl IdentifierScheme {
    pub fn fixed(prefix: impl Into<String>, pad: usize) -> Self {
        Self {
            prefix: prefix.into(),
            pad,
            monthly: false,
        }
    }

    pub fn monthly(prefix: impl Into<String>, pad: usize) -> Self {
        Self {
            prefix: prefix.into(),
            pad,
            monthly: true,
        }
    }

    /// Resolves the concrete prefix for an allocation made at `now`
    pub fn prefix_at(&self, now: DateTime<Utc>, timezone: Timezone) -> String {
        if self.monthly {
            format!("{}{}-", self.prefix, timezone.to_local(now).format("%Y%m"))
        } else {
            self.prefix.clone()
        }
    }
}

/// Computes the identifier following `latest`
///
/// * `None` → `prefix` followed by `1` zero-padded to `pad` digits
/// * `prefix + digits` → the incremented number, zero-padded to `pad` digits
///   (a longer number is kept at its natural width)
/// * anything else → `prefix + now` in unix milliseconds
pub fn next_in_sequence(latest: Option<&str>, prefix: &str, pad: usize, now: DateTime<Utc>) -> String {
    let Some(latest) = latest else {
        return format!("{prefix}{:0pad$}", 1u64);
    };

    match parse_suffix(latest, prefix).and_then(|n| n.checked_add(1)) {
        Some(next) => format!("{prefix}{next:0pad$}"),
        None => fallback_identifier(prefix, now),
    }
}

fn parse_suffix(identifier: &str, prefix: &str) -> Option<u64> {
    let digits = identifier.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn fallback_identifier(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}{}", now.timestamp_millis())
}

/// Orders identifiers sharing a prefix so that `P1000` sorts after `P999`
///
/// Stores answering [`SequenceSource::latest_identifier`] should use this
/// ordering rather than a plain string sort.
pub fn compare_identifiers(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Port answering "what is the most recent identifier issued for this kind"
#[async_trait]
pub trait SequenceSource: DomainPort {
    /// Returns the greatest identifier of `kind` that starts with `prefix`,
    /// or `None` when no such record exists yet
    async fn latest_identifier(
        &self,
        kind: IdentifierKind,
        prefix: &str,
    ) -> Result<Option<String>, PortError>;
}

/// Allocates the next human-readable identifier for a kind of record
pub struct IdentifierAllocator {
    source: Arc<dyn SequenceSource>,
    clock: Arc<dyn Clock>,
}

impl IdentifierAllocator {
    pub fn new(source: Arc<dyn SequenceSource>, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }

    /// Returns the candidate identifier for a new record of `kind`
    ///
    /// The result is not reserved: callers must create the record and retry
    /// on a uniqueness conflict.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying [`SequenceSource`].
    pub async fn next_identifier(
        &self,
        kind: IdentifierKind,
        prefix: &str,
        pad: usize,
    ) -> Result<String, PortError> {
        let latest = self.source.latest_identifier(kind, prefix).await?;
        let now = self.clock.now();
        let next = next_in_sequence(latest.as_deref(), prefix, pad, now);

        if let Some(latest) = latest.as_deref() {
            if parse_suffix(latest, prefix).is_none() {
                tracing::warn!(
                    kind = %kind,
                    latest = %latest,
                    fallback = %next,
                    "Latest identifier is not prefix + digits, using timestamp suffix"
                );
            }
        }

        tracing::debug!(kind = %kind, identifier = %next, "Allocated identifier");
        Ok(next)
    }

    /// Allocates using a scheme, resolving monthly prefixes in `timezone`
    pub async fn next_for_scheme(
        &self,
        kind: IdentifierKind,
        scheme: &IdentifierScheme,
        timezone: Timezone,
    ) -> Result<String, PortError> {
        let prefix = scheme.prefix_at(self.clock.now(), timezone);
        self.next_identifier(kind, &prefix, scheme.pad).await
    }
}

/// In-memory [`SequenceSource`] keyed by kind
///
/// Used where no document store backs a kind, and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySequenceSource {
    issued: Arc<RwLock<HashMap<IdentifierKind, Vec<String>>>>,
}

impl MemorySequenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an identifier as issued
    pub async fn record(&self, kind: IdentifierKind, identifier: impl Into<String>) {
        self.issued
            .write()
            .await
            .entry(kind)
            .or_default()
            .push(identifier.into());
    }
}

impl DomainPort for MemorySequenceSource {}

#[async_trait]
impl SequenceSource for MemorySequenceSource {
    async fn latest_identifier(
        &self,
        kind: IdentifierKind,
        prefix: &str,
    ) -> Result<Option<String>, PortError> {
        let issued = self.issued.read().await;
        Ok(issued
            .get(&kind)
            .and_then(|ids| {
                ids.iter()
                    .filter(|id| id.starts_with(prefix))
                    .max_by(|a, b| compare_identifiers(a, b))
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::FixedClock;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_identifier_is_padded_one() {
        assert_eq!(next_in_sequence(None, "P", 3, at(2024, 1, 1)), "P001");
        assert_eq!(next_in_sequence(None, "RX-", 5, at(2024, 1, 1)), "RX-00001");
        assert_eq!(next_in_sequence(None, "N", 0, at(2024, 1, 1)), "N1");
    }

    #[test]
    fn test_increment_keeps_padding() {
        assert_eq!(next_in_sequence(Some("P041"), "P", 3, at(2024, 1, 1)), "P042");
        assert_eq!(next_in_sequence(Some("P099"), "P", 3, at(2024, 1, 1)), "P100");
        assert_eq!(next_in_sequence(Some("P999"), "P", 3, at(2024, 1, 1)), "P1000");
        assert_eq!(
            next_in_sequence(Some("INV-202501-000123"), "INV-202501-", 6, at(2025, 1, 9)),
            "INV-202501-000124"
        );
    }

    #[test]
    fn test_unparsable_latest_falls_back_to_timestamp() {
        let now = at(2024, 2, 1);
        let next = next_in_sequence(Some("P0XY"), "P", 3, now);
        assert_eq!(next, format!("P{}", now.timestamp_millis()));
        assert_ne!(next, "P0XY");
    }

    #[test]
    fn test_wrong_prefix_and_empty_suffix_fall_back() {
        let now = at(2024, 2, 1);
        assert!(next_in_sequence(Some("Q041"), "P", 3, now).starts_with('P'));
        assert_eq!(next_in_sequence(Some("P"), "P", 3, now), format!("P{}", now.timestamp_millis()));
        assert_eq!(
            next_in_sequence(Some("P18446744073709551615"), "P", 3, now),
            format!("P{}", now.timestamp_millis())
        );
    }

    #[test]
    fn test_monthly_prefix() {
        let scheme = IdentifierKind::Invoice.default_scheme();
        assert_eq!(scheme.prefix_at(at(2025, 1, 15), Timezone::default()), "INV-202501-");
        assert_eq!(IdentifierKind::Patient.default_scheme().prefix_at(at(2025, 1, 15), Timezone::default()), "P");
    }

    #[tokio::test]
    async fn test_allocator_on_empty_and_populated_source() {
        let source = MemorySequenceSource::new();
        let clock = Arc::new(FixedClock::new(at(2024, 2, 1)));
        let allocator = IdentifierAllocator::new(Arc::new(source.clone()), clock);

        assert_eq!(
            allocator.next_identifier(IdentifierKind::Patient, "P", 3).await.unwrap(),
            "P001"
        );

        source.record(IdentifierKind::Patient, "P040").await;
        source.record(IdentifierKind::Patient, "P041").await;
        source.record(IdentifierKind::Prescription, "RX-00900").await;

        assert_eq!(
            allocator.next_identifier(IdentifierKind::Patient, "P", 3).await.unwrap(),
            "P042"
        );
        assert_eq!(
            allocator.next_identifier(IdentifierKind::Prescription, "RX-", 5).await.unwrap(),
            "RX-00901"
        );
    }

    #[tokio::test]
    async fn test_latest_uses_numeric_width_ordering() {
        let source = MemorySequenceSource::new();
        source.record(IdentifierKind::Patient, "P999").await;
        source.record(IdentifierKind::Patient, "P1000").await;

        let latest = source.latest_identifier(IdentifierKind::Patient, "P").await.unwrap();
        assert_eq!(latest.as_deref(), Some("P1000"));
    }

    #[tokio::test]
    async fn test_allocator_fallback_is_unique() {
        let source = MemorySequenceSource::new();
        source.record(IdentifierKind::Patient, "P0XY").await;
        let clock = Arc::new(FixedClock::new(at(2024, 2, 1)));
        let allocator = IdentifierAllocator::new(Arc::new(source), clock);

        let next = allocator.next_identifier(IdentifierKind::Patient, "P", 3).await.unwrap();
        assert!(next.starts_with('P'));
        assert_ne!(next, "P0XY");
    }

    #[tokio::test]
    async fn test_monthly_scheme_restarts_each_month() {
        let source = MemorySequenceSource::new();
        source.record(IdentifierKind::Invoice, "INV-202501-000123").await;
        let clock = Arc::new(FixedClock::new(at(2025, 2, 3)));
        let allocator = IdentifierAllocator::new(Arc::new(source), clock.clone());
        let scheme = IdentifierKind::Invoice.default_scheme();

        let next = allocator
            .next_for_scheme(IdentifierKind::Invoice, &scheme, Timezone::default())
            .await
            .unwrap();
        assert_eq!(next, "INV-202502-000001");

        clock.set(at(2025, 1, 20));
        let next = allocator
            .next_for_scheme(IdentifierKind::Invoice, &scheme, Timezone::default())
            .await
            .unwrap();
        assert_eq!(next, "INV-202501-000124");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn increment_is_successor(n in 0u64..10_000_000u64, pad in 0usize..10usize) {
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let latest = format!("P{n:0pad$}");
            let next = next_in_sequence(Some(&latest), "P", pad, now);
            let parsed: u64 = next.strip_prefix('P').unwrap().parse().unwrap();
            prop_assert_eq!(parsed, n + 1);
            prop_assert!(next.len() >= pad + 1);
        }
    }
}
