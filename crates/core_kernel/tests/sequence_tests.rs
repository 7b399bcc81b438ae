//! Identifier allocation scenarios
//!
//! Covers first allocation, increment, malformed history and the retry loop a
//! caller builds on top of the allocator when the store reports a conflict.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use core_kernel::{
    FixedClock, IdentifierAllocator, IdentifierKind, MemorySequenceSource, SequenceSource,
};

fn allocator(source: &MemorySequenceSource, clock: Arc<FixedClock>) -> IdentifierAllocator {
    IdentifierAllocator::new(Arc::new(source.clone()), clock)
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 8, 30, 0).unwrap()))
}

#[tokio::test]
async fn test_patient_numbers_on_empty_collection() {
    let source = MemorySequenceSource::new();
    let allocator = allocator(&source, clock());

    let next = allocator.next_identifier(IdentifierKind::Patient, "P", 3).await.unwrap();
    assert_eq!(next, "P001");
}

#[tokio::test]
async fn test_patient_numbers_after_p041() {
    let source = MemorySequenceSource::new();
    source.record(IdentifierKind::Patient, "P041").await;
    let allocator = allocator(&source, clock());

    let next = allocator.next_identifier(IdentifierKind::Patient, "P", 3).await.unwrap();
    assert_eq!(next, "P042");
}

#[tokio::test]
async fn test_sequences_are_scoped_per_kind() {
    let source = MemorySequenceSource::new();
    source.record(IdentifierKind::Prescription, "P777").await;
    let allocator = allocator(&source, clock());

    let next = allocator.next_identifier(IdentifierKind::Patient, "P", 3).await.unwrap();
    assert_eq!(next, "P001");
}

#[tokio::test]
async fn test_malformed_history_yields_unique_fallback() {
    let source = MemorySequenceSource::new();
    let prior = ["P001", "P0XY"];
    for id in prior {
        source.record(IdentifierKind::Patient, id).await;
    }
    let clock = clock();
    let allocator = allocator(&source, clock.clone());

    let first = allocator.next_identifier(IdentifierKind::Patient, "P", 3).await.unwrap();
    assert!(first.starts_with('P'));
    assert!(!prior.contains(&first.as_str()));

    // The fallback is numeric, so the sequence continues from it
    source.record(IdentifierKind::Patient, first.clone()).await;
    clock.advance(Duration::milliseconds(1));
    let second = allocator.next_identifier(IdentifierKind::Patient, "P", 3).await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_retry_until_unique_after_concurrent_allocation() {
    let source = MemorySequenceSource::new();
    source.record(IdentifierKind::Invoice, "INV-202402-000007").await;
    let allocator = allocator(&source, clock());

    // Two callers read the same maximum
    let a = allocator.next_identifier(IdentifierKind::Invoice, "INV-202402-", 6).await.unwrap();
    let b = allocator.next_identifier(IdentifierKind::Invoice, "INV-202402-", 6).await.unwrap();
    assert_eq!(a, b);

    // The first write wins; the loser allocates again and gets a fresh number
    let mut taken: HashSet<String> = HashSet::new();
    taken.insert(a.clone());
    source.record(IdentifierKind::Invoice, a.clone()).await;

    let retried = allocator.next_identifier(IdentifierKind::Invoice, "INV-202402-", 6).await.unwrap();
    assert!(!taken.contains(&retried));
    assert_eq!(retried, "INV-202402-000009");

    let latest = source
        .latest_identifier(IdentifierKind::Invoice, "INV-202402-")
        .await
        .unwrap();
    assert_eq!(latest.as_deref(), Some("INV-202402-000008"));
}
