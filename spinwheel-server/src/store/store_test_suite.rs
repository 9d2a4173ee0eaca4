//! Behavior shared by every store backend
//!
//! Each test runs the same scenario against the memory actor and an
//! in-memory SQLite database.

use super::{LedgerActor, SqliteStore, Store};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use spinwheel::{ClaimRecord, EventKind, Identity, MemoryLedger, Prize, SpinRecord};
use std::collections::HashSet;
use std::sync::Arc;

async fn all_stores() -> Vec<(&'static str, Arc<dyn Store>)> {
    vec![
        (
            "Memory",
            Arc::new(LedgerActor::spawn(64, MemoryLedger::new())) as Arc<dyn Store>,
        ),
        (
            "Sqlite",
            Arc::new(SqliteStore::in_memory().await.unwrap()) as Arc<dyn Store>,
        ),
    ]
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn identity(raw: &str) -> Identity {
    Identity::parse(raw).unwrap()
}

fn spin(who: &Identity, at: DateTime<Utc>) -> SpinRecord {
    SpinRecord {
        identity: who.clone(),
        prize: Prize::Combo,
        angle: 1234.5,
        created_at: at,
    }
}

/// Insert a spin with no cap
async fn put_spin(store: &Arc<dyn Store>, record: SpinRecord) {
    let since = record.created_at - TimeDelta::days(1);
    assert!(store.insert_spin_within(record, since, u32::MAX).await.unwrap());
}

fn claim(who: &Identity, serial: u64, at: DateTime<Utc>) -> ClaimRecord {
    ClaimRecord {
        identity: who.clone(),
        prize: Prize::Xtudo,
        coupon_serial: serial,
        created_at: at,
    }
}

#[tokio::test]
async fn test_count_events_is_inclusive_of_since() {
    for (name, store) in all_stores().await {
        let who = identity("11988887777");
        put_spin(&store, spin(&who, t0())).await;
        put_spin(&store, spin(&who, t0() + TimeDelta::hours(1))).await;

        assert_eq!(
            store.count_events(&who, EventKind::Spin, t0()).await.unwrap(),
            2,
            "{name}: event exactly at since must count"
        );
        assert_eq!(
            store
                .count_events(&who, EventKind::Spin, t0() + TimeDelta::milliseconds(1))
                .await
                .unwrap(),
            1,
            "{name}: older event must not count"
        );
        assert_eq!(
            store.count_events(&who, EventKind::Claim, t0()).await.unwrap(),
            0,
            "{name}: spins are not claims"
        );
    }
}

#[tokio::test]
async fn test_counts_are_per_identity() {
    for (name, store) in all_stores().await {
        let alice = identity("11988887777");
        let bob = identity("21977776666");
        put_spin(&store, spin(&alice, t0())).await;

        assert_eq!(
            store.count_events(&bob, EventKind::Spin, t0()).await.unwrap(),
            0,
            "{name}"
        );
    }
}

#[tokio::test]
async fn test_earliest_event() {
    for (name, store) in all_stores().await {
        let who = identity("11988887777");
        assert_eq!(
            store.earliest_event(&who, EventKind::Spin, t0()).await.unwrap(),
            None,
            "{name}: no events yet"
        );

        put_spin(&store, spin(&who, t0() + TimeDelta::hours(2))).await;
        put_spin(&store, spin(&who, t0() + TimeDelta::hours(1))).await;
        put_spin(&store, spin(&who, t0() - TimeDelta::hours(1))).await;

        assert_eq!(
            store.earliest_event(&who, EventKind::Spin, t0()).await.unwrap(),
            Some(t0() + TimeDelta::hours(1)),
            "{name}"
        );
    }
}

#[tokio::test]
async fn test_spin_guard_enforces_cap() {
    for (name, store) in all_stores().await {
        let who = identity("11988887777");
        let since = t0() - TimeDelta::hours(12);

        for minutes in 0..4 {
            assert!(
                store
                    .insert_spin_within(spin(&who, t0() + TimeDelta::minutes(minutes)), since, 4)
                    .await
                    .unwrap(),
                "{name}: spin {minutes} should be accepted"
            );
        }
        assert!(
            !store
                .insert_spin_within(spin(&who, t0() + TimeDelta::minutes(5)), since, 4)
                .await
                .unwrap(),
            "{name}: cap reached"
        );
        assert_eq!(
            store.count_events(&who, EventKind::Spin, since).await.unwrap(),
            4,
            "{name}"
        );
    }
}

#[tokio::test]
async fn test_coupon_counter_starts_at_zero_and_increments() {
    for (name, store) in all_stores().await {
        assert_eq!(store.last_coupon_serial().await.unwrap(), 0, "{name}");
        assert_eq!(store.next_coupon_serial().await.unwrap(), 1, "{name}");
        assert_eq!(store.next_coupon_serial().await.unwrap(), 2, "{name}");
        assert_eq!(store.last_coupon_serial().await.unwrap(), 2, "{name}");
    }
}

#[tokio::test]
async fn test_concurrent_serials_are_distinct() {
    for (name, store) in all_stores().await {
        let mut handles = Vec::new();
        for _ in 0..40 {
            let store = store.clone();
            handles.push(tokio::spawn(
                async move { store.next_coupon_serial().await },
            ));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            let serial = handle.await.unwrap().unwrap();
            assert!(seen.insert(serial), "{name}: serial {serial} issued twice");
        }

        assert_eq!(seen.len(), 40, "{name}");
        assert_eq!(store.last_coupon_serial().await.unwrap(), 40, "{name}");
    }
}

#[tokio::test]
async fn test_claim_guard_enforces_limit() {
    for (name, store) in all_stores().await {
        let who = identity("11988887777");
        let since = t0() - TimeDelta::hours(12);

        for serial in 1..=3 {
            assert!(
                store
                    .insert_claim_within(claim(&who, serial, t0()), since, 3)
                    .await
                    .unwrap(),
                "{name}: claim {serial} should be accepted"
            );
        }

        assert!(
            !store
                .insert_claim_within(claim(&who, 4, t0()), since, 3)
                .await
                .unwrap(),
            "{name}: fourth claim should be rejected"
        );
        assert_eq!(
            store.count_events(&who, EventKind::Claim, since).await.unwrap(),
            3,
            "{name}"
        );

        // A later window no longer sees the earlier claims
        let tomorrow = t0() + TimeDelta::days(1);
        assert!(
            store
                .insert_claim_within(claim(&who, 5, tomorrow), tomorrow, 3)
                .await
                .unwrap(),
            "{name}: new window should accept"
        );
    }
}

#[tokio::test]
async fn test_contact_upsert() {
    for (name, store) in all_stores().await {
        let who = identity("11988887777");
        assert!(store.find_contact(&who).await.unwrap().is_none(), "{name}");

        assert!(
            store.upsert_contact(&who, "Maria", t0()).await.unwrap(),
            "{name}: first registration is new"
        );

        let later = t0() + TimeDelta::minutes(5);
        assert!(
            !store.upsert_contact(&who, "Maria Souza", later).await.unwrap(),
            "{name}: second registration is an update"
        );

        let contact = store.find_contact(&who).await.unwrap().unwrap();
        assert_eq!(contact.identity, who, "{name}");
        assert_eq!(contact.name, "Maria Souza", "{name}");
        assert_eq!(contact.created_at, t0(), "{name}");
        assert_eq!(contact.updated_at, later, "{name}");
    }
}
