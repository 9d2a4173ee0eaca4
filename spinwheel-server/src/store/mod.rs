//! Store abstraction and backend factory
//!
//! Every service operation is a short sequence of calls against a [`Store`].
//! The store owns all state: spin, claim and contact records plus the coupon
//! counter singleton. Handlers keep nothing between requests, so any number
//! of server instances may share one store.
//!
//! # Backends
//!
//! ## Memory
//! - A single actor task owns a [`MemoryLedger`](spinwheel::MemoryLedger)
//! - Each store call is one message, so each call is atomic
//! - Not durable: state is lost when the process exits
//! - Best for: development, tests, single-instance demos
//!
//! ## SQLite
//! - sqlx connection pool over a SQLite database file (WAL journal)
//! - Counter increments are a single `UPDATE ... RETURNING` statement
//! - Best for: production deployments

pub mod memory;
pub mod sqlite;

#[cfg(test)]
mod store_test_suite;

use crate::config::{StoreConfig, StoreType};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spinwheel::{ClaimRecord, Contact, EventKind, Identity, MemoryLedger, SpinRecord};
use std::sync::Arc;

pub use memory::{LedgerActor, LedgerHandle};
pub use sqlite::SqliteStore;

/// Shared persistent state behind the spin, claim and registration services
///
/// Implementations must make each individual method atomic. Sequences of
/// calls made by one handler are not isolated from other handlers; the only
/// cross-step guarantees are the ones built into
/// [`next_coupon_serial`](Store::next_coupon_serial) and the guarded inserts
/// [`insert_spin_within`](Store::insert_spin_within) and
/// [`insert_claim_within`](Store::insert_claim_within).
#[async_trait]
pub trait Store: Send + Sync {
    /// Count `kind` events for `identity` with a timestamp at or after `since`
    async fn count_events(
        &self,
        identity: &Identity,
        kind: EventKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Timestamp of the oldest `kind` event at or after `since`
    async fn earliest_event(
        &self,
        identity: &Identity,
        kind: EventKind,
        since: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Append a spin record if its owner has fewer than `cap` spins since
    /// `since`, as one indivisible step
    ///
    /// Returns `false` when the guard rejected the record.
    async fn insert_spin_within(
        &self,
        record: SpinRecord,
        since: DateTime<Utc>,
        cap: u32,
    ) -> Result<bool, StoreError>;

    /// Append a claim record if its owner has fewer than `limit` claims since
    /// `since`, as one indivisible step
    ///
    /// Returns `false` when the guard rejected the record.
    async fn insert_claim_within(
        &self,
        record: ClaimRecord,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<bool, StoreError>;

    /// Atomically increment the coupon counter and return the new value
    ///
    /// Never implemented as a read followed by a write: two callers must
    /// never observe the same value.
    async fn next_coupon_serial(&self) -> Result<u64, StoreError>;

    /// Current coupon counter value, `0` before the first claim
    async fn last_coupon_serial(&self) -> Result<u64, StoreError>;

    /// Insert or rename a contact; returns `true` if the identity was new
    async fn upsert_contact(
        &self,
        identity: &Identity,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Look up a registered contact
    async fn find_contact(&self, identity: &Identity) -> Result<Option<Contact>, StoreError>;
}

/// Create the configured store backend
///
/// # Parameters
///
/// - `config`: Store configuration specifying the backend and its parameters
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig {
///     store_type: StoreType::Sqlite,
///     database_url: "sqlite://spinwheel.db".into(),
///     // ... other fields
/// };
/// let store = create_store(&config).await?;
/// ```
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn Store>, StoreError> {
    match config.store_type {
        StoreType::Memory => {
            let ledger = MemoryLedger::with_capacity(config.capacity);
            Ok(Arc::new(LedgerActor::spawn(config.buffer_size, ledger)))
        }
        StoreType::Sqlite => {
            let store = SqliteStore::connect(&config.database_url, config.max_connections).await?;
            Ok(Arc::new(store))
        }
    }
}
