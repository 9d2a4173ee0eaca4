use crate::error::StoreError;
use crate::store::Store;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spinwheel::{ClaimRecord, Contact, EventKind, Identity, SpinRecord};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

const COUPON_COUNTER: &str = "coupon_number";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS spins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        identity TEXT NOT NULL,
        prize TEXT NOT NULL,
        angle REAL NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS spins_identity_created_at ON spins (identity, created_at)",
    "CREATE TABLE IF NOT EXISTS claims (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        identity TEXT NOT NULL,
        prize TEXT NOT NULL,
        coupon_serial INTEGER NOT NULL UNIQUE,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS claims_identity_created_at ON claims (identity, created_at)",
    "CREATE TABLE IF NOT EXISTS contacts (
        identity TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS counters (
        key TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    )",
    "INSERT OR IGNORE INTO counters (key, value) VALUES ('coupon_number', 0)",
];

/// SQLite-backed store
///
/// Timestamps are stored as Unix milliseconds so window queries are plain
/// integer comparisons on the `(identity, created_at)` indexes.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct ContactRow {
    identity: String,
    name: String,
    created_at: i64,
    updated_at: i64,
}

impl ContactRow {
    fn into_contact(self) -> Result<Contact, StoreError> {
        let identity = Identity::parse(&self.identity)
            .map_err(|e| StoreError::Corrupt(format!("contact identity: {e}")))?;
        Ok(Contact {
            identity,
            name: self.name,
            created_at: from_millis(self.created_at)?,
            updated_at: from_millis(self.updated_at)?,
        })
    }
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and apply migrations
    ///
    /// An in-memory URL is pinned to a single connection that never expires,
    /// since every new connection would see an empty database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        let store = SqliteStore { pool };
        store.migrate().await?;
        tracing::info!(url, "SQLite store ready");
        Ok(store)
    }

    /// Private in-memory database, mostly useful in tests
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp {millis} out of range")))
}

fn to_serial(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative counter {value}")))
}

#[async_trait]
impl Store for SqliteStore {
    async fn count_events(
        &self,
        identity: &Identity,
        kind: EventKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let sql = match kind {
            EventKind::Spin => "SELECT COUNT(*) FROM spins WHERE identity = ?1 AND created_at >= ?2",
            EventKind::Claim => {
                "SELECT COUNT(*) FROM claims WHERE identity = ?1 AND created_at >= ?2"
            }
        };
        let count: i64 = sqlx::query_scalar(sql)
            .bind(identity.as_str())
            .bind(to_millis(since))
            .fetch_one(&self.pool)
            .await?;
        to_serial(count)
    }

    async fn earliest_event(
        &self,
        identity: &Identity,
        kind: EventKind,
        since: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let sql = match kind {
            EventKind::Spin => {
                "SELECT MIN(created_at) FROM spins WHERE identity = ?1 AND created_at >= ?2"
            }
            EventKind::Claim => {
                "SELECT MIN(created_at) FROM claims WHERE identity = ?1 AND created_at >= ?2"
            }
        };
        let earliest: Option<i64> = sqlx::query_scalar(sql)
            .bind(identity.as_str())
            .bind(to_millis(since))
            .fetch_one(&self.pool)
            .await?;
        earliest.map(from_millis).transpose()
    }

    async fn insert_spin_within(
        &self,
        record: SpinRecord,
        since: DateTime<Utc>,
        cap: u32,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO spins (identity, prize, angle, created_at)
             SELECT ?1, ?2, ?3, ?4
             WHERE (SELECT COUNT(*) FROM spins WHERE identity = ?1 AND created_at >= ?5) < ?6",
        )
        .bind(record.identity.as_str())
        .bind(record.prize.code())
        .bind(record.angle)
        .bind(to_millis(record.created_at))
        .bind(to_millis(since))
        .bind(i64::from(cap))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_claim_within(
        &self,
        record: ClaimRecord,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<bool, StoreError> {
        let serial = i64::try_from(record.coupon_serial)
            .map_err(|_| StoreError::Corrupt(format!("serial {} too large", record.coupon_serial)))?;

        // A single write statement holds the write lock from its first read
        let result = sqlx::query(
            "INSERT INTO claims (identity, prize, coupon_serial, created_at)
             SELECT ?1, ?2, ?3, ?4
             WHERE (SELECT COUNT(*) FROM claims WHERE identity = ?1 AND created_at >= ?5) < ?6",
        )
        .bind(record.identity.as_str())
        .bind(record.prize.code())
        .bind(serial)
        .bind(to_millis(record.created_at))
        .bind(to_millis(since))
        .bind(i64::from(limit))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn next_coupon_serial(&self) -> Result<u64, StoreError> {
        let value: i64 =
            sqlx::query_scalar("UPDATE counters SET value = value + 1 WHERE key = ?1 RETURNING value")
                .bind(COUPON_COUNTER)
                .fetch_one(&self.pool)
                .await?;
        to_serial(value)
    }

    async fn last_coupon_serial(&self) -> Result<u64, StoreError> {
        let value: Option<i64> = sqlx::query_scalar("SELECT value FROM counters WHERE key = ?1")
            .bind(COUPON_COUNTER)
            .fetch_optional(&self.pool)
            .await?;
        to_serial(value.unwrap_or(0))
    }

    async fn upsert_contact(
        &self,
        identity: &Identity,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let inserted = sqlx::query(
            "INSERT INTO contacts (identity, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT (identity) DO NOTHING",
        )
        .bind(identity.as_str())
        .bind(name)
        .bind(to_millis(now))
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            sqlx::query("UPDATE contacts SET name = ?2, updated_at = ?3 WHERE identity = ?1")
                .bind(identity.as_str())
                .bind(name)
                .bind(to_millis(now))
                .execute(&self.pool)
                .await?;
        }

        Ok(inserted)
    }

    async fn find_contact(&self, identity: &Identity) -> Result<Option<Contact>, StoreError> {
        let row: Option<ContactRow> = sqlx::query_as(
            "SELECT identity, name, created_at, updated_at FROM contacts WHERE identity = ?1",
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ContactRow::into_contact).transpose()
    }
}
