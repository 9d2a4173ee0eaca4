//! Promotion services
//!
//! - [`Registrar`]: contact directory upserts
//! - [`SpinAllocator`]: sliding spin quota, weighted draw, landing angle
//! - [`ClaimIssuer`]: daily claim quota and coupon serials
//! - [`QuotaTracker`]: the shared "events since `T`" counter behind both quotas
//!
//! [`WheelService`] bundles them over one store and is what transports hold.
//! Handlers are stateless: every call is a short sequence of store operations
//! and any number of service instances may share one store.

mod claim;
mod quota;
mod register;
mod spin;

pub use claim::{ClaimIssuer, ClaimOutcome, coupon_code};
pub use quota::{QuotaTracker, QuotaUsage};
pub use register::{Registrar, Registration};
pub use spin::{SpinAllocator, SpinOutcome};

use crate::error::{QuotaKind, Result};
use crate::store::Store;
use chrono::{DateTime, Offset, Utc};
use spinwheel::{Identity, PrizeCatalog, Quota, QuotaWindow, WheelError, WheelLayout};
use std::sync::Arc;

const DEFAULT_SPIN_LIMIT: u32 = 3;
const DEFAULT_SPIN_WINDOW_HOURS: u32 = 12;
const DEFAULT_CLAIM_LIMIT: u32 = 3;
const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;
const DEFAULT_COUPON_PREFIX: &str = "TOP";

/// Static promotion configuration shared by all services
#[derive(Debug, Clone)]
pub struct Rules {
    pub catalog: PrizeCatalog,
    pub layout: WheelLayout,
    pub spin_quota: Quota,
    pub claim_quota: Quota,
    pub coupon_prefix: String,
}

impl Rules {
    /// Check that every catalog prize can be drawn onto the wheel
    pub fn validate(&self) -> std::result::Result<(), WheelError> {
        self.layout.validate(&self.catalog)?;
        if self.spin_quota.limit == 0 || self.claim_quota.limit == 0 {
            return Err(WheelError::InvalidQuota("quota limit of zero".into()));
        }
        Ok(())
    }
}

impl Default for Rules {
    /// Three spins per 12 hours, three claims per day at UTC-3
    fn default() -> Self {
        let claim_window = QuotaWindow::calendar_day(DEFAULT_UTC_OFFSET_MINUTES)
            .unwrap_or(QuotaWindow::CalendarDay(Utc.fix()));

        Rules {
            catalog: PrizeCatalog::default(),
            layout: WheelLayout::default(),
            spin_quota: Quota::new(
                DEFAULT_SPIN_LIMIT,
                QuotaWindow::sliding_hours(DEFAULT_SPIN_WINDOW_HOURS),
            ),
            claim_quota: Quota::new(DEFAULT_CLAIM_LIMIT, claim_window),
            coupon_prefix: DEFAULT_COUPON_PREFIX.to_string(),
        }
    }
}

/// Read-only view of both quotas for one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantStatus {
    pub identity: Identity,
    pub spins_used: u64,
    pub spins_remaining: u64,
    pub next_spin_at: Option<DateTime<Utc>>,
    pub claims_today: u64,
    pub claims_remaining: u64,
}

/// Facade over the registration, spin, claim and status operations
///
/// Raw identities are normalized here, so every operation keys records the
/// same way.
#[derive(Clone)]
pub struct WheelService {
    store: Arc<dyn Store>,
    rules: Arc<Rules>,
    registrar: Registrar,
    allocator: SpinAllocator,
    issuer: ClaimIssuer,
    tracker: QuotaTracker,
}

impl WheelService {
    pub fn new(store: Arc<dyn Store>, rules: Rules) -> Self {
        let rules = Arc::new(rules);
        WheelService {
            registrar: Registrar::new(store.clone()),
            allocator: SpinAllocator::new(store.clone(), rules.clone()),
            issuer: ClaimIssuer::new(store.clone(), rules.clone()),
            tracker: QuotaTracker::new(store.clone()),
            store,
            rules,
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub async fn register(
        &self,
        name: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        self.registrar.register(name, phone, now).await
    }

    pub async fn spin(&self, raw_identity: &str, now: DateTime<Utc>) -> Result<SpinOutcome> {
        let identity = Identity::parse(raw_identity)?;
        self.allocator.spin(&identity, now).await
    }

    pub async fn claim(
        &self,
        raw_identity: &str,
        prize_code: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let identity = Identity::parse(raw_identity)?;
        self.issuer.claim(&identity, prize_code, now).await
    }

    /// Current quota usage; never writes
    pub async fn status(&self, raw_identity: &str, now: DateTime<Utc>) -> Result<ParticipantStatus> {
        let identity = Identity::parse(raw_identity)?;

        let spins = self
            .tracker
            .usage(&identity, QuotaKind::Spin, &self.rules.spin_quota, now)
            .await?;
        let claims = self
            .tracker
            .usage(&identity, QuotaKind::Claim, &self.rules.claim_quota, now)
            .await?;

        Ok(ParticipantStatus {
            identity,
            spins_used: spins.used,
            spins_remaining: spins.remaining,
            next_spin_at: spins.reopens_at,
            claims_today: claims.used,
            claims_remaining: claims.remaining,
        })
    }

    /// Most recently allocated coupon serial
    pub async fn last_coupon_serial(&self) -> Result<u64> {
        Ok(self.store.last_coupon_serial().await?)
    }
}
