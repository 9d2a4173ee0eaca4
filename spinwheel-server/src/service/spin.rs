use super::{QuotaTracker, Rules};
use crate::error::{QuotaKind, Result, ServiceError};
use crate::store::Store;
use chrono::{DateTime, Utc};
use rand::Rng;
use spinwheel::{Identity, Prize, SpinRecord};
use std::sync::Arc;

/// Spins a racing burst may record beyond the quota limit
const SPIN_RACE_SLACK: u32 = 1;

/// Result of a granted spin
#[derive(Debug, Clone, PartialEq)]
pub struct SpinOutcome {
    pub prize: Prize,
    /// Landing angle in degrees, including whole extra rotations
    pub angle: f64,
    /// Claims already redeemed today; informational only
    pub claimed_today: u64,
}

/// Grants spins within the sliding quota and records them
#[derive(Clone)]
pub struct SpinAllocator {
    store: Arc<dyn Store>,
    tracker: QuotaTracker,
    rules: Arc<Rules>,
}

impl SpinAllocator {
    pub fn new(store: Arc<dyn Store>, rules: Arc<Rules>) -> Self {
        SpinAllocator {
            tracker: QuotaTracker::new(store.clone()),
            store,
            rules,
        }
    }

    /// Spin the wheel for `identity`
    ///
    /// Concurrent spins for one identity may both pass the quota check. The
    /// store caps the window at one spin over the limit, and any spin past
    /// that cap is denied like a regular quota hit.
    pub async fn spin(&self, identity: &Identity, now: DateTime<Utc>) -> Result<SpinOutcome> {
        self.tracker
            .check(identity, QuotaKind::Spin, &self.rules.spin_quota, now)
            .await?;

        let claimed_today = self
            .tracker
            .count_events(
                identity,
                QuotaKind::Claim.event_kind(),
                self.rules.claim_quota.window.start(now),
            )
            .await?;

        // ThreadRng is not Send; keep it out of the await points
        let (prize, angle) = {
            let mut rng = rand::thread_rng();
            draw(&self.rules, &mut rng)?
        };

        // Concurrent spins may each pass the check above; the guarded insert
        // bounds how far past the limit they can go
        let record = SpinRecord {
            identity: identity.clone(),
            prize,
            angle,
            created_at: now,
        };
        let quota = &self.rules.spin_quota;
        let recorded = self
            .store
            .insert_spin_within(record, quota.window.start(now), quota.limit + SPIN_RACE_SLACK)
            .await?;
        if !recorded {
            let retry_at = self
                .tracker
                .reopens_at(identity, QuotaKind::Spin, quota, now)
                .await?;
            return Err(ServiceError::QuotaExceeded {
                kind: QuotaKind::Spin,
                retry_at,
            });
        }

        tracing::info!(identity = %identity, %prize, angle, "Spin granted");

        Ok(SpinOutcome {
            prize,
            angle,
            claimed_today,
        })
    }
}

/// Pick a prize and a landing angle inside its sector
pub(crate) fn draw<R: Rng>(rules: &Rules, rng: &mut R) -> Result<(Prize, f64)> {
    let prize = rules.catalog.draw(rng);
    let angle = rules
        .layout
        .angle_for(&rules.catalog, prize, rng)
        .ok_or_else(|| ServiceError::Internal(format!("prize {prize} has no sector")))?;
    Ok((prize, angle))
}
