use super::{QuotaTracker, Rules};
use crate::error::{QuotaKind, Result, ServiceError};
use crate::store::Store;
use chrono::{DateTime, Utc};
use spinwheel::{ClaimRecord, Identity, Prize};
use std::sync::Arc;

/// Result of a redeemed claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub prize: Prize,
    pub coupon_serial: u64,
    /// Human-readable coupon, e.g. `TOP-007`
    pub coupon_code: String,
}

/// Format a coupon serial with the configured prefix
///
/// ```
/// use spinwheel_server::service::coupon_code;
///
/// assert_eq!(coupon_code("TOP", 7), "TOP-007");
/// assert_eq!(coupon_code("TOP", 1234), "TOP-1234");
/// ```
pub fn coupon_code(prefix: &str, serial: u64) -> String {
    format!("{prefix}-{serial:03}")
}

/// Issues coupon serials for won prizes within the daily claim quota
#[derive(Clone)]
pub struct ClaimIssuer {
    store: Arc<dyn Store>,
    tracker: QuotaTracker,
    rules: Arc<Rules>,
}

impl ClaimIssuer {
    pub fn new(store: Arc<dyn Store>, rules: Arc<Rules>) -> Self {
        ClaimIssuer {
            tracker: QuotaTracker::new(store.clone()),
            store,
            rules,
        }
    }

    /// Redeem `prize_code` for `identity`
    ///
    /// The claim is recorded only if the store still sees fewer than the
    /// daily limit when the record is written; the serial allocated before
    /// that guard is consumed either way.
    pub async fn claim(
        &self,
        identity: &Identity,
        prize_code: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let prize = self.parse_prize(prize_code)?;
        let quota = &self.rules.claim_quota;

        self.tracker
            .check(identity, QuotaKind::Claim, quota, now)
            .await?;

        let coupon_serial = self.store.next_coupon_serial().await?;

        let record = ClaimRecord {
            identity: identity.clone(),
            prize,
            coupon_serial,
            created_at: now,
        };
        let recorded = self
            .store
            .insert_claim_within(record, quota.window.start(now), quota.limit)
            .await?;

        if !recorded {
            tracing::warn!(
                identity = %identity,
                coupon_serial,
                "Concurrent claim filled the daily quota, serial discarded"
            );
            return Err(ServiceError::QuotaExceeded {
                kind: QuotaKind::Claim,
                retry_at: quota.window.reopens_at(now, None),
            });
        }

        let coupon_code = coupon_code(&self.rules.coupon_prefix, coupon_serial);
        tracing::info!(identity = %identity, %prize, %coupon_code, "Claim issued");

        Ok(ClaimOutcome {
            prize,
            coupon_serial,
            coupon_code,
        })
    }

    fn parse_prize(&self, code: &str) -> Result<Prize> {
        if code.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("prize is required".into()));
        }
        let prize: Prize = code.parse()?;
        if !self.rules.catalog.contains(prize) {
            return Err(ServiceError::InvalidArgument(format!(
                "prize {prize} is not offered"
            )));
        }
        Ok(prize)
    }
}
