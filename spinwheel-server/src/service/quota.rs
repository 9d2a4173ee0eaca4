use crate::error::{QuotaKind, Result, ServiceError};
use crate::store::Store;
use chrono::{DateTime, Utc};
use spinwheel::{EventKind, Identity, Quota, QuotaWindow};
use std::sync::Arc;

impl QuotaKind {
    pub fn event_kind(&self) -> EventKind {
        match self {
            QuotaKind::Spin => EventKind::Spin,
            QuotaKind::Claim => EventKind::Claim,
        }
    }
}

/// Snapshot of one participant's use of one quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaUsage {
    pub used: u64,
    pub remaining: u64,
    pub window_start: DateTime<Utc>,
    /// When another event will be allowed, if the quota is exhausted
    pub reopens_at: Option<DateTime<Utc>>,
}

/// Counts persisted events against a [`Quota`]
///
/// Pure reads: the tracker never writes to the store.
#[derive(Clone)]
pub struct QuotaTracker {
    store: Arc<dyn Store>,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn Store>) -> Self {
        QuotaTracker { store }
    }

    /// Number of `kind` events for `identity` at or after `window_start`
    pub async fn count_events(
        &self,
        identity: &Identity,
        kind: EventKind,
        window_start: DateTime<Utc>,
    ) -> Result<u64> {
        Ok(self.store.count_events(identity, kind, window_start).await?)
    }

    /// Current usage of `quota`, including when it reopens if exhausted
    pub async fn usage(
        &self,
        identity: &Identity,
        kind: QuotaKind,
        quota: &Quota,
        now: DateTime<Utc>,
    ) -> Result<QuotaUsage> {
        let window_start = quota.window.start(now);
        let used = self
            .count_events(identity, kind.event_kind(), window_start)
            .await?;

        let reopens_at = if quota.is_exhausted(used) {
            Some(self.reopens_at(identity, kind, quota, now).await?)
        } else {
            None
        };

        Ok(QuotaUsage {
            used,
            remaining: quota.remaining(used),
            window_start,
            reopens_at,
        })
    }

    /// Fail with [`ServiceError::QuotaExceeded`] if `quota` is exhausted
    pub async fn check(
        &self,
        identity: &Identity,
        kind: QuotaKind,
        quota: &Quota,
        now: DateTime<Utc>,
    ) -> Result<QuotaUsage> {
        let usage = self.usage(identity, kind, quota, now).await?;
        match usage.reopens_at {
            Some(retry_at) => Err(ServiceError::QuotaExceeded { kind, retry_at }),
            None => Ok(usage),
        }
    }

    /// When `quota` frees a slot again
    ///
    /// Only sliding windows need the oldest counted event.
    pub async fn reopens_at(
        &self,
        identity: &Identity,
        kind: QuotaKind,
        quota: &Quota,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let earliest = match quota.window {
            QuotaWindow::Sliding(_) => {
                self.store
                    .earliest_event(identity, kind.event_kind(), quota.window.start(now))
                    .await?
            }
            QuotaWindow::CalendarDay(_) => None,
        };
        Ok(quota.window.reopens_at(now, earliest))
    }
}
