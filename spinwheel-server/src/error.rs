//! Error taxonomy for the service layer
//!
//! - [`ServiceError::InvalidArgument`]: bad input, never retried (HTTP 400)
//! - [`ServiceError::QuotaExceeded`]: a legitimate business outcome carrying
//!   the time the quota frees up again (HTTP 429)
//! - [`ServiceError::Store`]: the store failed; the whole operation is safe to
//!   retry (HTTP 500)
//! - [`ServiceError::Internal`]: the server itself is misconfigured or a
//!   request task died (HTTP 500)

use chrono::{DateTime, Utc};
use spinwheel::WheelError;
use std::fmt;
use thiserror::Error;

/// Failures reported by a [`Store`](crate::store::Store) backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Which quota was exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaKind {
    Spin,
    Claim,
}

impl QuotaKind {
    /// Stable error code exposed to clients
    pub fn code(&self) -> &'static str {
        match self {
            QuotaKind::Spin => "spin_limit_reached",
            QuotaKind::Claim => "daily_limit_reached",
        }
    }
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaKind::Spin => f.write_str("spin"),
            QuotaKind::Claim => f.write_str("claim"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} quota exceeded, retry at {retry_at}")]
    QuotaExceeded {
        kind: QuotaKind,
        retry_at: DateTime<Utc>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<WheelError> for ServiceError {
    /// Input errors blame the caller; catalog, layout and quota errors are
    /// server configuration faults
    fn from(e: WheelError) -> Self {
        match e {
            WheelError::InvalidIdentity(_)
            | WheelError::InvalidName(_)
            | WheelError::UnknownPrize(_) => ServiceError::InvalidArgument(e.to_string()),
            WheelError::InvalidCatalog(_)
            | WheelError::InvalidLayout(_)
            | WheelError::InvalidWindow(_)
            | WheelError::InvalidQuota(_) => ServiceError::Internal(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_errors_split_by_blame() {
        assert!(matches!(
            ServiceError::from(WheelError::InvalidIdentity("123".into())),
            ServiceError::InvalidArgument(_)
        ));
        assert!(matches!(
            ServiceError::from(WheelError::UnknownPrize("PIZZA".into())),
            ServiceError::InvalidArgument(_)
        ));
        assert!(matches!(
            ServiceError::from(WheelError::InvalidLayout("no sectors".into())),
            ServiceError::Internal(_)
        ));
        assert!(matches!(
            ServiceError::from(WheelError::InvalidQuota("zero".into())),
            ServiceError::Internal(_)
        ));
    }
}
