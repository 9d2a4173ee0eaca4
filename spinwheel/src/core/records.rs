//! Persisted record types
//!
//! Spin and claim records are append-only: created once, never updated or
//! deleted by the service.

use super::{Identity, Prize};
use chrono::{DateTime, Utc};

/// Kinds of events counted against quotas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Spin,
    Claim,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Spin => "spin",
            EventKind::Claim => "claim",
        }
    }
}

/// A completed spin
#[derive(Debug, Clone, PartialEq)]
pub struct SpinRecord {
    pub identity: Identity,
    pub prize: Prize,
    /// Presentational landing angle, in degrees including extra rotations
    pub angle: f64,
    pub created_at: DateTime<Utc>,
}

/// A redeemed coupon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    pub identity: Identity,
    pub prize: Prize,
    pub coupon_serial: u64,
    pub created_at: DateTime<Utc>,
}

/// Contact directory entry written at registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub identity: Identity,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Anything with an owner and a timestamp that quotas can count
pub trait Event {
    fn identity(&self) -> &Identity;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Event for SpinRecord {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Event for ClaimRecord {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
