//! Core components of the spinwheel prize allocation library
//!
//! This module contains the fundamental building blocks:
//! - [`identity`]: Phone number normalization and name validation
//! - [`catalog`]: Prize kinds and the weighted prize catalog
//! - [`wheel`]: Wheel sectors and presentational landing angles
//! - [`window`]: Sliding and calendar quota windows
//! - [`records`]: Spin, claim and contact records
//! - [`ledger`]: In-memory record ledger with the coupon counter

pub mod catalog;
pub mod identity;
pub mod ledger;
pub mod records;
pub mod wheel;
pub mod window;

pub use catalog::{Prize, PrizeCatalog, PrizeEntry};
pub use identity::{COUNTRY_CODE, Identity, normalize_name};
pub use ledger::MemoryLedger;
pub use records::{ClaimRecord, Contact, Event, EventKind, SpinRecord};
pub use wheel::WheelLayout;
pub use window::{Quota, QuotaWindow};

use std::error::Error;
use std::fmt;

/// Errors raised by domain validation
///
/// # Variants
///
/// - [`InvalidIdentity`](WheelError::InvalidIdentity): The phone number cannot be normalized
/// - [`InvalidName`](WheelError::InvalidName): The contact name has the wrong length
/// - [`UnknownPrize`](WheelError::UnknownPrize): The prize code is not a known prize kind
/// - [`InvalidCatalog`](WheelError::InvalidCatalog): Catalog weights or sectors are inconsistent
/// - [`InvalidLayout`](WheelError::InvalidLayout): Wheel geometry is unusable
/// - [`InvalidWindow`](WheelError::InvalidWindow): A quota window cannot be built
/// - [`InvalidQuota`](WheelError::InvalidQuota): A quota limit is unusable
///
/// # Example
///
/// ```
/// use spinwheel::{Identity, WheelError};
///
/// match Identity::parse("12345") {
///     Err(WheelError::InvalidIdentity(raw)) => assert_eq!(raw, "12345"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum WheelError {
    /// The phone number does not normalize to a valid identity
    InvalidIdentity(String),
    /// The trimmed name length (in characters) is out of range
    InvalidName(usize),
    /// The prize code is not recognized
    UnknownPrize(String),
    /// The prize catalog is inconsistent
    InvalidCatalog(String),
    /// The wheel layout is inconsistent
    InvalidLayout(String),
    /// The quota window parameters are out of range
    InvalidWindow(String),
    /// A quota limit is out of range
    InvalidQuota(String),
}

impl fmt::Display for WheelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WheelError::InvalidIdentity(raw) => write!(f, "invalid phone number: {raw:?}"),
            WheelError::InvalidName(len) => {
                write!(f, "name must have between 2 and 60 characters, got {len}")
            }
            WheelError::UnknownPrize(code) => write!(f, "unknown prize: {code:?}"),
            WheelError::InvalidCatalog(msg) => write!(f, "invalid prize catalog: {msg}"),
            WheelError::InvalidLayout(msg) => write!(f, "invalid wheel layout: {msg}"),
            WheelError::InvalidWindow(msg) => write!(f, "invalid quota window: {msg}"),
            WheelError::InvalidQuota(msg) => write!(f, "invalid quota: {msg}"),
        }
    }
}

impl Error for WheelError {}
