//! # Spinwheel
//!
//! Prize allocation core for "spin-to-win" promotions.
//!
//! ## Overview
//!
//! A participant, identified only by a normalized phone number, spins a wheel
//! and wins one of a small set of coupons. This crate holds the pure domain
//! logic behind that flow:
//!
//! - **Identity normalization**: one canonical key per phone number
//! - **Weighted draws**: a fixed catalog of prizes with percentage weights
//! - **Landing angles**: a cosmetic angle that always agrees with the prize
//! - **Quota windows**: rolling windows for spins, calendar days for claims
//! - **In-memory ledger**: spin, claim and contact records plus the coupon counter
//!
//! Networking, persistence and async runtimes live in `spinwheel-server`.
//!
//! ## Quick Start
//!
//! ```
//! use spinwheel::{Identity, PrizeCatalog, WheelLayout};
//!
//! let catalog = PrizeCatalog::default();
//! let layout = WheelLayout::default();
//! let mut rng = rand::thread_rng();
//!
//! let identity = Identity::parse("(21) 99999-8888").unwrap();
//! let prize = catalog.draw(&mut rng);
//! let angle = layout.angle_for(&catalog, prize, &mut rng).unwrap();
//!
//! assert_eq!(identity.as_str(), "5521999998888");
//! assert_eq!(layout.sector_at(angle), catalog.sector_of(prize).unwrap());
//! ```
//!
//! ## Quota Windows
//!
//! Quotas count events since a window start. Spins use a rolling window and
//! claims use the local calendar day:
//!
//! ```
//! use spinwheel::{Quota, QuotaWindow};
//! use chrono::{TimeZone, Utc};
//!
//! let spins = Quota::new(3, QuotaWindow::sliding_hours(12));
//! let claims = Quota::new(3, QuotaWindow::calendar_day(-180)?);
//!
//! let now = Utc.with_ymd_and_hms(2025, 3, 10, 1, 30, 0).unwrap();
//! assert_eq!(spins.window.start(now), Utc.with_ymd_and_hms(2025, 3, 9, 13, 30, 0).unwrap());
//! // 01:30 UTC is 22:30 on the 9th at -03:00
//! assert_eq!(claims.window.start(now), Utc.with_ymd_and_hms(2025, 3, 9, 3, 0, 0).unwrap());
//! # Ok::<(), spinwheel::WheelError>(())
//! ```
//!
//! ## Features
//!
//! - `ahash` (default): Use AHash for the in-memory ledger maps

pub mod core;

pub use core::{
    COUNTRY_CODE, ClaimRecord, Contact, Event, EventKind, Identity, MemoryLedger, Prize,
    PrizeCatalog, PrizeEntry, Quota, QuotaWindow, SpinRecord, WheelError, WheelLayout,
    normalize_name,
};
