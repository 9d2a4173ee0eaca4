//! # Spinwheel Server
//!
//! Backend of a spin-to-win promotion. Participants register with a phone
//! number, spin a prize wheel a few times per day and redeem what they win
//! for sequentially numbered coupons.
//!
//! ## What it enforces
//!
//! - **Spin quota**: at most 3 spins in any trailing 12 hours per participant
//! - **Claim quota**: at most 3 coupons per local calendar day per participant
//! - **Unique coupons**: every claim gets a serial from one shared counter;
//!   two claims never receive the same number
//! - **Fair prizes**: prizes are drawn server-side from a weighted catalog and
//!   the returned landing angle always points at the drawn prize
//!
//! ## Quick Start
//!
//! ```bash
//! # Show all available options
//! spinwheel --help
//!
//! # In-memory store on port 8080
//! spinwheel --http-port 8080
//!
//! # Durable SQLite store
//! spinwheel --store sqlite --database-url sqlite://spinwheel.db
//!
//! # List all available environment variables
//! spinwheel --list-env-vars
//! ```
//!
//! ## HTTP API
//!
//! ```bash
//! curl -X POST http://localhost:8080/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Ana Paula", "phone": "21999998888"}'
//!
//! curl -X POST http://localhost:8080/spin \
//!   -H "Content-Type: application/json" \
//!   -d '{"identity": "21999998888"}'
//!
//! curl -X POST http://localhost:8080/claim \
//!   -H "Content-Type: application/json" \
//!   -d '{"identity": "21999998888", "prize": "COMBO"}'
//! ```
//!
//! See [`transport::http`] for the full route table and error codes.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────┐
//!                    │    HTTP     │
//!                    │  Transport  │
//!                    └──────┬──────┘
//!                           │
//!                    ┌──────▼──────┐
//!                    │ WheelService│
//!                    │ register    │
//!                    │ spin, claim │
//!                    │ status      │
//!                    └──────┬──────┘
//!                           │
//!              ┌────────────┴────────────┐
//!        ┌─────▼─────┐             ┌─────▼─────┐
//!        │  Memory   │             │  SQLite   │
//!        │  (actor)  │             │  (sqlx)   │
//!        └───────────┘             └───────────┘
//! ```
//!
//! Handlers hold no state between requests. All records and the coupon
//! counter live in the store, so several server instances can share one
//! SQLite database.

pub mod config;
pub mod error;
pub mod metrics;
pub mod service;
pub mod store;
pub mod transport;
pub mod types;
