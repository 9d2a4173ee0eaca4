//! Transport layer for the promotion service
//!
//! Transports accept client connections, translate requests into
//! [`WheelService`] calls and report every call to [`Metrics`].
//!
//! # Available Transports
//!
//! - [`http`]: REST API with JSON, consumed by the wheel web page

pub mod http;

#[cfg(test)]
mod http_test;

use crate::metrics::Metrics;
use crate::service::WheelService;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for all transport implementations
#[async_trait]
pub trait Transport {
    /// Bind and serve until an error occurs or the server shuts down
    async fn start(self, service: WheelService, metrics: Arc<Metrics>) -> Result<()>;
}
