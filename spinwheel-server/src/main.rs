use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinSet;

use spinwheel_server::config::Config;
use spinwheel_server::metrics::Metrics;
use spinwheel_server::service::WheelService;
use spinwheel_server::store;
use spinwheel_server::transport::{Transport, http::HttpTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("spinwheel_server={}", config.log_level).parse()?)
                .add_directive(format!("spinwheel={}", config.log_level).parse()?),
        )
        .init();

    let rules = config.rules.load()?;
    tracing::info!(
        prizes = rules.catalog.entries().len(),
        sectors = rules.layout.sectors,
        spin_limit = rules.spin_quota.limit,
        claim_limit = rules.claim_quota.limit,
        "Promotion rules loaded"
    );

    let store = store::create_store(&config.store).await?;
    let service = WheelService::new(store, rules);
    let metrics = Arc::new(Metrics::new());

    let mut transport_tasks = JoinSet::new();

    let host = config.http.host.clone();
    let port = config.http.port;
    let transport = HttpTransport::new(&host, port)?;
    transport_tasks.spawn(async move {
        tracing::info!("Starting HTTP transport on {}:{}", host, port);
        transport.start(service, metrics).await
    });

    tracing::info!(
        "Spinwheel server started with store type: {:?}",
        config.store.store_type
    );

    while let Some(result) = transport_tasks.join_next().await {
        match result {
            Ok(Ok(())) => {
                tracing::info!("Transport task completed successfully");
            }
            Ok(Err(e)) => {
                tracing::error!("Transport task failed: {}", e);
                return Err(e);
            }
            Err(e) => {
                tracing::error!("Transport task panicked: {}", e);
                return Err(anyhow::anyhow!("Transport task panicked"));
            }
        }
    }

    Ok(())
}
