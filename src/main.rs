//! Service binary: wire up logging, config, metrics and the listener.

use std::sync::Arc;
use tracing::info;

use vitals::logging::{self, LogFormat};
use vitals::{build_router, AppState, ServerConfig, ServiceMetrics, SystemSampler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    let (format, default_filter) = if config.debug {
        (LogFormat::Pretty, "debug")
    } else {
        (LogFormat::from_env(), "info")
    };
    logging::init(format, default_filter)?;

    // A conflicting metric namespace must keep the process from starting.
    let metrics = ServiceMetrics::register()?;
    let sampler = Arc::new(SystemSampler::new());
    let app = build_router(AppState::new(metrics, sampler));

    let addr = config.bind_addr();
    info!(address = %addr, debug = config.debug, "vitals listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
