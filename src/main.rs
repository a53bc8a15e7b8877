/// Gateway entry point
use space_explorer::config::AppConfig;
use space_explorer::handlers::AppState;
use space_explorer::middleware::FixedWindowLimiter;
use space_explorer::routes::{build_router, Policies};
use space_explorer::services::GatewayService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");
    info!(
        "NASA API key: {}",
        if config.uses_demo_key() {
            "demo (limited)"
        } else {
            "custom"
        }
    );

    let gateway = GatewayService::from_config(&config)?;
    let state = AppState::new(gateway);
    let policies = Policies::from_config(&config);

    start_limiter_cleanup(
        policies.limiter.clone(),
        Duration::from_secs(config.rate_limit.window_seconds),
    );

    let app = build_router(state, &policies);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("space_explorer gateway listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Gateway stopped");
    Ok(())
}

/// Forget clients whose window has rolled over
fn start_limiter_cleanup(limiter: Arc<FixedWindowLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let removed = limiter.prune(Instant::now());
            debug!("rate limiter pruned {} idle clients", removed);
        }
    });
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
