//! LAD Server - derived values for the landing-site intake form

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lad_server::api;
use lad_server::config::Config;
use lad_server::elevation::ElevationResolver;
use lad_server::loops;
use lad_server::pipeline::PipelineConfig;
use lad_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive("lad_server=debug".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting LAD Server...");
    tracing::info!(
        "Elevation provider {:?} at {} (timeout {}s, fallback {} m)",
        config.elevation_provider,
        config.elevation_url,
        config.elevation_timeout_s,
        config.elevation_fallback_m
    );

    let resolver = Arc::new(ElevationResolver::from_config(&config));
    let state = Arc::new(AppState::new(resolver, PipelineConfig::from_config(&config)));

    let (shutdown_tx, _) = broadcast::channel(1);
    tokio::spawn(loops::session_expiry_loop::run_session_expiry_loop(
        state.clone(),
        config.session_idle_ttl(),
        config.session_sweep_interval(),
        shutdown_tx.subscribe(),
    ));

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
            let _ = shutdown_tx.send(());
        })
        .await?;

    Ok(())
}
