use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tsi_chart::auth;
use tsi_chart::chart::{ChartSettings, ChartSurfaces, TsiChart, TsiSdk};
use tsi_chart::common::{AppState, Readiness};
use tsi_chart::config::Config;
use tsi_chart::routes;
use tsi_chart::tsi::TsiClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tsi_chart=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tsi-chart...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        deployment = ?config.deployment,
        host = %config.api_host,
        port = config.api_port,
        tsi_fqdn = %config.tsi_fqdn,
        lookback_days = config.tsi_how_many_days,
        "Configuration loaded"
    );

    let tokens = auth::from_config(&config)?;

    let surfaces = Arc::new(ChartSurfaces::new());
    let surface = surfaces.register(&config.chart_target);

    let sdk = TsiSdk::new(TsiClient::new(&config)?, Arc::clone(&surfaces));
    tracing::info!(target_id = %config.chart_target, "TSI client initialized");

    let chart = Arc::new(TsiChart::new(
        ChartSettings::from_config(&config),
        Arc::new(sdk),
        tokens,
    ));

    let readiness = Readiness::new();
    chart.on_init(&readiness);

    let state = AppState::new(chart, surface, readiness.clone());
    let app = routes::build_router(state);

    // Start server with graceful shutdown
    let addr = config.bind_address();
    tracing::info!(address = %addr, "Starting server");
    let listener = TcpListener::bind(&addr).await?;
    readiness.mark_initialized();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
