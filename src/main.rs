use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use taxedu_api::backend::RestBackend;
use taxedu_api::config::config;
use taxedu_api::middleware::RouteGuard;
use taxedu_api::router::build_router;
use taxedu_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up BACKEND_URL and the keys
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taxedu_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    config.validate()?;
    tracing::info!("Starting TaxEdu API in {:?} mode", config.environment);

    let timeout = Duration::from_secs(config.backend.timeout_secs);
    let service_backend = Arc::new(RestBackend::new(
        &config.backend.url,
        config.backend.service_role_key.clone(),
        timeout,
    )?);
    let anon_backend = Arc::new(RestBackend::new(
        &config.backend.url,
        config.backend.anon_key.clone(),
        timeout,
    )?);

    let state = AppState::from_backend(service_backend);
    let guard = RouteGuard::new(anon_backend, config.guard.clone());
    let app = build_router(state, guard, config);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("TaxEdu API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
