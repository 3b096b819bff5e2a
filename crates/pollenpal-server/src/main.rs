mod api;
mod middleware;
mod registry;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
    registry::EntryRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = pollenpal_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let http = pollenpal_client::build_http_client(config.request_timeout_secs, &config.user_agent)?;
    let registry = Arc::new(EntryRegistry::new(
        http,
        &config.default_api_url,
        Duration::from_secs(config.scan_interval_secs),
    ));

    if let Some(path) = &config.entries_path {
        let endpoints = pollenpal_core::load_entries(path, &config.default_api_url)?;
        for endpoint in endpoints {
            registry.restore(endpoint).await?;
        }
        tracing::info!(path = %path.display(), "restored entries from file");
    }

    let auth = AuthState::new(&config.api_keys);
    let app = build_app(
        AppState {
            registry: Arc::clone(&registry),
        },
        auth,
    );

    tracing::info!(
        env = %config.env,
        bind_addr = %config.bind_addr,
        scan_interval_secs = config.scan_interval_secs,
        "pollenpal server starting"
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.clear().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
