use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rss_dashboard::cache::TtlCache;
use rss_dashboard::config::Settings;
use rss_dashboard::fetcher::Fetcher;
use rss_dashboard::routes::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rss_dashboard=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings_path =
        std::env::var("DASHBOARD_SETTINGS").unwrap_or_else(|_| "dashboard.toml".to_string());
    let settings = Settings::load(&settings_path)?;
    info!("Loaded settings from {}", settings_path);

    let cache = Arc::new(TtlCache::new(settings.cache_ttl()));
    let fetcher = Arc::new(Fetcher::new(
        cache,
        &settings.user_agent,
        settings.request_timeout(),
    )?);

    let state = Arc::new(AppState::new(fetcher, settings.config_url.clone()));

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Serving at http://{}/demo", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
