/// MatchCast Live: fixture + prediction hub
///
/// What it does:
///   1. Scrapes today's fixtures from the configured listing sites (TTL cache,
///      static fallback set when nothing parses)
///   2. Serves fixtures, predictions, history and ensemble weights over HTTP
///   3. Re-warms the cache in the background every TTL
///
/// Run:
///   cargo run --bin matchcast-hub

use anyhow::{Context, Result};
use dotenv::dotenv;
use logger::EventLogger;
use match_api::{router, AppConfig, AppState};
use std::env;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    // Single instance lock
    let lock_file_path = env::temp_dir().join("matchcast_hub.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of matchcast-hub is already running! Exiting.");
            return Ok(());
        }
    };

    let config = AppConfig::from_env();
    info!(
        "cache ttl={}s, fetch timeout={}ms, trials={}, logs={}",
        config.cache_ttl.as_secs(),
        config.fetch_timeout.as_millis(),
        config.sim_trials,
        config.log_dir.display()
    );
    for source in config.sources() {
        info!("source {} -> {}", source.id, source.url);
    }

    let events = Arc::new(EventLogger::new(&config.log_dir));
    let state = AppState::from_config(&config, events)?;

    // Background warm refresh
    {
        let cache = Arc::clone(&state.cache);
        tokio::spawn(async move {
            // First tick fires immediately, so startup also warms the cache.
            let mut tick = tokio::time::interval(cache.ttl().max(Duration::from_secs(1)));
            loop {
                tick.tick().await;
                let snap = cache.refresh(false).await;
                info!(
                    "warm refresh: {} fixtures ({}) {}",
                    snap.fixtures.len(),
                    snap.origin.as_str(),
                    snap.message
                );
            }
        });
    }

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {} failed", config.bind))?;
    info!("matchcast-hub listening on http://{}", config.bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown requested");
        })
        .await
        .context("http server stopped")?;

    Ok(())
}
