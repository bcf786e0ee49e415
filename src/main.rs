use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber;

use doorman::admission::{Clock, SlidingWindowLimiter, SystemClock};
use doorman::auth::{MemoryIdentityStore, SessionManager, TokenCodec};
use doorman::config::DoormanConfig;
use doorman::http::{AppState, HttpServer};

#[derive(Parser)]
#[command(version, about = "Request admission and identity service")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting Doorman Admission Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => DoormanConfig::from_file(path)?,
        None => DoormanConfig::default(),
    };
    info!(http_addr = %config.server.http_addr, "Configuration loaded");

    // Initialize the admission controller
    let limiter = Arc::new(SlidingWindowLimiter::new(
        config.admission.capacity,
        Duration::from_secs(config.admission.window_secs),
    ));
    info!(
        capacity = config.admission.capacity,
        window_secs = config.admission.window_secs,
        "Admission controller initialized"
    );

    // Seed the identity store
    let store = Arc::new(MemoryIdentityStore::new());
    for account in &config.auth.demo_accounts {
        let user_id = store.register(&account.email, &account.password, account.role)?;
        info!(user_id = %user_id, email = %account.email, "Seeded demo account");
    }

    let secret = config.auth.resolve_secret();
    let sessions = Arc::new(SessionManager::new(
        TokenCodec::new(&secret),
        store,
        Duration::from_secs(config.auth.access_ttl_minutes * 60),
        Duration::from_secs(config.auth.refresh_ttl_days * 86400),
    ));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Periodically evict clients that stopped sending requests
    let sweep_limiter = Arc::clone(&limiter);
    let sweep_clock = Arc::clone(&clock);
    let sweep_interval = config.admission.sweep_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval));
        interval.tick().await;
        loop {
            interval.tick().await;
            sweep_limiter.sweep(sweep_clock.now());
        }
    });

    let state = AppState {
        limiter,
        sessions,
        clock,
    };
    let server = HttpServer::new(config.server.http_addr, state);

    info!("Starting HTTP server on {}", config.server.http_addr);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Doorman Admission Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
