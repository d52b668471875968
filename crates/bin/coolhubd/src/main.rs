//! # coolhubd — coolhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize tracing
//! - Initialize the `SQLite` connection pool and run migrations
//! - Build the virtual device gateway, the log event bus and the coordinator
//! - Restore the saved configuration and drive gateway events through the runner
//! - Build the axum router and serve
//! - On SIGTERM/SIGINT, destroy every listener and stop serving, ending open log streams
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use coolhub_adapter_http_axum::state::AppState;
use coolhub_adapter_storage_sqlite_sqlx::{Config as StorageConfig, SqliteSettingStore};
use coolhub_adapter_virtual::VirtualGateway;
use coolhub_app::coordinator::Coordinator;
use coolhub_app::event_bus::InProcessEventBus;
use coolhub_app::runner;
use coolhub_app::services::LogHistory;

use crate::config::Config;

/// Log events buffered per subscriber before it starts lagging.
const EVENT_BUS_CAPACITY: usize = 256;

/// How long pending log events may take to reach the history on exit.
const HISTORY_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter)?;

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let store = SqliteSettingStore::new(db.pool().clone());

    // Devices
    let gateway = Arc::new(
        VirtualGateway::new(
            config.virtual_devices.outdoor_temperature,
            &config.virtual_devices.thermostats,
        )
        .context("invalid virtual devices")?,
    );
    if config.virtual_devices.simulate_weather {
        let gateway = Arc::clone(&gateway);
        let period = Duration::from_secs(config.virtual_devices.weather_period_secs);
        let (low, high) = (
            config.virtual_devices.weather_low,
            config.virtual_devices.weather_high,
        );
        tokio::spawn(async move { gateway.simulate_weather(period, low, high).await });
    }

    // Log events
    let event_bus = Arc::new(InProcessEventBus::new(EVENT_BUS_CAPACITY));
    let history = Arc::new(
        LogHistory::load(store.clone())
            .await
            .context("failed to load log history")?,
    );
    let history_task = {
        let history = Arc::clone(&history);
        let events = event_bus.subscribe();
        tokio::spawn(async move { history.run(events).await })
    };

    // Coordinator
    let (sink, gateway_events) = mpsc::unbounded_channel();
    let mut coordinator = Coordinator::new(gateway, store, Arc::clone(&event_bus), sink)
        .await
        .context("failed to load thresholds")?;
    coordinator
        .start()
        .await
        .context("failed to start coordinator")?;
    let coordinator = Arc::new(Mutex::new(coordinator));

    // Shutdown
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.cancel();
        });
    }
    let runner_task = tokio::spawn(runner::run(
        Arc::clone(&coordinator),
        gateway_events,
        shutdown.clone().cancelled_owned(),
    ));

    // HTTP
    let state = AppState::new(coordinator, history, event_bus, shutdown.clone());
    let app = coolhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "coolhubd listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;

    // Also reached when serving fails; the runner still reverts every setpoint.
    shutdown.cancel();
    runner_task.await.context("runner task failed")?;
    served.context("server error")?;
    if tokio::time::timeout(HISTORY_FLUSH_TIMEOUT, history_task)
        .await
        .is_err()
    {
        tracing::warn!("log history did not flush in time");
    }
    tracing::info!("coolhubd stopped");

    Ok(())
}

fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter).context("invalid log filter")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
