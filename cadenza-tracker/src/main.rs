//! Cadenza Tracker
//!
//! Supervises asynchronous music-generation jobs from submission to durable
//! persistence of their final tracks.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Store: Durable per-owner job lists with atomic read-modify-write
//! - Gateway: HTTP boundary to the status proxy and persistence API
//! - Scheduler: One poller task per active job, driving the state machine
//! - Supervisor: Spawning, cold-start resume, and garbage collection
//!
//! On startup every persisted non-terminal job gets its poller back, so
//! process restarts never silently abandon a generation in flight.

mod config;
mod events;
mod gateway;
mod scheduler;
mod store;
mod supervisor;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::gateway::Gateway;
use crate::store::JobStore;
use crate::supervisor::Supervisor;
use cadenza_client::GatewayClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadenza_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cadenza Tracker");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: gateway_url={}, data_dir={}",
        config.gateway_url,
        config.data_dir.display()
    );

    // Initialize gateway client
    let gateway: Arc<dyn Gateway> = Arc::new(GatewayClient::new(config.gateway_url.clone()));
    info!("Gateway client initialized");

    // Open the job store
    let store = Arc::new(JobStore::open(&config.data_dir).context("Failed to open job store")?);

    // Create the supervisor
    let supervisor = Supervisor::new(store, gateway, config);

    // Surface library-change notifications from accepted saves
    let mut library_events = supervisor.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = library_events.recv().await {
            info!(
                "Library updated for owner {} (task {}, {:?} save)",
                event.owner, event.task_id, event.kind
            );
        }
    });

    // Resume whatever was in flight before the last shutdown
    let resumed = supervisor
        .resume_all()
        .context("Failed to resume persisted jobs")?;
    info!("Resumed {} in-flight job(s)", resumed);

    // Start periodic cleanup of stale terminal jobs
    let _gc_handle = supervisor.spawn_gc_loop();

    info!("Tracker initialized successfully");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(_) => {
            info!("Failed to load config from environment, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
