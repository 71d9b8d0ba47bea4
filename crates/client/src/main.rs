//! `scenaria-client` -- headless session runner.
//!
//! Opens a session against the simulation backend, logs every session
//! event, and shuts the poller down cleanly on Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default                 | Description                         |
//! |------------------------|----------|-------------------------|-------------------------------------|
//! | `BACKEND_URL`          | no       | `http://localhost:8080` | Base URL of the REST backend        |
//! | `POLL_INTERVAL_MS`     | no       | `1000`                  | Milliseconds between simulation polls |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`                    | Per-request HTTP timeout            |
//! | `SCENARIO_ID`          | no       | --                      | Scenario to open                    |
//! | `SCENARIO_NAME`        | no       | `Scenario`              | Name for a newly created scenario   |

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scenaria_client::{ClientConfig, Session, SessionEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scenaria_client=info,scenaria_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        backend_url = %config.backend_url,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Starting scenaria-client",
    );

    let session = Session::initialize(config)
        .await
        .context("Failed to initialize session")?;

    if let Some(scenario) = session.scenario().await {
        tracing::info!(
            scenario_id = scenario.id,
            name = %scenario.name,
            phases = scenario.phases.len(),
            events = scenario.event_count(),
            "Scenario open",
        );
    }

    let mut events = session.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received");
                break;
            }
            received = events.recv() => match received {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Session event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.shutdown().await;
    Ok(())
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::StatusChanged {
            simulation_id,
            status,
        } => tracing::info!(simulation_id = ?simulation_id, %status, "Simulation status changed"),
        SessionEvent::CursorMoved {
            simulation_id,
            point_in_time,
            cursor,
        } => tracing::debug!(simulation_id, point_in_time, cursor, "Playback cursor moved"),
        SessionEvent::EventsPlayed {
            simulation_id,
            event_ids,
        } => tracing::info!(simulation_id, ?event_ids, "Events played"),
        SessionEvent::PollFailed {
            simulation_id,
            error,
        } => tracing::warn!(simulation_id, %error, "Simulation poll failed"),
        SessionEvent::CacheUpdated(scope) => tracing::debug!(?scope, "Cache updated"),
    }
}
