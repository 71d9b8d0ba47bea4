//! Simulation poller.
//!
//! While a simulation is running or paused, a background task fetches
//! the scenario's simulations at a fixed interval and reconciles the
//! shared [`Playback`] against the backend's snapshot. The tracked
//! simulation's cache entry follows each snapshot and is removed once
//! the simulation ends. A failed fetch is
//! reported and retried on the next tick. The task exits once the
//! tracked simulation finishes, or when its [`PollHandle`] is cancelled
//! or dropped.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use scenaria_core::cache::EntityCache;
use scenaria_core::models::Simulation;
use scenaria_core::playback::{Playback, SimulationStatus, TickOutcome};
use scenaria_core::types::EntityId;

use crate::api::{ApiError, BackendApi};
use crate::events::{publish, CacheScope, EventSender, SessionEvent};

/// Source of authoritative simulation snapshots.
#[async_trait]
pub trait SimulationFeed: Send + Sync {
    async fn fetch_simulations(&self, scenario_id: EntityId) -> Result<Vec<Simulation>, ApiError>;
}

#[async_trait]
impl SimulationFeed for BackendApi {
    async fn fetch_simulations(&self, scenario_id: EntityId) -> Result<Vec<Simulation>, ApiError> {
        self.list_simulations(scenario_id).await
    }
}

/// Owner of a running poll task. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `true` once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait for the task to exit. Does not cancel it.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Simulation poller task failed");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start polling `scenario_id` every `interval`.
///
/// The first fetch happens one interval after spawning.
pub fn spawn_poller(
    feed: Arc<dyn SimulationFeed>,
    playback: Arc<RwLock<Playback>>,
    cache: Arc<RwLock<EntityCache>>,
    scenario_id: EntityId,
    interval: Duration,
    events_tx: EventSender,
) -> PollHandle {
    let cancel = CancellationToken::new();
    let poller = Poller {
        feed,
        playback,
        cache,
        scenario_id,
        events_tx,
    };
    let task = tokio::spawn(poller.run(interval, cancel.clone()));

    PollHandle {
        cancel,
        task: Some(task),
    }
}

struct Poller {
    feed: Arc<dyn SimulationFeed>,
    playback: Arc<RwLock<Playback>>,
    cache: Arc<RwLock<EntityCache>>,
    scenario_id: EntityId,
    events_tx: EventSender,
}

impl Poller {
    async fn run(self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        tracing::info!(scenario_id = self.scenario_id, ?interval, "Simulation poller started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(scenario_id = self.scenario_id, "Simulation poller cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if self.poll_once().await.is_break() {
                        break;
                    }
                }
            }
        }
    }

    async fn poll_once(&self) -> ControlFlow<()> {
        let Some(simulation_id) = self.playback.read().await.simulation_id() else {
            return ControlFlow::Break(());
        };

        let simulations = match self.feed.fetch_simulations(self.scenario_id).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(simulation_id, error = %e, "Simulation poll failed");
                publish(
                    &self.events_tx,
                    SessionEvent::PollFailed {
                        simulation_id,
                        error: e.to_string(),
                    },
                );
                return ControlFlow::Continue(());
            }
        };

        let mut playback = self.playback.write().await;
        if playback.simulation_id() != Some(simulation_id) {
            // Stopped or replaced while the fetch was in flight.
            return ControlFlow::Break(());
        }

        // Lock order is playback, then cache.
        let outcome = playback.reconcile(&simulations);
        match outcome {
            TickOutcome::Progress {
                point_in_time,
                cursor,
                played,
            } => {
                if let Some(snapshot) = simulations.into_iter().find(|s| s.id == simulation_id) {
                    self.cache.write().await.simulations.put(snapshot);
                }

                publish(
                    &self.events_tx,
                    SessionEvent::CursorMoved {
                        simulation_id,
                        point_in_time,
                        cursor,
                    },
                );
                if !played.is_empty() {
                    publish(
                        &self.events_tx,
                        SessionEvent::EventsPlayed {
                            simulation_id,
                            event_ids: played.iter().map(|e| e.id).collect(),
                        },
                    );
                }
                ControlFlow::Continue(())
            }
            TickOutcome::Finished => {
                playback.stop();
                publish(
                    &self.events_tx,
                    SessionEvent::StatusChanged {
                        simulation_id: Some(simulation_id),
                        status: SimulationStatus::Stopped,
                    },
                );
                playback.reset();
                self.cache.write().await.simulations.remove(&simulation_id);
                publish(
                    &self.events_tx,
                    SessionEvent::CacheUpdated(CacheScope::Simulations {
                        scenario_id: self.scenario_id,
                    }),
                );
                publish(
                    &self.events_tx,
                    SessionEvent::StatusChanged {
                        simulation_id: None,
                        status: SimulationStatus::NoSimulation,
                    },
                );
                ControlFlow::Break(())
            }
            TickOutcome::Idle => ControlFlow::Continue(()),
        }
    }
}
