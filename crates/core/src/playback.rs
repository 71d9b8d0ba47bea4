//! Client-side playback of a backend simulation.
//!
//! The backend is the only authority on simulation progress. [`Playback`]
//! holds what the client believes about the current simulation and
//! reconciles that belief against each polled snapshot.
//!
//! ```text
//! NoSimulation -> Running <-> Paused -> Stopped -> NoSimulation
//! ```

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;

use crate::error::CoreError;
use crate::models::{Event, Simulation, SimulationState};
use crate::types::{timestamp_from_millis, EntityId, Millis, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Client-observed simulation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationStatus {
    #[default]
    NoSimulation,
    Running,
    Paused,
    Stopped,
}

impl SimulationStatus {
    /// `true` while a simulation is being tracked and polled.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Whether a new simulation may be started from this state.
    pub fn can_begin(self) -> bool {
        matches!(self, Self::NoSimulation | Self::Stopped)
    }

    fn matches_backend(self, state: SimulationState) -> bool {
        matches!(
            (self, state),
            (Self::Running, SimulationState::Running) | (Self::Paused, SimulationState::Paused)
        )
    }
}

impl std::fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoSimulation => "no simulation",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Upcoming events
// ---------------------------------------------------------------------------

/// Events not yet played, ascending by `point_in_time`.
///
/// Consumed from the front only. Once an event is popped it never comes
/// back, even if a later snapshot reports an earlier point in time.
#[derive(Debug, Clone, Default)]
pub struct UpcomingEvents {
    queue: VecDeque<Event>,
}

impl UpcomingEvents {
    pub fn new(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.point_in_time);
        Self {
            queue: events.into(),
        }
    }

    /// Pop every event due at or before `point_in_time`.
    pub fn drain_due(&mut self, point_in_time: Millis) -> Vec<Event> {
        let mut due = Vec::new();
        while self
            .queue
            .front()
            .is_some_and(|e| e.point_in_time <= point_in_time)
        {
            if let Some(event) = self.queue.pop_front() {
                due.push(event);
            }
        }
        due
    }

    pub fn peek(&self) -> Option<&Event> {
        self.queue.front()
    }

    pub fn pending_ids(&self) -> Vec<EntityId> {
        self.queue.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tick outcome
// ---------------------------------------------------------------------------

/// Result of reconciling one polled snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The simulation is still running or paused on the backend.
    Progress {
        point_in_time: Millis,
        /// Absolute epoch milliseconds of the playback position.
        cursor: Millis,
        /// Events that became due on this tick.
        played: Vec<Event>,
    },
    /// The backend finished the simulation, stopped it, or forgot it.
    Finished,
    /// Nothing to reconcile: no tracked simulation, or it has not started.
    Idle,
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Playback {
    status: SimulationStatus,
    simulation_id: Option<EntityId>,
    start_time: Millis,
    cursor: Option<Millis>,
    upcoming: UpcomingEvents,
    played: BTreeSet<EntityId>,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn simulation_id(&self) -> Option<EntityId> {
        self.simulation_id
    }

    /// Playback position in absolute epoch milliseconds.
    pub fn cursor(&self) -> Option<Millis> {
        self.cursor
    }

    pub fn cursor_time(&self) -> Option<Timestamp> {
        self.cursor.and_then(timestamp_from_millis)
    }

    pub fn upcoming(&self) -> &UpcomingEvents {
        &self.upcoming
    }

    pub fn is_played(&self, event_id: EntityId) -> bool {
        self.played.contains(&event_id)
    }

    pub fn played_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.played.iter().copied()
    }

    /// Start tracking a freshly created and started simulation.
    pub fn begin(
        &mut self,
        simulation_id: EntityId,
        start_time: Millis,
        events: Vec<Event>,
    ) -> Result<(), CoreError> {
        if !self.status.can_begin() {
            return Err(CoreError::Validation(format!(
                "Cannot start simulation {simulation_id} while another is {}",
                self.status
            )));
        }

        self.status = SimulationStatus::Running;
        self.simulation_id = Some(simulation_id);
        self.start_time = start_time;
        self.cursor = Some(start_time);
        self.upcoming = UpcomingEvents::new(events);
        self.played.clear();

        tracing::info!(simulation_id, start_time, "Playback started");
        Ok(())
    }

    /// Adopt a simulation that was already running or paused when the
    /// session was initialized.
    ///
    /// Events due at the reported point in time count as played.
    pub fn resume(&mut self, simulation: &Simulation, events: Vec<Event>) -> Result<(), CoreError> {
        let status = match simulation.simulation_state {
            SimulationState::Running => SimulationStatus::Running,
            SimulationState::Paused => SimulationStatus::Paused,
            other => {
                return Err(CoreError::Validation(format!(
                    "Simulation {} is {other:?}, not running or paused",
                    simulation.id
                )))
            }
        };
        if !self.status.can_begin() {
            return Err(CoreError::Validation(format!(
                "Cannot adopt simulation {} while another is {}",
                simulation.id, self.status
            )));
        }

        let start_time = simulation.configuration.scenario_start_time;
        let mut upcoming = UpcomingEvents::new(events);
        let already_played = upcoming.drain_due(simulation.point_in_time);

        self.status = status;
        self.simulation_id = Some(simulation.id);
        self.start_time = start_time;
        self.cursor = Some(simulation.configuration.absolute_time(simulation.point_in_time));
        self.upcoming = upcoming;
        self.played = already_played.iter().map(|e| e.id).collect();

        tracing::info!(
            simulation_id = simulation.id,
            point_in_time = simulation.point_in_time,
            status = %status,
            skipped = self.played.len(),
            "Playback resumed",
        );
        Ok(())
    }

    /// Flip the local Running/Paused belief and return the new status.
    ///
    /// The backend's toggle endpoint does not report the resulting state,
    /// so this belief is inferred rather than confirmed.
    pub fn toggle_pause(&mut self) -> Result<SimulationStatus, CoreError> {
        self.status = match self.status {
            SimulationStatus::Running => SimulationStatus::Paused,
            SimulationStatus::Paused => SimulationStatus::Running,
            other => {
                return Err(CoreError::Validation(format!(
                    "Cannot pause or resume while {other}"
                )))
            }
        };
        tracing::debug!(simulation_id = ?self.simulation_id, status = %self.status, "Pause toggled");
        Ok(self.status)
    }

    /// Reconcile one poll of the scenario's simulations.
    ///
    /// A tracked simulation missing from `simulations` is treated as
    /// finished. A backend Running/Paused state that disagrees with the
    /// local belief is logged and otherwise ignored.
    pub fn reconcile(&mut self, simulations: &[Simulation]) -> TickOutcome {
        let Some(simulation_id) = self.simulation_id.filter(|_| self.status.is_active()) else {
            return TickOutcome::Idle;
        };

        let Some(snapshot) = simulations.iter().find(|s| s.id == simulation_id) else {
            tracing::info!(simulation_id, "Simulation no longer reported by backend");
            return TickOutcome::Finished;
        };

        let state = snapshot.simulation_state;
        match state {
            SimulationState::Finished | SimulationState::Terminated => {
                tracing::info!(simulation_id, state = ?state, "Simulation ended on backend");
                return TickOutcome::Finished;
            }
            SimulationState::Initialized => return TickOutcome::Idle,
            SimulationState::Running | SimulationState::Paused => {}
        }

        if !self.status.matches_backend(state) {
            tracing::warn!(
                simulation_id,
                local = %self.status,
                backend = ?state,
                "Backend simulation state disagrees with local belief",
            );
        }

        let point_in_time = snapshot.point_in_time;
        let cursor = self.start_time.saturating_add(point_in_time);
        self.cursor = Some(cursor);

        let played = self.upcoming.drain_due(point_in_time);
        self.played.extend(played.iter().map(|e| e.id));

        if !played.is_empty() {
            tracing::debug!(simulation_id, point_in_time, count = played.len(), "Events played");
        }

        TickOutcome::Progress {
            point_in_time,
            cursor,
            played,
        }
    }

    /// Mark the tracked simulation as stopped. The cursor is kept.
    pub fn stop(&mut self) {
        if self.status != SimulationStatus::Stopped {
            tracing::info!(simulation_id = ?self.simulation_id, "Playback stopped");
        }
        self.status = SimulationStatus::Stopped;
    }

    /// Forget the simulation entirely.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
