//! Session events published to presentation collaborators.
//!
//! Produced by the session after each confirmed mutation and by the
//! poller on every tick. Subscribers get them through a
//! [`tokio::sync::broadcast`] channel; a lagging subscriber loses the
//! oldest events, never blocks the producer.

use serde::Serialize;
use tokio::sync::broadcast;

use scenaria_core::playback::SimulationStatus;
use scenaria_core::types::{EntityId, Millis};

/// Broadcast channel capacity for session events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Which part of the entity cache changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CacheScope {
    EventTypes,
    Scenario { scenario_id: EntityId },
    Configuration { configuration_id: EntityId },
    Simulations { scenario_id: EntityId },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    /// The client-observed simulation status changed.
    StatusChanged {
        simulation_id: Option<EntityId>,
        status: SimulationStatus,
    },

    /// The playback cursor moved to `cursor` (epoch milliseconds).
    CursorMoved {
        simulation_id: EntityId,
        point_in_time: Millis,
        cursor: Millis,
    },

    /// Events became due during a poll tick.
    EventsPlayed {
        simulation_id: EntityId,
        event_ids: Vec<EntityId>,
    },

    /// A poll tick failed; polling continues.
    PollFailed {
        simulation_id: EntityId,
        error: String,
    },

    /// The cache was updated after a confirmed backend response.
    CacheUpdated(CacheScope),
}

pub type EventSender = broadcast::Sender<SessionEvent>;

pub fn channel() -> (EventSender, broadcast::Receiver<SessionEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}

/// Publish `event`. Having no subscribers is not an error.
pub fn publish(tx: &EventSender, event: SessionEvent) {
    let _ = tx.send(event);
}
