//! Scenario, phase and event transfer shapes.

use serde::{Deserialize, Serialize};

use crate::models::{null_as_default, Payload};
use crate::types::{EntityId, Millis};

/// A scenario with its phases and their events, as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(rename = "scenarioID")]
    pub id: EntityId,
    pub name: String,
    /// Id of the phase treated as the default phase.
    pub standard_phase: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phases: Vec<Phase>,
}

impl Scenario {
    pub fn phase(&self, phase_id: EntityId) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == phase_id)
    }

    /// Number of events across all phases.
    pub fn event_count(&self) -> usize {
        self.phases.iter().map(|p| p.events.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(rename = "phaseID")]
    pub id: EntityId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<Event>,
}

/// A timestamped occurrence with a type-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "eventID")]
    pub id: EntityId,
    /// Name of the [`EventType`](crate::models::EventType).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Offset from the configuration's scenario start time.
    pub point_in_time: Millis,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Payload,
}

/// Request body for `POST /scenarios`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateScenario {
    pub name: String,
}

/// Request body for `POST /scenarios/{id}/phases`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePhase {
    pub name: String,
}

/// Request body for creating or editing an event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub point_in_time: Millis,
    pub data: Payload,
}

impl CreateEvent {
    /// Materialize the event the backend confirmed under `id`.
    pub fn into_event(self, id: EntityId) -> Event {
        Event {
            id,
            event_type: self.event_type,
            point_in_time: self.point_in_time,
            data: self.data,
        }
    }
}
