//! Simulation records as reported by the backend.

use serde::{Deserialize, Serialize};

use crate::models::{null_as_default, Configuration};
use crate::types::{EntityId, Millis};

/// Backend lifecycle state of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationState {
    /// Created but not started.
    Initialized,
    Running,
    Paused,
    /// Every selected event has been played.
    Finished,
    /// Stopped before finishing.
    Terminated,
}

impl SimulationState {
    /// `true` while the backend is still playing (or holding) events.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// `true` once the simulation can no longer progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Terminated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    #[serde(rename = "simulationID")]
    pub id: EntityId,
    pub simulation_state: SimulationState,
    /// Snapshot of the configuration taken when the simulation was created.
    pub configuration: Configuration,
    #[serde(
        rename = "selectedPhaseIDs",
        default,
        deserialize_with = "null_as_default"
    )]
    pub selected_phase_ids: Vec<EntityId>,
    /// Current offset from the configuration's scenario start time.
    #[serde(default)]
    pub point_in_time: Millis,
    pub speed: f64,
}

/// Request body for `POST /scenarios/{id}/simulations`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSimulation {
    pub configuration: Configuration,
    #[serde(rename = "selectedPhaseIDs")]
    pub selected_phase_ids: Vec<EntityId>,
    pub speed: f64,
}
