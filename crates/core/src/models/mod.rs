//! Wire models exchanged with the simulation backend.
//!
//! Field names follow the backend's JSON (`scenarioID`, `pointInTime`,
//! ...). Relationships are by identifier; nested lists appear only in
//! the transfer shapes and are flattened by the cache on insertion.

pub mod configuration;
pub mod event_series;
pub mod event_type;
pub mod scenario;
pub mod simulation;

pub use configuration::{Configuration, CreateConfiguration};
pub use event_series::CreateEventSeries;
pub use event_type::{EventType, FastView, FastViewDescriptor};
pub use scenario::{CreateEvent, CreatePhase, CreateScenario, Event, Phase, Scenario};
pub use simulation::{CreateSimulation, Simulation, SimulationState};

use serde::{Deserialize, Deserializer};

/// Free-form structured payload (event data, configuration properties).
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Treat an explicit JSON `null` like a missing field.
///
/// The backend serializes empty collections as `null` in several places.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
