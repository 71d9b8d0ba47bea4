//! In-memory projection of backend-owned entities.
//!
//! The cache is only ever written after the backend confirmed a change;
//! readers always receive owned copies, never references into storage
//! that a later write could invalidate.

pub mod repository;
pub mod scenario_repository;

pub use repository::{Keyed, Repository};
pub use scenario_repository::ScenarioRepository;

use crate::models::{Configuration, EventType, Simulation};

/// Every repository the client keeps for one session.
#[derive(Debug, Default)]
pub struct EntityCache {
    pub scenarios: ScenarioRepository,
    pub configurations: Repository<Configuration>,
    pub simulations: Repository<Simulation>,
    pub event_types: Repository<EventType>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }
}
