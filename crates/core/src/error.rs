use crate::types::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced scenario, phase or event is absent from the cache.
    ///
    /// Indicates a caller bug: collaborators only reference ids they
    /// previously read from the cache.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn scenario_not_found(id: EntityId) -> Self {
        Self::NotFound {
            entity: "scenario",
            id,
        }
    }

    pub fn phase_not_found(id: EntityId) -> Self {
        Self::NotFound { entity: "phase", id }
    }

    pub fn event_not_found(id: EntityId) -> Self {
        Self::NotFound { entity: "event", id }
    }
}
