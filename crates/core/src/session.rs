//! Explicit per-session selection state.

use crate::error::CoreError;
use crate::types::EntityId;

/// What the user currently has open.
///
/// Populated by session initialization in a fixed order: scenario, then
/// configuration. The tracked simulation lives in the playback state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub scenario_id: Option<EntityId>,
    pub configuration_id: Option<EntityId>,
    /// Phases included when the next simulation is created. Never empty
    /// while a scenario is open.
    pub selected_phase_ids: Vec<EntityId>,
    /// Playback speed multiplier for the next simulation.
    pub speed: f64,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            scenario_id: None,
            configuration_id: None,
            selected_phase_ids: Vec::new(),
            speed: 1.0,
        }
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to a scenario, selecting only its standard phase.
    pub fn open_scenario(&mut self, scenario_id: EntityId, standard_phase: EntityId) {
        self.scenario_id = Some(scenario_id);
        self.selected_phase_ids = vec![standard_phase];
    }

    /// Replace the phase selection. An empty selection is rejected.
    pub fn select_phases(&mut self, phase_ids: Vec<EntityId>) -> Result<(), CoreError> {
        if phase_ids.is_empty() {
            return Err(CoreError::Validation("At least one phase must be selected".into()));
        }
        self.selected_phase_ids = phase_ids;
        Ok(())
    }

    /// Keep only selected phases that still exist, falling back to the
    /// standard phase when none remain.
    pub fn retain_phases(&mut self, existing: &[EntityId], standard_phase: EntityId) {
        self.selected_phase_ids.retain(|id| existing.contains(id));
        if self.selected_phase_ids.is_empty() {
            self.selected_phase_ids.push(standard_phase);
        }
    }
}
