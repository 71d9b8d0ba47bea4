//! Scenario -> phase -> event cache.
//!
//! Entities live in three flat arenas keyed by `(scenario_id, id)`.
//! Events carry their owning phase id as a back-reference, so an event
//! belongs to exactly one phase at any instant. Nested [`Scenario`] and
//! [`Phase`] views are rebuilt from the arenas on every read.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::RangeInclusive;

use crate::error::CoreError;
use crate::models::{Event, Phase, Scenario};
use crate::types::EntityId;

type ChildKey = (EntityId, EntityId);

#[derive(Debug, Clone)]
struct ScenarioRecord {
    name: String,
    standard_phase: EntityId,
}

#[derive(Debug, Clone)]
struct PhaseRecord {
    name: String,
}

#[derive(Debug, Clone)]
struct EventRecord {
    phase_id: EntityId,
    event: Event,
}

/// All keys belonging to one scenario in a `(scenario_id, id)` arena.
fn children_of(scenario_id: EntityId) -> RangeInclusive<ChildKey> {
    (scenario_id, EntityId::MIN)..=(scenario_id, EntityId::MAX)
}

#[derive(Debug, Default)]
pub struct ScenarioRepository {
    scenarios: BTreeMap<EntityId, ScenarioRecord>,
    phases: BTreeMap<ChildKey, PhaseRecord>,
    events: BTreeMap<ChildKey, EventRecord>,
}

impl ScenarioRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- whole scenarios ----

    /// Insert or fully replace a scenario and its phase/event subtree.
    ///
    /// Rejects payloads that break the scenario invariants: at least one
    /// phase, the standard phase among them, unique phase and event ids.
    pub fn put(&mut self, scenario: Scenario) -> Result<(), CoreError> {
        validate_scenario(&scenario)?;

        self.remove(scenario.id);

        let scenario_id = scenario.id;
        self.scenarios.insert(
            scenario_id,
            ScenarioRecord {
                name: scenario.name,
                standard_phase: scenario.standard_phase,
            },
        );
        for phase in scenario.phases {
            self.insert_phase(scenario_id, phase);
        }

        tracing::debug!(scenario_id, "Scenario cached");
        Ok(())
    }

    /// Rebuild the nested view of a scenario. The result is a copy.
    pub fn get(&self, scenario_id: EntityId) -> Option<Scenario> {
        let record = self.scenarios.get(&scenario_id)?;

        let mut events_by_phase: HashMap<EntityId, Vec<Event>> = HashMap::new();
        for (_, rec) in self.events.range(children_of(scenario_id)) {
            events_by_phase
                .entry(rec.phase_id)
                .or_default()
                .push(rec.event.clone());
        }

        let phases = self
            .phases
            .range(children_of(scenario_id))
            .map(|(&(_, phase_id), rec)| Phase {
                id: phase_id,
                name: rec.name.clone(),
                events: events_by_phase.remove(&phase_id).unwrap_or_default(),
            })
            .collect();

        Some(Scenario {
            id: scenario_id,
            name: record.name.clone(),
            standard_phase: record.standard_phase,
            phases,
        })
    }

    pub fn contains(&self, scenario_id: EntityId) -> bool {
        self.scenarios.contains_key(&scenario_id)
    }

    /// Drop a scenario with its phases and events. Returns `false` when
    /// the scenario was not cached.
    pub fn remove(&mut self, scenario_id: EntityId) -> bool {
        if self.scenarios.remove(&scenario_id).is_none() {
            return false;
        }
        self.phases.retain(|&(sid, _), _| sid != scenario_id);
        self.events.retain(|&(sid, _), _| sid != scenario_id);
        true
    }

    /// Every cached scenario. Callers must not rely on the order.
    pub fn get_all(&self) -> Vec<Scenario> {
        self.scenarios
            .keys()
            .filter_map(|&id| self.get(id))
            .collect()
    }

    pub fn standard_phase_id(&self, scenario_id: EntityId) -> Result<EntityId, CoreError> {
        Ok(self.scenario_record(scenario_id)?.standard_phase)
    }

    // ---- phases ----

    /// Add a phase (with its events) to a scenario, replacing any phase
    /// with the same id.
    pub fn add_phase(&mut self, scenario_id: EntityId, phase: Phase) -> Result<(), CoreError> {
        self.scenario_record(scenario_id)?;
        self.insert_phase(scenario_id, phase);
        Ok(())
    }

    /// Replace an existing phase, e.g. after the backend shifted its events.
    pub fn replace_phase(&mut self, scenario_id: EntityId, phase: Phase) -> Result<(), CoreError> {
        self.phase_record(scenario_id, phase.id)?;
        self.insert_phase(scenario_id, phase);
        Ok(())
    }

    pub fn get_phase(&self, scenario_id: EntityId, phase_id: EntityId) -> Result<Phase, CoreError> {
        let record = self.phase_record(scenario_id, phase_id)?;
        Ok(Phase {
            id: phase_id,
            name: record.name.clone(),
            events: self.events_in_phase(scenario_id, phase_id).cloned().collect(),
        })
    }

    pub fn phase_ids(&self, scenario_id: EntityId) -> Result<Vec<EntityId>, CoreError> {
        self.scenario_record(scenario_id)?;
        Ok(self
            .phases
            .range(children_of(scenario_id))
            .map(|(&(_, phase_id), _)| phase_id)
            .collect())
    }

    /// Delete a phase together with its events.
    ///
    /// The standard phase cannot be removed.
    pub fn remove_phase(&mut self, scenario_id: EntityId, phase_id: EntityId) -> Result<(), CoreError> {
        self.phase_record(scenario_id, phase_id)?;
        if self.scenario_record(scenario_id)?.standard_phase == phase_id {
            return Err(CoreError::Validation(format!(
                "Phase {phase_id} is the standard phase of scenario {scenario_id}"
            )));
        }

        self.phases.remove(&(scenario_id, phase_id));
        self.events
            .retain(|&(sid, _), rec| sid != scenario_id || rec.phase_id != phase_id);
        Ok(())
    }

    /// Delete a phase but keep its events by moving them into the
    /// standard phase. Discarding the standard phase is a no-op.
    pub fn discard_phase(&mut self, scenario_id: EntityId, phase_id: EntityId) -> Result<(), CoreError> {
        self.phase_record(scenario_id, phase_id)?;
        let standard = self.scenario_record(scenario_id)?.standard_phase;
        if standard == phase_id {
            return Ok(());
        }

        for (_, rec) in self.events.range_mut(children_of(scenario_id)) {
            if rec.phase_id == phase_id {
                rec.phase_id = standard;
            }
        }
        self.phases.remove(&(scenario_id, phase_id));
        Ok(())
    }

    // ---- events ----

    /// Insert or replace an event under `phase_id`. An event with the same
    /// id in another phase of the scenario moves here.
    pub fn add_event(
        &mut self,
        scenario_id: EntityId,
        phase_id: EntityId,
        event: Event,
    ) -> Result<(), CoreError> {
        self.phase_record(scenario_id, phase_id)?;
        self.events
            .insert((scenario_id, event.id), EventRecord { phase_id, event });
        Ok(())
    }

    pub fn get_event(
        &self,
        scenario_id: EntityId,
        phase_id: EntityId,
        event_id: EntityId,
    ) -> Result<Event, CoreError> {
        self.phase_record(scenario_id, phase_id)?;
        self.events
            .get(&(scenario_id, event_id))
            .filter(|rec| rec.phase_id == phase_id)
            .map(|rec| rec.event.clone())
            .ok_or_else(|| CoreError::event_not_found(event_id))
    }

    /// Remove an event from a phase; a no-op when the phase does not hold it.
    pub fn remove_event(
        &mut self,
        scenario_id: EntityId,
        phase_id: EntityId,
        event_id: EntityId,
    ) -> Result<(), CoreError> {
        self.phase_record(scenario_id, phase_id)?;
        let key = (scenario_id, event_id);
        if self.events.get(&key).is_some_and(|rec| rec.phase_id == phase_id) {
            self.events.remove(&key);
        }
        Ok(())
    }

    /// Move an event from one phase to another within the same scenario.
    pub fn reassign_event(
        &mut self,
        scenario_id: EntityId,
        from_phase: EntityId,
        event_id: EntityId,
        to_phase: EntityId,
    ) -> Result<(), CoreError> {
        self.phase_record(scenario_id, from_phase)?;
        self.phase_record(scenario_id, to_phase)?;

        let record = self
            .events
            .get_mut(&(scenario_id, event_id))
            .filter(|rec| rec.phase_id == from_phase)
            .ok_or_else(|| CoreError::event_not_found(event_id))?;
        record.phase_id = to_phase;
        Ok(())
    }

    pub fn get_all_events(&self, scenario_id: EntityId) -> Result<Vec<Event>, CoreError> {
        self.scenario_record(scenario_id)?;
        Ok(self
            .events
            .range(children_of(scenario_id))
            .map(|(_, rec)| rec.event.clone())
            .collect())
    }

    pub fn get_all_events_from_phase(
        &self,
        scenario_id: EntityId,
        phase_id: EntityId,
    ) -> Result<Vec<Event>, CoreError> {
        self.phase_record(scenario_id, phase_id)?;
        Ok(self.events_in_phase(scenario_id, phase_id).cloned().collect())
    }

    /// Which phase currently owns `event_id`; `None` if no phase does.
    pub fn get_phase_id_for_event(&self, scenario_id: EntityId, event_id: EntityId) -> Option<EntityId> {
        self.events
            .get(&(scenario_id, event_id))
            .map(|rec| rec.phase_id)
    }

    pub fn get_event_from_scenario_by_id(
        &self,
        scenario_id: EntityId,
        event_id: EntityId,
    ) -> Option<Event> {
        self.events
            .get(&(scenario_id, event_id))
            .map(|rec| rec.event.clone())
    }

    /// The event with the greatest `point_in_time` across all phases, or
    /// `None` when the scenario holds no events.
    pub fn get_last_event_of(&self, scenario_id: EntityId) -> Result<Option<Event>, CoreError> {
        self.scenario_record(scenario_id)?;
        Ok(self
            .events
            .range(children_of(scenario_id))
            .map(|(_, rec)| &rec.event)
            .max_by_key(|e| e.point_in_time)
            .cloned())
    }

    /// Events of the given phases in ascending `point_in_time` order.
    pub fn sorted_events(
        &self,
        scenario_id: EntityId,
        phase_ids: &[EntityId],
    ) -> Result<Vec<Event>, CoreError> {
        for &phase_id in phase_ids {
            self.phase_record(scenario_id, phase_id)?;
        }
        let wanted: HashSet<EntityId> = phase_ids.iter().copied().collect();

        let mut events: Vec<Event> = self
            .events
            .range(children_of(scenario_id))
            .filter(|(_, rec)| wanted.contains(&rec.phase_id))
            .map(|(_, rec)| rec.event.clone())
            .collect();
        events.sort_by_key(|e| e.point_in_time);
        Ok(events)
    }

    // ---- private helpers ----

    fn scenario_record(&self, scenario_id: EntityId) -> Result<&ScenarioRecord, CoreError> {
        self.scenarios
            .get(&scenario_id)
            .ok_or_else(|| CoreError::scenario_not_found(scenario_id))
    }

    fn phase_record(&self, scenario_id: EntityId, phase_id: EntityId) -> Result<&PhaseRecord, CoreError> {
        self.scenario_record(scenario_id)?;
        self.phases
            .get(&(scenario_id, phase_id))
            .ok_or_else(|| CoreError::phase_not_found(phase_id))
    }

    fn events_in_phase(
        &self,
        scenario_id: EntityId,
        phase_id: EntityId,
    ) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .range(children_of(scenario_id))
            .filter(move |(_, rec)| rec.phase_id == phase_id)
            .map(|(_, rec)| &rec.event)
    }

    /// Write a phase and its events, dropping events the phase held before.
    fn insert_phase(&mut self, scenario_id: EntityId, phase: Phase) {
        let phase_id = phase.id;
        self.events
            .retain(|&(sid, _), rec| sid != scenario_id || rec.phase_id != phase_id);
        self.phases
            .insert((scenario_id, phase_id), PhaseRecord { name: phase.name });
        for event in phase.events {
            self.events
                .insert((scenario_id, event.id), EventRecord { phase_id, event });
        }
    }
}

fn validate_scenario(scenario: &Scenario) -> Result<(), CoreError> {
    if scenario.phases.is_empty() {
        return Err(CoreError::Validation(format!(
            "Scenario {} has no phases",
            scenario.id
        )));
    }
    if scenario.phase(scenario.standard_phase).is_none() {
        return Err(CoreError::Validation(format!(
            "Standard phase {} is not a phase of scenario {}",
            scenario.standard_phase, scenario.id
        )));
    }

    let mut phase_ids = HashSet::new();
    let mut event_ids = HashSet::new();
    for phase in &scenario.phases {
        if !phase_ids.insert(phase.id) {
            return Err(CoreError::Validation(format!(
                "Duplicate phase id {} in scenario {}",
                phase.id, scenario.id
            )));
        }
        for event in &phase.events {
            if !event_ids.insert(event.id) {
                return Err(CoreError::Validation(format!(
                    "Event {} appears in more than one place in scenario {}",
                    event.id, scenario.id
                )));
            }
        }
    }
    Ok(())
}
