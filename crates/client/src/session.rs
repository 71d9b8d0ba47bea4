//! Session orchestrator.
//!
//! [`Session`] owns the entity cache, the selection context, the shared
//! playback state and the poller handle. Every mutation follows the same
//! path: issue the backend request, and only once it succeeded apply the
//! change to the cache and publish a [`SessionEvent`]. A failed request
//! leaves the cache exactly as it was.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};

use scenaria_core::cache::EntityCache;
use scenaria_core::descriptor::{
    defaults_for, field_defaults, validate_configuration_properties, validate_event_data, InputField,
};
use scenaria_core::error::CoreError;
use scenaria_core::models::{
    Configuration, CreateConfiguration, CreateEvent, CreateEventSeries, CreatePhase,
    CreateScenario, CreateSimulation, Event, EventType, FastView, Payload, Phase, Scenario,
    Simulation,
};
use scenaria_core::playback::{Playback, SimulationStatus};
use scenaria_core::session::SessionContext;
use scenaria_core::types::{EntityId, Millis};

use crate::api::{ApiError, BackendApi};
use crate::config::ClientConfig;
use crate::events::{self, publish, CacheScope, EventSender, SessionEvent};
use crate::poller::{spawn_poller, PollHandle};

/// How long [`Session::shutdown`] waits for the poller to exit.
const POLLER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Backend(#[from] ApiError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("No scenario is open")]
    NoScenario,

    #[error("No configuration is selected")]
    NoConfiguration,

    #[error("No simulation is running or paused")]
    NoActiveSimulation,

    #[error("A simulation is already running or paused")]
    SimulationAlreadyActive,

    /// The simulation was created but could not be started. The record
    /// stays on the backend in its initial state.
    #[error("Simulation {simulation_id} was created but failed to start: {source}")]
    StartFailed {
        simulation_id: EntityId,
        #[source]
        source: ApiError,
    },
}

#[derive(Debug)]
pub struct Session {
    api: BackendApi,
    config: ClientConfig,
    cache: Arc<RwLock<EntityCache>>,
    configuration_descriptor: RwLock<Vec<InputField>>,
    context: RwLock<SessionContext>,
    playback: Arc<RwLock<Playback>>,
    poller: Mutex<Option<PollHandle>>,
    events_tx: EventSender,
}

impl Session {
    /// Connect to the backend named in `config` and load the session.
    pub async fn initialize(config: ClientConfig) -> Result<Self, SessionError> {
        let api = BackendApi::new(config.backend_url.clone(), config.request_timeout)?;
        Self::initialize_with(api, config).await
    }

    /// Load the session through an existing API client.
    ///
    /// Order: configuration descriptor, event types, scenario,
    /// configuration, simulations.
    pub async fn initialize_with(api: BackendApi, config: ClientConfig) -> Result<Self, SessionError> {
        let (events_tx, _) = events::channel();
        let session = Self {
            api,
            config,
            cache: Arc::new(RwLock::new(EntityCache::new())),
            configuration_descriptor: RwLock::new(Vec::new()),
            context: RwLock::new(SessionContext::new()),
            playback: Arc::new(RwLock::new(Playback::new())),
            poller: Mutex::new(None),
            events_tx,
        };

        session.load_configuration_descriptor().await?;
        session.load_event_types().await?;
        session.load_scenario().await?;
        session.load_configuration().await?;
        session.load_simulations().await?;

        let context = session.context().await;
        tracing::info!(
            scenario_id = ?context.scenario_id,
            configuration_id = ?context.configuration_id,
            simulation_id = ?session.simulation_id().await,
            "Session initialized",
        );
        Ok(session)
    }

    // ---- read accessors ----

    pub fn api(&self) -> &BackendApi {
        &self.api
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Snapshot of the selection context.
    pub async fn context(&self) -> SessionContext {
        self.context.read().await.clone()
    }

    /// The simulation playback is tracking, if any.
    pub async fn simulation_id(&self) -> Option<EntityId> {
        self.playback.read().await.simulation_id()
    }

    /// The open scenario, rebuilt from the cache.
    pub async fn scenario(&self) -> Option<Scenario> {
        let scenario_id = self.context.read().await.scenario_id?;
        self.cache.read().await.scenarios.get(scenario_id)
    }

    pub async fn event_types(&self) -> Vec<EventType> {
        let mut types = self.cache.read().await.event_types.get_all();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        types
    }

    /// The selected configuration.
    pub async fn configuration(&self) -> Option<Configuration> {
        let configuration_id = self.context.read().await.configuration_id?;
        self.cache.read().await.configurations.get(&configuration_id)
    }

    /// Cached simulations of the open scenario, by id.
    pub async fn simulations(&self) -> Vec<Simulation> {
        let mut simulations = self.cache.read().await.simulations.get_all();
        simulations.sort_by_key(|s| s.id);
        simulations
    }

    /// Fields a configuration's `additionalProperties` may carry.
    pub async fn configuration_descriptor(&self) -> Vec<InputField> {
        self.configuration_descriptor.read().await.clone()
    }

    /// `additionalProperties` pre-filled from the configuration descriptor.
    pub async fn configuration_defaults(&self) -> Payload {
        field_defaults(&self.configuration_descriptor.read().await)
    }

    pub async fn status(&self) -> SimulationStatus {
        self.playback.read().await.status()
    }

    /// Playback position in epoch milliseconds, while a simulation is tracked.
    pub async fn playback_cursor(&self) -> Option<Millis> {
        self.playback.read().await.cursor()
    }

    pub async fn is_played(&self, event_id: EntityId) -> bool {
        self.playback.read().await.is_played(event_id)
    }

    /// Compact view of an event according to its type's descriptor.
    pub async fn fast_view(&self, event: &Event) -> Option<FastView> {
        let cache = self.cache.read().await;
        let event_type = cache.event_types.get(&event.event_type)?;
        Some(event_type.fast_view_descriptor.project(&event.data))
    }

    /// A payload pre-filled with the defaults declared by `event_type`.
    pub async fn event_defaults(&self, event_type: &str) -> Option<Payload> {
        let cache = self.cache.read().await;
        let event_type = cache.event_types.get(&event_type.to_string())?;
        Some(defaults_for(&event_type))
    }

    // ---- phases ----

    pub async fn create_phase(&self, name: impl Into<String>) -> Result<Phase, SessionError> {
        let scenario_id = self.scenario_id().await?;
        let body = CreatePhase { name: name.into() };

        let phase = self.api.create_phase(scenario_id, &body).await?;
        self.cache
            .write()
            .await
            .scenarios
            .add_phase(scenario_id, phase.clone())?;

        tracing::info!(scenario_id, phase_id = phase.id, "Phase created");
        self.scenario_updated(scenario_id);
        Ok(phase)
    }

    /// Delete a phase together with its events.
    pub async fn delete_phase(&self, phase_id: EntityId) -> Result<(), SessionError> {
        let scenario_id = self.scenario_id().await?;

        self.api.delete_phase(scenario_id, phase_id).await?;
        let (remaining, standard) = {
            let mut cache = self.cache.write().await;
            cache.scenarios.remove_phase(scenario_id, phase_id)?;
            (
                cache.scenarios.phase_ids(scenario_id)?,
                cache.scenarios.standard_phase_id(scenario_id)?,
            )
        };
        self.context.write().await.retain_phases(&remaining, standard);

        tracing::info!(scenario_id, phase_id, "Phase deleted");
        self.scenario_updated(scenario_id);
        Ok(())
    }

    /// Delete a phase, moving its events into the standard phase.
    pub async fn discard_phase(&self, phase_id: EntityId) -> Result<(), SessionError> {
        let scenario_id = self.scenario_id().await?;

        self.api.discard_phase(scenario_id, phase_id).await?;
        let (remaining, standard) = {
            let mut cache = self.cache.write().await;
            cache.scenarios.discard_phase(scenario_id, phase_id)?;
            (
                cache.scenarios.phase_ids(scenario_id)?,
                cache.scenarios.standard_phase_id(scenario_id)?,
            )
        };
        self.context.write().await.retain_phases(&remaining, standard);

        tracing::info!(scenario_id, phase_id, "Phase discarded");
        self.scenario_updated(scenario_id);
        Ok(())
    }

    /// Move every event of a phase by `offset` milliseconds.
    pub async fn shift_phase(&self, phase_id: EntityId, offset: Millis) -> Result<Phase, SessionError> {
        let scenario_id = self.scenario_id().await?;

        let phase = self.api.shift_phase(scenario_id, phase_id, offset).await?;
        self.cache
            .write()
            .await
            .scenarios
            .replace_phase(scenario_id, phase.clone())?;

        tracing::info!(scenario_id, phase_id, offset, "Phase shifted");
        self.scenario_updated(scenario_id);
        Ok(phase)
    }

    // ---- events ----

    /// Create an event after checking its data against the event type.
    pub async fn create_event(&self, phase_id: EntityId, body: CreateEvent) -> Result<Event, SessionError> {
        let scenario_id = self.scenario_id().await?;
        self.validate_event(&body).await?;

        let event = self.api.create_event(scenario_id, phase_id, &body).await?;
        self.cache
            .write()
            .await
            .scenarios
            .add_event(scenario_id, phase_id, event.clone())?;

        tracing::info!(scenario_id, phase_id, event_id = event.id, "Event created");
        self.scenario_updated(scenario_id);
        Ok(event)
    }

    pub async fn edit_event(
        &self,
        phase_id: EntityId,
        event_id: EntityId,
        body: CreateEvent,
    ) -> Result<Event, SessionError> {
        let scenario_id = self.scenario_id().await?;
        self.validate_event(&body).await?;

        self.api
            .edit_event(scenario_id, phase_id, event_id, &body)
            .await?;
        let event = body.into_event(event_id);
        self.cache
            .write()
            .await
            .scenarios
            .add_event(scenario_id, phase_id, event.clone())?;

        tracing::info!(scenario_id, phase_id, event_id, "Event edited");
        self.scenario_updated(scenario_id);
        Ok(event)
    }

    pub async fn reassign_event(
        &self,
        from_phase: EntityId,
        event_id: EntityId,
        to_phase: EntityId,
    ) -> Result<(), SessionError> {
        let scenario_id = self.scenario_id().await?;

        self.api
            .reassign_event(scenario_id, from_phase, event_id, to_phase)
            .await?;
        self.cache
            .write()
            .await
            .scenarios
            .reassign_event(scenario_id, from_phase, event_id, to_phase)?;

        tracing::info!(scenario_id, event_id, from_phase, to_phase, "Event reassigned");
        self.scenario_updated(scenario_id);
        Ok(())
    }

    pub async fn delete_event(&self, phase_id: EntityId, event_id: EntityId) -> Result<(), SessionError> {
        let scenario_id = self.scenario_id().await?;

        self.api.delete_event(scenario_id, phase_id, event_id).await?;
        self.cache
            .write()
            .await
            .scenarios
            .remove_event(scenario_id, phase_id, event_id)?;

        tracing::info!(scenario_id, phase_id, event_id, "Event deleted");
        self.scenario_updated(scenario_id);
        Ok(())
    }

    /// Generate a series of events. The backend does not return them, so
    /// the whole scenario is fetched again afterwards.
    pub async fn create_event_series(
        &self,
        phase_id: EntityId,
        body: CreateEventSeries,
    ) -> Result<Scenario, SessionError> {
        let scenario_id = self.scenario_id().await?;
        body.validate()?;
        self.validate_event(&CreateEvent {
            event_type: body.event_type.clone(),
            point_in_time: 0,
            data: body.event_data.clone(),
        })
        .await?;

        self.api
            .create_event_series(scenario_id, phase_id, &body)
            .await?;
        let scenario = self.api.get_scenario(scenario_id).await?;
        self.cache.write().await.scenarios.put(scenario.clone())?;

        tracing::info!(
            scenario_id,
            phase_id,
            count = body.num_of_events,
            "Event series created",
        );
        self.scenario_updated(scenario_id);
        Ok(scenario)
    }

    // ---- configurations ----

    /// Create a configuration and make it the selected one.
    pub async fn create_configuration(
        &self,
        body: CreateConfiguration,
    ) -> Result<Configuration, SessionError> {
        self.validate_configuration(&body).await?;

        let configuration = self.api.create_configuration(&body).await?;
        self.cache
            .write()
            .await
            .configurations
            .put(configuration.clone());
        self.context.write().await.configuration_id = Some(configuration.id);

        tracing::info!(configuration_id = configuration.id, "Configuration created");
        self.configuration_updated(configuration.id);
        Ok(configuration)
    }

    pub async fn update_configuration(
        &self,
        configuration_id: EntityId,
        body: CreateConfiguration,
    ) -> Result<Configuration, SessionError> {
        self.validate_configuration(&body).await?;

        let configuration = self
            .api
            .update_configuration(configuration_id, &body)
            .await?;
        self.cache
            .write()
            .await
            .configurations
            .put(configuration.clone());

        tracing::info!(configuration_id, "Configuration updated");
        self.configuration_updated(configuration_id);
        Ok(configuration)
    }

    /// Select a cached configuration for the next simulation.
    pub async fn select_configuration(&self, configuration_id: EntityId) -> Result<(), SessionError> {
        if !self.cache.read().await.configurations.contains(&configuration_id) {
            return Err(CoreError::NotFound {
                entity: "configuration",
                id: configuration_id,
            }
            .into());
        }
        self.context.write().await.configuration_id = Some(configuration_id);
        Ok(())
    }

    /// Choose which phases the next simulation plays. At least one
    /// phase must be selected.
    pub async fn select_phases(&self, phase_ids: Vec<EntityId>) -> Result<(), SessionError> {
        let scenario_id = self.scenario_id().await?;
        let known = self.cache.read().await.scenarios.phase_ids(scenario_id)?;
        if let Some(&missing) = phase_ids.iter().find(|id| !known.contains(*id)) {
            return Err(CoreError::phase_not_found(missing).into());
        }
        self.context.write().await.select_phases(phase_ids)?;
        Ok(())
    }

    // ---- simulations ----

    /// Create a simulation from the current selection and start it.
    pub async fn start_simulation(&self) -> Result<Simulation, SessionError> {
        if !self.playback.read().await.status().can_begin() {
            return Err(SessionError::SimulationAlreadyActive);
        }
        let context = self.context.read().await.clone();
        let scenario_id = context.scenario_id.ok_or(SessionError::NoScenario)?;
        let configuration_id = context.configuration_id.ok_or(SessionError::NoConfiguration)?;

        let (configuration, events) = {
            let cache = self.cache.read().await;
            let configuration = cache
                .configurations
                .get(&configuration_id)
                .ok_or(SessionError::NoConfiguration)?;
            if configuration.additional_properties.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Configuration {configuration_id} has no properties set"
                ))
                .into());
            }
            let events = cache
                .scenarios
                .sorted_events(scenario_id, &context.selected_phase_ids)?;
            (configuration, events)
        };
        let start_time = configuration.scenario_start_time;

        let body = CreateSimulation {
            configuration,
            selected_phase_ids: context.selected_phase_ids.clone(),
            speed: context.speed,
        };
        let simulation = self.api.create_simulation(scenario_id, &body).await?;
        self.cache
            .write()
            .await
            .simulations
            .put(simulation.clone());

        if let Err(source) = self.api.play_simulation(simulation.id).await {
            tracing::error!(
                simulation_id = simulation.id,
                error = %source,
                "Simulation created but failed to start",
            );
            return Err(SessionError::StartFailed {
                simulation_id: simulation.id,
                source,
            });
        }

        self.playback
            .write()
            .await
            .begin(simulation.id, start_time, events)?;

        tracing::info!(scenario_id, simulation_id = simulation.id, "Simulation started");
        publish(
            &self.events_tx,
            SessionEvent::StatusChanged {
                simulation_id: Some(simulation.id),
                status: SimulationStatus::Running,
            },
        );
        self.start_poller(scenario_id).await;
        Ok(simulation)
    }

    /// Pause a running simulation or resume a paused one.
    ///
    /// The backend endpoint toggles; the resulting state is inferred
    /// locally from the previous belief.
    pub async fn toggle_pause(&self) -> Result<SimulationStatus, SessionError> {
        let simulation_id = self.active_simulation_id().await?;

        let reported = self.api.pause_simulation(simulation_id).await?;
        let status = self.playback.write().await.toggle_pause()?;
        tracing::info!(simulation_id, %status, backend = ?reported, "Simulation pause toggled");

        publish(
            &self.events_tx,
            SessionEvent::StatusChanged {
                simulation_id: Some(simulation_id),
                status,
            },
        );
        Ok(status)
    }

    pub async fn stop_simulation(&self) -> Result<(), SessionError> {
        let simulation_id = self.active_simulation_id().await?;

        self.api.stop_simulation(simulation_id).await?;
        self.cancel_poller().await;

        {
            let mut playback = self.playback.write().await;
            // The poller may already have observed the termination.
            if playback.simulation_id() == Some(simulation_id) {
                self.cache.write().await.simulations.remove(&simulation_id);
                playback.stop();
                publish(
                    &self.events_tx,
                    SessionEvent::StatusChanged {
                        simulation_id: Some(simulation_id),
                        status: SimulationStatus::Stopped,
                    },
                );
                playback.reset();
                publish(
                    &self.events_tx,
                    SessionEvent::StatusChanged {
                        simulation_id: None,
                        status: SimulationStatus::NoSimulation,
                    },
                );
            }
        }
        tracing::info!(simulation_id, "Simulation stopped");
        Ok(())
    }

    /// Set the playback speed. Applies to the active simulation, if any,
    /// and to simulations started later.
    pub async fn set_speed(&self, speed: f64) -> Result<(), SessionError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(CoreError::Validation(format!("Speed must be positive, got {speed}")).into());
        }

        if let Ok(simulation_id) = self.active_simulation_id().await {
            self.api.set_speed(simulation_id, speed).await?;
            tracing::info!(simulation_id, speed, "Simulation speed changed");
        }
        self.context.write().await.speed = speed;
        Ok(())
    }

    /// Skip the active simulation forward to `event_id`. The next poll
    /// tick picks up the new position.
    pub async fn fast_forward(&self, event_id: EntityId) -> Result<(), SessionError> {
        let simulation_id = self.active_simulation_id().await?;
        self.api.fast_forward(simulation_id, event_id).await?;
        tracing::info!(simulation_id, event_id, "Simulation fast-forwarded");
        Ok(())
    }

    /// Reload the open scenario's simulations into the cache.
    pub async fn refresh_simulations(&self) -> Result<Vec<Simulation>, SessionError> {
        let scenario_id = self.scenario_id().await?;

        let simulations = self.api.list_simulations(scenario_id).await?;
        self.cache
            .write()
            .await
            .simulations
            .replace_all(simulations.clone());

        publish(
            &self.events_tx,
            SessionEvent::CacheUpdated(CacheScope::Simulations { scenario_id }),
        );
        Ok(simulations)
    }

    /// Cancel the poller and wait for it to exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down session");
        self.cancel_poller().await;
        tracing::info!("Session shut down complete");
    }

    // ---- initialization steps ----

    async fn load_configuration_descriptor(&self) -> Result<(), SessionError> {
        let fields = self.api.configuration_descriptor().await?;
        tracing::info!(count = fields.len(), "Configuration descriptor loaded");

        *self.configuration_descriptor.write().await = fields;
        Ok(())
    }

    async fn load_event_types(&self) -> Result<(), SessionError> {
        let types = self.api.list_event_types().await?;
        tracing::info!(count = types.len(), "Event types loaded");

        self.cache.write().await.event_types.replace_all(types);
        publish(&self.events_tx, SessionEvent::CacheUpdated(CacheScope::EventTypes));
        Ok(())
    }

    async fn load_scenario(&self) -> Result<(), SessionError> {
        let scenario = match self.config.scenario_id {
            Some(id) => self.api.get_scenario(id).await?,
            None => match self.api.list_scenarios().await?.into_iter().next() {
                Some(first) => first,
                None => {
                    tracing::info!(name = %self.config.scenario_name, "No scenario found, creating one");
                    let body = CreateScenario {
                        name: self.config.scenario_name.clone(),
                    };
                    self.api.create_scenario(&body).await?
                }
            },
        };

        let scenario_id = scenario.id;
        let standard_phase = scenario.standard_phase;
        self.cache.write().await.scenarios.put(scenario)?;
        self.context.write().await.open_scenario(scenario_id, standard_phase);

        tracing::info!(scenario_id, "Scenario loaded");
        self.scenario_updated(scenario_id);
        Ok(())
    }

    async fn load_configuration(&self) -> Result<(), SessionError> {
        let configurations = self.api.list_configurations().await?;
        let selected = match configurations.first() {
            Some(first) => first.clone(),
            None => {
                tracing::info!("No configuration found, creating one starting now");
                let body = CreateConfiguration {
                    scenario_start_time: Utc::now().timestamp_millis(),
                    additional_properties: self.configuration_defaults().await,
                };
                self.api.create_configuration(&body).await?
            }
        };

        let configuration_id = selected.id;
        {
            let mut cache = self.cache.write().await;
            cache.configurations.replace_all(configurations);
            cache.configurations.put(selected);
        }
        self.context.write().await.configuration_id = Some(configuration_id);

        tracing::info!(configuration_id, "Configuration selected");
        self.configuration_updated(configuration_id);
        Ok(())
    }

    /// Adopt a simulation that is already running or paused.
    async fn load_simulations(&self) -> Result<(), SessionError> {
        let simulations = self.refresh_simulations().await?;
        let Some(active) = simulations
            .into_iter()
            .find(|s| s.simulation_state.is_active())
        else {
            return Ok(());
        };

        let scenario_id = self.scenario_id().await?;
        let events = {
            let cache = self.cache.read().await;
            let known = cache.scenarios.phase_ids(scenario_id)?;
            let phases: Vec<EntityId> = active
                .selected_phase_ids
                .iter()
                .copied()
                .filter(|id| known.contains(id))
                .collect();
            cache.scenarios.sorted_events(scenario_id, &phases)?
        };

        let status = {
            let mut playback = self.playback.write().await;
            playback.resume(&active, events)?;
            playback.status()
        };
        self.context.write().await.speed = active.speed;

        tracing::info!(simulation_id = active.id, %status, "Adopted active simulation");
        publish(
            &self.events_tx,
            SessionEvent::StatusChanged {
                simulation_id: Some(active.id),
                status,
            },
        );
        self.start_poller(scenario_id).await;
        Ok(())
    }

    // ---- private helpers ----

    async fn scenario_id(&self) -> Result<EntityId, SessionError> {
        self.context
            .read()
            .await
            .scenario_id
            .ok_or(SessionError::NoScenario)
    }

    async fn active_simulation_id(&self) -> Result<EntityId, SessionError> {
        let playback = self.playback.read().await;
        playback
            .simulation_id()
            .filter(|_| playback.status().is_active())
            .ok_or(SessionError::NoActiveSimulation)
    }

    async fn validate_event(&self, body: &CreateEvent) -> Result<(), SessionError> {
        let cache = self.cache.read().await;
        let event_type = cache.event_types.get(&body.event_type).ok_or_else(|| {
            CoreError::Validation(format!("Unknown event type {:?}", body.event_type))
        })?;
        validate_event_data(&event_type, &body.data)?;
        Ok(())
    }

    async fn validate_configuration(&self, body: &CreateConfiguration) -> Result<(), SessionError> {
        let descriptor = self.configuration_descriptor.read().await;
        validate_configuration_properties(&descriptor, &body.additional_properties)?;
        Ok(())
    }

    /// Replace any previous poller with one for `scenario_id`.
    async fn start_poller(&self, scenario_id: EntityId) {
        let handle = spawn_poller(
            Arc::new(self.api.clone()),
            self.playback.clone(),
            self.cache.clone(),
            scenario_id,
            self.config.poll_interval,
            self.events_tx.clone(),
        );
        if let Some(previous) = self.poller.lock().await.replace(handle) {
            previous.cancel();
        }
    }

    async fn cancel_poller(&self) {
        let Some(handle) = self.poller.lock().await.take() else {
            return;
        };
        handle.cancel();
        if tokio::time::timeout(POLLER_SHUTDOWN_TIMEOUT, handle.join())
            .await
            .is_err()
        {
            tracing::warn!("Simulation poller did not exit in time");
        }
    }

    fn scenario_updated(&self, scenario_id: EntityId) {
        publish(
            &self.events_tx,
            SessionEvent::CacheUpdated(CacheScope::Scenario { scenario_id }),
        );
    }

    fn configuration_updated(&self, configuration_id: EntityId) {
        publish(
            &self.events_tx,
            SessionEvent::CacheUpdated(CacheScope::Configuration { configuration_id }),
        );
    }
}
