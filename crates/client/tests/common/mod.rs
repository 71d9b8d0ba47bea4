//! In-process stand-in for the simulation backend.
//!
//! Serves the REST endpoints the client uses from an in-memory state that
//! tests can inspect and mutate directly.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use scenaria_client::{BackendApi, ClientConfig, SessionEvent};
use scenaria_core::descriptor::InputField;
use scenaria_core::models::{
    Configuration, Event, EventType, Payload, Phase, Scenario, Simulation, SimulationState,
};
use scenaria_core::types::EntityId;

type Rejection = (StatusCode, String);
type MockResult<T> = Result<Json<T>, Rejection>;

pub const SCENARIO_ID: EntityId = 1;
pub const STANDARD_PHASE: EntityId = 10;
pub const EVACUATION_PHASE: EntityId = 11;
pub const CONFIGURATION_ID: EntityId = 5;
pub const START_TIME: i64 = 1_700_000_000_000;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MockState {
    pub event_types: Vec<EventType>,
    pub scenarios: Vec<Scenario>,
    pub configurations: Vec<Configuration>,
    /// `(scenario_id, simulation)` pairs.
    pub simulations: Vec<(EntityId, Simulation)>,
    /// `x-request-id` header of every request, in arrival order.
    pub request_ids: Vec<Option<String>>,
    pub configuration_descriptor: Vec<InputField>,
    pub fail_play: bool,
    next_id: EntityId,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            event_types: Vec::new(),
            scenarios: Vec::new(),
            configurations: Vec::new(),
            simulations: Vec::new(),
            request_ids: Vec::new(),
            configuration_descriptor: Vec::new(),
            fail_play: false,
            next_id: 1000,
        }
    }
}

impl MockState {
    /// Two event types, scenario 1 with a standard and an evacuation
    /// phase, one configuration and a configuration descriptor with one
    /// required text field.
    pub fn seeded() -> Self {
        let event_types = serde_json::from_value(json!([
            {
                "name": "Message",
                "icon": "message.png",
                "inputDescriptor": [
                    {"type": "InputField", "key": "text", "defaultValue": null, "required": true},
                    {"type": "UrlInputField", "key": "link", "defaultValue": null, "required": false}
                ],
                "fastViewDescriptor": {"displayKeys": ["text"], "mediaKey": null}
            },
            {
                "name": "Alarm",
                "icon": null,
                "inputDescriptor": [
                    {"type": "NumericInputField", "key": "level", "defaultValue": "1",
                     "required": true, "minValue": 1, "maxValue": 5, "stepSize": 1}
                ],
                "fastViewDescriptor": {"displayKeys": ["level"], "mediaKey": null}
            }
        ]))
        .expect("valid event types");

        let scenario = Scenario {
            id: SCENARIO_ID,
            name: "Flood drill".into(),
            standard_phase: STANDARD_PHASE,
            phases: vec![
                Phase {
                    id: STANDARD_PHASE,
                    name: "Standard".into(),
                    events: vec![message(100, 50, "dispatch"), message(101, 300, "all clear")],
                },
                Phase {
                    id: EVACUATION_PHASE,
                    name: "Evacuation".into(),
                    events: vec![message(102, 150, "evacuate")],
                },
            ],
        };

        Self {
            event_types,
            scenarios: vec![scenario],
            configurations: vec![Configuration {
                id: CONFIGURATION_ID,
                scenario_start_time: START_TIME,
                additional_properties: region("north"),
            }],
            configuration_descriptor: serde_json::from_value(json!([
                {"type": "InputField", "key": "region", "defaultValue": "north", "required": true}
            ]))
            .expect("valid configuration descriptor"),
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    fn scenario_mut(&mut self, scenario_id: EntityId) -> Result<&mut Scenario, Rejection> {
        self.scenarios
            .iter_mut()
            .find(|s| s.id == scenario_id)
            .ok_or_else(|| not_found("scenario", scenario_id))
    }

    fn phase_mut(&mut self, scenario_id: EntityId, phase_id: EntityId) -> Result<&mut Phase, Rejection> {
        self.scenario_mut(scenario_id)?
            .phases
            .iter_mut()
            .find(|p| p.id == phase_id)
            .ok_or_else(|| not_found("phase", phase_id))
    }

    fn simulation_mut(&mut self, simulation_id: EntityId) -> Result<&mut Simulation, Rejection> {
        self.simulations
            .iter_mut()
            .map(|(_, sim)| sim)
            .find(|sim| sim.id == simulation_id)
            .ok_or_else(|| not_found("simulation", simulation_id))
    }

    /// Set the reported state and position of a simulation.
    pub fn advance(&mut self, simulation_id: EntityId, state: SimulationState, point_in_time: i64) {
        if let Ok(sim) = self.simulation_mut(simulation_id) {
            sim.simulation_state = state;
            sim.point_in_time = point_in_time;
        }
    }

    pub fn scenario(&self, scenario_id: EntityId) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == scenario_id)
    }
}

/// Configuration properties satisfying the seeded descriptor.
pub fn region(name: &str) -> Payload {
    let mut properties = Payload::new();
    properties.insert("region".into(), json!(name));
    properties
}

pub fn message(id: EntityId, point_in_time: i64, text: &str) -> Event {
    let mut data = Payload::new();
    data.insert("text".into(), json!(text));
    Event {
        id,
        event_type: "Message".into(),
        point_in_time,
        data,
    }
}

fn not_found(entity: &str, id: EntityId) -> Rejection {
    (StatusCode::NOT_FOUND, format!("{entity} {id} not found"))
}

fn bad_request(message: impl Into<String>) -> Rejection {
    (StatusCode::BAD_REQUEST, message.into())
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    pub base_url: String,
}

impl MockBackend {
    pub async fn start(state: MockState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend");
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock")
    }

    pub fn request_count(&self) -> usize {
        self.state().request_ids.len()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            backend_url: self.base_url.clone(),
            poll_interval: Duration::from_millis(20),
            request_timeout: Duration::from_secs(5),
            ..ClientConfig::default()
        }
    }

    pub fn api(&self) -> BackendApi {
        BackendApi::new(self.base_url.clone(), Duration::from_secs(5)).expect("client builds")
    }
}

/// Wait until `pred` matches a received session event.
pub async fn wait_for(
    rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("event stream closed: {e}"),
            }
        }
    })
    .await
    .expect("expected session event in time")
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().expect("mock state lock")
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/eventTypes", get(list_event_types))
        .route("/scenarios", get(list_scenarios).post(create_scenario))
        .route("/scenarios/{sid}", get(get_scenario).delete(delete_scenario))
        .route("/scenarios/{sid}/phases", get(list_phases).post(create_phase))
        .route("/scenarios/{sid}/phases/{pid}", axum::routing::delete(delete_phase))
        .route("/scenarios/{sid}/phases/{pid}/discard", post(discard_phase))
        .route("/scenarios/{sid}/phases/{pid}/shift/{ms}", patch(shift_phase))
        .route("/scenarios/{sid}/phases/{pid}/events", post(create_event))
        .route("/scenarios/{sid}/phases/{pid}/eventSeries", post(create_event_series))
        .route(
            "/scenarios/{sid}/phases/{pid}/events/{eid}",
            put(edit_event).delete(delete_event),
        )
        .route(
            "/scenarios/{sid}/phases/{pid}/events/{eid}/reassignToPhase/{to}",
            patch(reassign_event),
        )
        .route("/configs", get(list_configurations).post(create_configuration))
        .route(
            "/configs/{id}",
            get(get_configuration)
                .put(update_configuration)
                .delete(delete_configuration),
        )
        .route("/configurationDescriptor", get(configuration_descriptor))
        .route(
            "/scenarios/{sid}/simulations",
            get(list_simulations).post(create_simulation),
        )
        .route("/simulations/{id}/play", post(play))
        .route("/simulations/{id}/pause", post(pause))
        .route("/simulations/{id}/stop", post(stop))
        .route("/simulations/{id}/fastforward/{eid}", post(fast_forward))
        .route("/simulations/{id}/speed", post(set_speed))
        .layer(middleware::from_fn_with_state(state.clone(), record_request_id))
        .with_state(state)
}

async fn record_request_id(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    lock(&state).request_ids.push(id);
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_event_types(State(state): State<Shared>) -> Json<Vec<EventType>> {
    let event_types = lock(&state).event_types.clone();
    Json(event_types)
}

async fn list_scenarios(State(state): State<Shared>) -> Json<Vec<Scenario>> {
    let scenarios = lock(&state).scenarios.clone();
    Json(scenarios)
}

async fn get_scenario(State(state): State<Shared>, Path(sid): Path<EntityId>) -> MockResult<Scenario> {
    let scenario = lock(&state).scenario(sid).cloned();
    scenario.map(Json).ok_or_else(|| not_found("scenario", sid))
}

async fn delete_scenario(
    State(state): State<Shared>,
    Path(sid): Path<EntityId>,
) -> Result<StatusCode, Rejection> {
    let mut state = lock(&state);
    state.scenario_mut(sid)?;
    state.scenarios.retain(|s| s.id != sid);
    state.simulations.retain(|(owner, _)| *owner != sid);
    Ok(StatusCode::OK)
}

async fn list_phases(State(state): State<Shared>, Path(sid): Path<EntityId>) -> MockResult<Vec<Phase>> {
    let phases = lock(&state).scenario(sid).map(|s| s.phases.clone());
    phases.map(Json).ok_or_else(|| not_found("scenario", sid))
}

async fn create_scenario(State(state): State<Shared>, Json(body): Json<Value>) -> MockResult<Scenario> {
    let name = body["name"].as_str().ok_or_else(|| bad_request("name missing"))?;
    let mut state = lock(&state);
    let scenario_id = state.next_id();
    let phase_id = state.next_id();
    let scenario = Scenario {
        id: scenario_id,
        name: name.to_string(),
        standard_phase: phase_id,
        phases: vec![Phase {
            id: phase_id,
            name: "Standard".into(),
            events: Vec::new(),
        }],
    };
    state.scenarios.push(scenario.clone());
    Ok(Json(scenario))
}

async fn create_phase(
    State(state): State<Shared>,
    Path(sid): Path<EntityId>,
    Json(body): Json<Value>,
) -> MockResult<Phase> {
    let name = body["name"].as_str().ok_or_else(|| bad_request("name missing"))?;
    let mut state = lock(&state);
    let phase = Phase {
        id: state.next_id(),
        name: name.to_string(),
        events: Vec::new(),
    };
    state.scenario_mut(sid)?.phases.push(phase.clone());
    Ok(Json(phase))
}

async fn delete_phase(
    State(state): State<Shared>,
    Path((sid, pid)): Path<(EntityId, EntityId)>,
) -> Result<StatusCode, Rejection> {
    let mut state = lock(&state);
    let scenario = state.scenario_mut(sid)?;
    if scenario.standard_phase == pid {
        return Err((StatusCode::FORBIDDEN, "standard phase".into()));
    }
    let before = scenario.phases.len();
    scenario.phases.retain(|p| p.id != pid);
    if scenario.phases.len() == before {
        return Err(not_found("phase", pid));
    }
    Ok(StatusCode::OK)
}

async fn discard_phase(
    State(state): State<Shared>,
    Path((sid, pid)): Path<(EntityId, EntityId)>,
) -> Result<StatusCode, Rejection> {
    let mut state = lock(&state);
    let scenario = state.scenario_mut(sid)?;
    if scenario.standard_phase == pid {
        return Err((StatusCode::FORBIDDEN, "standard phase".into()));
    }
    let index = scenario
        .phases
        .iter()
        .position(|p| p.id == pid)
        .ok_or_else(|| not_found("phase", pid))?;
    let discarded = scenario.phases.remove(index);
    let standard = scenario.standard_phase;
    if let Some(target) = scenario.phases.iter_mut().find(|p| p.id == standard) {
        target.events.extend(discarded.events);
    }
    Ok(StatusCode::OK)
}

async fn shift_phase(
    State(state): State<Shared>,
    Path((sid, pid, ms)): Path<(EntityId, EntityId, i64)>,
) -> MockResult<Phase> {
    let mut state = lock(&state);
    let phase = state.phase_mut(sid, pid)?;
    if phase.events.iter().any(|e| e.point_in_time + ms < 0) {
        return Err((StatusCode::FORBIDDEN, "shift before scenario start".into()));
    }
    for event in &mut phase.events {
        event.point_in_time += ms;
    }
    Ok(Json(phase.clone()))
}

fn event_from_body(id: EntityId, mut body: Value) -> Result<Event, Rejection> {
    body["eventID"] = json!(id);
    serde_json::from_value(body).map_err(|e| bad_request(e.to_string()))
}

async fn create_event(
    State(state): State<Shared>,
    Path((sid, pid)): Path<(EntityId, EntityId)>,
    Json(body): Json<Value>,
) -> MockResult<Event> {
    let mut state = lock(&state);
    let event = event_from_body(state.next_id(), body)?;
    state.phase_mut(sid, pid)?.events.push(event.clone());
    Ok(Json(event))
}

async fn create_event_series(
    State(state): State<Shared>,
    Path((sid, pid)): Path<(EntityId, EntityId)>,
    Json(body): Json<Value>,
) -> Result<StatusCode, Rejection> {
    let count = body["numOfEvents"]
        .as_i64()
        .ok_or_else(|| bad_request("numOfEvents missing"))?;
    let mut state = lock(&state);
    for i in 0..count {
        let id = state.next_id();
        let event = event_from_body(
            id,
            json!({
                "type": body["type"],
                "pointInTime": i * 1000,
                "data": body["eventData"],
            }),
        )?;
        state.phase_mut(sid, pid)?.events.push(event);
    }
    Ok(StatusCode::OK)
}

async fn edit_event(
    State(state): State<Shared>,
    Path((sid, pid, eid)): Path<(EntityId, EntityId, EntityId)>,
    Json(body): Json<Value>,
) -> Result<StatusCode, Rejection> {
    let updated = event_from_body(eid, body)?;
    let mut state = lock(&state);
    let event = state
        .phase_mut(sid, pid)?
        .events
        .iter_mut()
        .find(|e| e.id == eid)
        .ok_or_else(|| not_found("event", eid))?;
    *event = updated;
    Ok(StatusCode::OK)
}

async fn reassign_event(
    State(state): State<Shared>,
    Path((sid, pid, eid, to)): Path<(EntityId, EntityId, EntityId, EntityId)>,
) -> Result<StatusCode, Rejection> {
    let mut state = lock(&state);
    state.phase_mut(sid, to)?;
    let from = state.phase_mut(sid, pid)?;
    let index = from
        .events
        .iter()
        .position(|e| e.id == eid)
        .ok_or_else(|| not_found("event", eid))?;
    let event = from.events.remove(index);
    state.phase_mut(sid, to)?.events.push(event);
    Ok(StatusCode::OK)
}

async fn delete_event(
    State(state): State<Shared>,
    Path((sid, pid, eid)): Path<(EntityId, EntityId, EntityId)>,
) -> Result<StatusCode, Rejection> {
    let mut state = lock(&state);
    state.phase_mut(sid, pid)?.events.retain(|e| e.id != eid);
    Ok(StatusCode::OK)
}

async fn list_configurations(State(state): State<Shared>) -> Json<Vec<Configuration>> {
    let configurations = lock(&state).configurations.clone();
    Json(configurations)
}

async fn get_configuration(
    State(state): State<Shared>,
    Path(id): Path<EntityId>,
) -> MockResult<Configuration> {
    let configuration = lock(&state)
        .configurations
        .iter()
        .find(|c| c.id == id)
        .cloned();
    configuration
        .map(Json)
        .ok_or_else(|| not_found("configuration", id))
}

async fn delete_configuration(
    State(state): State<Shared>,
    Path(id): Path<EntityId>,
) -> Result<StatusCode, Rejection> {
    let mut state = lock(&state);
    let before = state.configurations.len();
    state.configurations.retain(|c| c.id != id);
    if state.configurations.len() == before {
        return Err(not_found("configuration", id));
    }
    Ok(StatusCode::OK)
}

async fn configuration_descriptor(State(state): State<Shared>) -> Json<Vec<InputField>> {
    let fields = lock(&state).configuration_descriptor.clone();
    Json(fields)
}

fn configuration_from_body(id: EntityId, mut body: Value) -> Result<Configuration, Rejection> {
    body["configurationID"] = json!(id);
    serde_json::from_value(body).map_err(|e| bad_request(e.to_string()))
}

async fn create_configuration(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> MockResult<Configuration> {
    let mut state = lock(&state);
    let configuration = configuration_from_body(state.next_id(), body)?;
    state.configurations.push(configuration.clone());
    Ok(Json(configuration))
}

async fn update_configuration(
    State(state): State<Shared>,
    Path(id): Path<EntityId>,
    Json(body): Json<Value>,
) -> MockResult<Configuration> {
    let updated = configuration_from_body(id, body)?;
    let mut state = lock(&state);
    let slot = state
        .configurations
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| not_found("configuration", id))?;
    *slot = updated.clone();
    Ok(Json(updated))
}

async fn list_simulations(
    State(state): State<Shared>,
    Path(sid): Path<EntityId>,
) -> Json<Vec<Simulation>> {
    let simulations = lock(&state)
        .simulations
        .iter()
        .filter(|(owner, _)| *owner == sid)
        .map(|(_, sim)| sim.clone())
        .collect();
    Json(simulations)
}

async fn create_simulation(
    State(state): State<Shared>,
    Path(sid): Path<EntityId>,
    Json(mut body): Json<Value>,
) -> MockResult<Simulation> {
    let mut state = lock(&state);
    state.scenario_mut(sid)?;
    body["simulationID"] = json!(state.next_id());
    body["simulationState"] = json!("INITIALIZED");
    body["pointInTime"] = json!(0);
    let simulation: Simulation =
        serde_json::from_value(body).map_err(|e| bad_request(e.to_string()))?;
    state.simulations.push((sid, simulation.clone()));
    Ok(Json(simulation))
}

async fn play(State(state): State<Shared>, Path(id): Path<EntityId>) -> MockResult<SimulationState> {
    let mut state = lock(&state);
    if state.fail_play {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "player unavailable".into()));
    }
    let sim = state.simulation_mut(id)?;
    sim.simulation_state = SimulationState::Running;
    Ok(Json(sim.simulation_state))
}

async fn pause(State(state): State<Shared>, Path(id): Path<EntityId>) -> MockResult<SimulationState> {
    let mut state = lock(&state);
    let sim = state.simulation_mut(id)?;
    sim.simulation_state = match sim.simulation_state {
        SimulationState::Running => SimulationState::Paused,
        SimulationState::Paused => SimulationState::Running,
        other => return Err((StatusCode::FORBIDDEN, format!("cannot pause while {other:?}"))),
    };
    Ok(Json(sim.simulation_state))
}

async fn stop(State(state): State<Shared>, Path(id): Path<EntityId>) -> MockResult<SimulationState> {
    let mut state = lock(&state);
    let sim = state.simulation_mut(id)?;
    sim.simulation_state = SimulationState::Terminated;
    Ok(Json(sim.simulation_state))
}

async fn fast_forward(
    State(state): State<Shared>,
    Path((id, eid)): Path<(EntityId, EntityId)>,
) -> MockResult<SimulationState> {
    let mut state = lock(&state);
    let target = state
        .scenarios
        .iter()
        .flat_map(|s| s.phases.iter())
        .flat_map(|p| p.events.iter())
        .find(|e| e.id == eid)
        .map(|e| e.point_in_time)
        .ok_or_else(|| not_found("event", eid))?;
    let sim = state.simulation_mut(id)?;
    sim.point_in_time = target;
    Ok(Json(sim.simulation_state))
}

#[derive(Deserialize)]
struct SpeedQuery {
    speed: f64,
}

async fn set_speed(
    State(state): State<Shared>,
    Path(id): Path<EntityId>,
    Query(query): Query<SpeedQuery>,
) -> Result<StatusCode, Rejection> {
    let mut state = lock(&state);
    state.simulation_mut(id)?.speed = query.speed;
    Ok(StatusCode::OK)
}
