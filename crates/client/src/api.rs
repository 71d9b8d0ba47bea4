//! REST client for the simulation backend.
//!
//! Thin wrapper over [`reqwest`]: one method per backend endpoint, no
//! caching and no retries. Every request carries a fresh `x-request-id`
//! header that is also recorded on the request's tracing span.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use tracing::Instrument;
use uuid::Uuid;

use scenaria_core::descriptor::InputField;
use scenaria_core::models::{
    Configuration, CreateConfiguration, CreateEvent, CreateEventSeries, CreatePhase,
    CreateScenario, CreateSimulation, Event, EventType, Phase, Scenario, Simulation, SimulationState,
};
use scenaria_core::types::{EntityId, Millis};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl ApiError {
    /// HTTP status of a backend rejection, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// HTTP client for one backend instance.
#[derive(Debug, Clone)]
pub struct BackendApi {
    client: reqwest::Client,
    base_url: String,
}

impl BackendApi {
    /// * `base_url` - e.g. `http://host:8080`, without a trailing slash.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- event types ----

    pub async fn list_event_types(&self) -> Result<Vec<EventType>, ApiError> {
        let response = self.send(self.request(Method::GET, "/eventTypes")).await?;
        Self::parse_response(response).await
    }

    // ---- scenarios ----

    pub async fn list_scenarios(&self) -> Result<Vec<Scenario>, ApiError> {
        let response = self.send(self.request(Method::GET, "/scenarios")).await?;
        Self::parse_response(response).await
    }

    pub async fn get_scenario(&self, scenario_id: EntityId) -> Result<Scenario, ApiError> {
        let path = format!("/scenarios/{scenario_id}");
        let response = self.send(self.request(Method::GET, &path)).await?;
        Self::parse_response(response).await
    }

    /// The backend answers with the new scenario, including its
    /// freshly created standard phase.
    pub async fn create_scenario(&self, body: &CreateScenario) -> Result<Scenario, ApiError> {
        let response = self
            .send(self.request(Method::POST, "/scenarios").json(body))
            .await?;
        Self::parse_response(response).await
    }

    pub async fn delete_scenario(&self, scenario_id: EntityId) -> Result<(), ApiError> {
        let path = format!("/scenarios/{scenario_id}");
        let response = self.send(self.request(Method::DELETE, &path)).await?;
        Self::check_status(response).await
    }

    // ---- phases ----

    pub async fn list_phases(&self, scenario_id: EntityId) -> Result<Vec<Phase>, ApiError> {
        let path = format!("/scenarios/{scenario_id}/phases");
        let response = self.send(self.request(Method::GET, &path)).await?;
        Self::parse_response(response).await
    }

    pub async fn create_phase(
        &self,
        scenario_id: EntityId,
        body: &CreatePhase,
    ) -> Result<Phase, ApiError> {
        let path = format!("/scenarios/{scenario_id}/phases");
        let response = self.send(self.request(Method::POST, &path).json(body)).await?;
        Self::parse_response(response).await
    }

    pub async fn delete_phase(&self, scenario_id: EntityId, phase_id: EntityId) -> Result<(), ApiError> {
        let path = format!("/scenarios/{scenario_id}/phases/{phase_id}");
        let response = self.send(self.request(Method::DELETE, &path)).await?;
        Self::check_status(response).await
    }

    /// Delete a phase but keep its events in the standard phase.
    pub async fn discard_phase(&self, scenario_id: EntityId, phase_id: EntityId) -> Result<(), ApiError> {
        let path = format!("/scenarios/{scenario_id}/phases/{phase_id}/discard");
        let response = self.send(self.request(Method::POST, &path)).await?;
        Self::check_status(response).await
    }

    /// Move every event of a phase by `offset` milliseconds. Returns the
    /// shifted phase.
    pub async fn shift_phase(
        &self,
        scenario_id: EntityId,
        phase_id: EntityId,
        offset: Millis,
    ) -> Result<Phase, ApiError> {
        let path = format!("/scenarios/{scenario_id}/phases/{phase_id}/shift/{offset}");
        let response = self.send(self.request(Method::PATCH, &path)).await?;
        Self::parse_response(response).await
    }

    // ---- events ----

    pub async fn create_event(
        &self,
        scenario_id: EntityId,
        phase_id: EntityId,
        body: &CreateEvent,
    ) -> Result<Event, ApiError> {
        let path = format!("/scenarios/{scenario_id}/phases/{phase_id}/events");
        let response = self.send(self.request(Method::POST, &path).json(body)).await?;
        Self::parse_response(response).await
    }

    /// The backend answers with an empty body.
    pub async fn create_event_series(
        &self,
        scenario_id: EntityId,
        phase_id: EntityId,
        body: &CreateEventSeries,
    ) -> Result<(), ApiError> {
        let path = format!("/scenarios/{scenario_id}/phases/{phase_id}/eventSeries");
        let response = self.send(self.request(Method::POST, &path).json(body)).await?;
        Self::check_status(response).await
    }

    pub async fn edit_event(
        &self,
        scenario_id: EntityId,
        phase_id: EntityId,
        event_id: EntityId,
        body: &CreateEvent,
    ) -> Result<(), ApiError> {
        let path = format!("/scenarios/{scenario_id}/phases/{phase_id}/events/{event_id}");
        let response = self.send(self.request(Method::PUT, &path).json(body)).await?;
        Self::check_status(response).await
    }

    pub async fn reassign_event(
        &self,
        scenario_id: EntityId,
        from_phase: EntityId,
        event_id: EntityId,
        to_phase: EntityId,
    ) -> Result<(), ApiError> {
        let path = format!(
            "/scenarios/{scenario_id}/phases/{from_phase}/events/{event_id}/reassignToPhase/{to_phase}"
        );
        let response = self.send(self.request(Method::PATCH, &path)).await?;
        Self::check_status(response).await
    }

    pub async fn delete_event(
        &self,
        scenario_id: EntityId,
        phase_id: EntityId,
        event_id: EntityId,
    ) -> Result<(), ApiError> {
        let path = format!("/scenarios/{scenario_id}/phases/{phase_id}/events/{event_id}");
        let response = self.send(self.request(Method::DELETE, &path)).await?;
        Self::check_status(response).await
    }

    // ---- configurations ----

    pub async fn list_configurations(&self) -> Result<Vec<Configuration>, ApiError> {
        let response = self.send(self.request(Method::GET, "/configs")).await?;
        Self::parse_response(response).await
    }

    pub async fn get_configuration(&self, configuration_id: EntityId) -> Result<Configuration, ApiError> {
        let path = format!("/configs/{configuration_id}");
        let response = self.send(self.request(Method::GET, &path)).await?;
        Self::parse_response(response).await
    }

    pub async fn create_configuration(
        &self,
        body: &CreateConfiguration,
    ) -> Result<Configuration, ApiError> {
        let response = self
            .send(self.request(Method::POST, "/configs").json(body))
            .await?;
        Self::parse_response(response).await
    }

    pub async fn update_configuration(
        &self,
        configuration_id: EntityId,
        body: &CreateConfiguration,
    ) -> Result<Configuration, ApiError> {
        let path = format!("/configs/{configuration_id}");
        let response = self.send(self.request(Method::PUT, &path).json(body)).await?;
        Self::parse_response(response).await
    }

    pub async fn delete_configuration(&self, configuration_id: EntityId) -> Result<(), ApiError> {
        let path = format!("/configs/{configuration_id}");
        let response = self.send(self.request(Method::DELETE, &path)).await?;
        Self::check_status(response).await
    }

    /// Fields every configuration's `additionalProperties` may carry.
    pub async fn configuration_descriptor(&self) -> Result<Vec<InputField>, ApiError> {
        let response = self
            .send(self.request(Method::GET, "/configurationDescriptor"))
            .await?;
        Self::parse_response(response).await
    }

    // ---- simulations ----

    pub async fn list_simulations(&self, scenario_id: EntityId) -> Result<Vec<Simulation>, ApiError> {
        let path = format!("/scenarios/{scenario_id}/simulations");
        let response = self.send(self.request(Method::GET, &path)).await?;
        Self::parse_response(response).await
    }

    pub async fn create_simulation(
        &self,
        scenario_id: EntityId,
        body: &CreateSimulation,
    ) -> Result<Simulation, ApiError> {
        let path = format!("/scenarios/{scenario_id}/simulations");
        let response = self.send(self.request(Method::POST, &path).json(body)).await?;
        Self::parse_response(response).await
    }

    pub async fn play_simulation(&self, simulation_id: EntityId) -> Result<SimulationState, ApiError> {
        self.simulation_command(simulation_id, "play").await
    }

    /// Toggles between running and paused on the backend.
    pub async fn pause_simulation(&self, simulation_id: EntityId) -> Result<SimulationState, ApiError> {
        self.simulation_command(simulation_id, "pause").await
    }

    pub async fn stop_simulation(&self, simulation_id: EntityId) -> Result<SimulationState, ApiError> {
        self.simulation_command(simulation_id, "stop").await
    }

    /// Jump the simulation forward to just before `event_id`.
    pub async fn fast_forward(
        &self,
        simulation_id: EntityId,
        event_id: EntityId,
    ) -> Result<SimulationState, ApiError> {
        self.simulation_command(simulation_id, &format!("fastforward/{event_id}"))
            .await
    }

    pub async fn set_speed(&self, simulation_id: EntityId, speed: f64) -> Result<(), ApiError> {
        let path = format!("/simulations/{simulation_id}/speed");
        let response = self
            .send(self.request(Method::POST, &path).query(&[("speed", speed)]))
            .await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    async fn simulation_command(
        &self,
        simulation_id: EntityId,
        command: &str,
    ) -> Result<SimulationState, ApiError> {
        let path = format!("/simulations/{simulation_id}/{command}");
        let response = self.send(self.request(Method::POST, &path)).await?;
        Self::parse_response(response).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Attach a request id and send inside a span carrying it.
    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request_id = Uuid::new_v4();
        let request = builder
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .build()?;

        let span = tracing::debug_span!(
            "backend_request",
            %request_id,
            method = %request.method(),
            path = request.url().path(),
        );

        async {
            let response = self.client.execute(request).await;
            match &response {
                Ok(r) => tracing::debug!(status = r.status().as_u16(), "Backend responded"),
                Err(e) => tracing::warn!(error = %e, "Backend request failed"),
            }
            Ok(response?)
        }
        .instrument(span)
        .await
    }

    /// Turn a non-2xx answer into [`ApiError::Api`]. The backend puts its
    /// reason (for example why a phase cannot be deleted) in the body.
    async fn reject_failure(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => format!("<body not readable: {e}>"),
        };
        Err(ApiError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Decode the JSON entity the backend answered with.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let entity = Self::reject_failure(response).await?.json::<T>().await?;
        Ok(entity)
    }

    /// For endpoints that answer with an empty body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::reject_failure(response).await.map(drop)
    }
}
