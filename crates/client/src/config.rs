use std::time::Duration;

use scenaria_core::types::EntityId;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub backend_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Scenario to open. `None` opens the first listed scenario, or
    /// creates one when the backend has none.
    pub scenario_id: Option<EntityId>,
    /// Name used when a scenario has to be created.
    pub scenario_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080".into(),
            poll_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
            scenario_id: None,
            scenario_name: "Scenario".into(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `BACKEND_URL`          | `http://localhost:8080` |
    /// | `POLL_INTERVAL_MS`     | `1000`                  |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `SCENARIO_ID`          | unset                   |
    /// | `SCENARIO_NAME`        | `Scenario`              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend_url = lookup("BACKEND_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.backend_url);

        let poll_interval = match lookup("POLL_INTERVAL_MS") {
            Some(v) => Duration::from_millis(parse_positive("POLL_INTERVAL_MS", &v)?),
            None => defaults.poll_interval,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_positive("REQUEST_TIMEOUT_SECS", &v)?),
            None => defaults.request_timeout,
        };

        let scenario_id = lookup("SCENARIO_ID")
            .filter(|v| !v.trim().is_empty())
            .map(|v| {
                v.trim().parse::<EntityId>().map_err(|_| ConfigError::Invalid {
                    name: "SCENARIO_ID",
                    expected: "an integer id",
                    value: v.clone(),
                })
            })
            .transpose()?;

        let scenario_name = lookup("SCENARIO_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.scenario_name);

        Ok(Self {
            backend_url,
            poll_interval,
            request_timeout,
            scenario_id,
            scenario_name,
        })
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| ConfigError::Invalid {
            name,
            expected: "a positive integer",
            value: value.to_string(),
        })
}
