//! Async client for the scenario simulation backend.
//!
//! Wraps the REST API, keeps the domain cache from `scenaria-core` in
//! sync with confirmed backend responses, and polls running simulations.

pub mod api;
pub mod config;
pub mod events;
pub mod poller;
pub mod session;

pub use api::{ApiError, BackendApi};
pub use config::{ClientConfig, ConfigError};
pub use events::SessionEvent;
pub use session::{Session, SessionError};
