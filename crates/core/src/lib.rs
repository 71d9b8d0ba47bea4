//! Domain core for the scenario simulation client.
//!
//! Holds everything that does not touch the network: the wire models,
//! the in-memory entity cache, field descriptors with their validation
//! rules, and the playback state machine driven by the simulation poller.

pub mod cache;
pub mod descriptor;
pub mod error;
pub mod models;
pub mod playback;
pub mod session;
pub mod types;
