use serde::Serialize;

use crate::error::CoreError;
use crate::models::Payload;

/// Request body for `POST /scenarios/{sid}/phases/{pid}/eventSeries`.
///
/// The backend evaluates `point_in_time_function` once per event index
/// to place each generated event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventSeries {
    pub num_of_events: u32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub point_in_time_function: String,
    pub event_data: Payload,
}

impl CreateEventSeries {
    /// Reject requests the backend would refuse anyway.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.num_of_events == 0 {
            return Err(CoreError::Validation(
                "An event series needs at least one event".to_string(),
            ));
        }
        if self.point_in_time_function.trim().is_empty() {
            return Err(CoreError::Validation(
                "pointInTimeFunction must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
