//! Simulation configurations: a scenario start time plus free-form
//! properties shaped by the backend's configuration descriptor.

use serde::{Deserialize, Serialize};

use crate::models::{null_as_default, Payload};
use crate::types::{timestamp_from_millis, EntityId, Millis, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(rename = "configurationID")]
    pub id: EntityId,
    /// Absolute epoch milliseconds at which scenario time zero occurs.
    pub scenario_start_time: Millis,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_properties: Payload,
}

impl Configuration {
    pub fn start_time(&self) -> Option<Timestamp> {
        timestamp_from_millis(self.scenario_start_time)
    }

    /// Absolute epoch time of an event offset under this configuration.
    pub fn absolute_time(&self, point_in_time: Millis) -> Millis {
        self.scenario_start_time.saturating_add(point_in_time)
    }
}

/// Request body for `POST /configs` and `PUT /configs/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfiguration {
    pub scenario_start_time: Millis,
    pub additional_properties: Payload,
}

impl CreateConfiguration {
    pub fn into_configuration(self, id: EntityId) -> Configuration {
        Configuration {
            id,
            scenario_start_time: self.scenario_start_time,
            additional_properties: self.additional_properties,
        }
    }
}
