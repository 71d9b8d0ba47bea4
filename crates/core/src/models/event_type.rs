//! Event types: the schema behind an event's payload and its compact
//! display rule.

use serde::{Deserialize, Serialize};

use crate::descriptor::InputField;
use crate::models::{null_as_default, Payload};

/// Schema for one kind of event. Loaded once per session and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    /// Unique key; events reference their type by this name.
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_descriptor: Vec<InputField>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fast_view_descriptor: FastViewDescriptor,
}

impl EventType {
    pub fn field(&self, key: &str) -> Option<&InputField> {
        self.input_descriptor.iter().find(|f| f.key() == key)
    }
}

/// Which payload fields to surface in compact views (tooltips, popovers).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastViewDescriptor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_keys: Vec<String>,
    #[serde(default)]
    pub media_key: Option<String>,
}

/// The compact projection of an event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FastView {
    /// `(key, value)` pairs in descriptor order.
    pub fields: Vec<(String, serde_json::Value)>,
    pub media: Option<serde_json::Value>,
}

impl FastViewDescriptor {
    /// Project `data` down to the display keys that are present.
    pub fn project(&self, data: &Payload) -> FastView {
        let fields = self
            .display_keys
            .iter()
            .filter_map(|key| data.get(key).map(|v| (key.clone(), v.clone())))
            .collect();

        let media = self
            .media_key
            .as_ref()
            .and_then(|key| data.get(key))
            .filter(|v| !v.is_null())
            .cloned();

        FastView { fields, media }
    }
}
