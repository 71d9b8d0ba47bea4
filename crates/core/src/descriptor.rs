//! Input field descriptors and event-data validation.
//!
//! Every [`EventType`] describes its payload as an ordered list of
//! [`InputField`]s. Each variant carries only the constraints that apply
//! to its kind; validation dispatches by exhaustive match.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::models::{null_as_default, EventType, Payload};

/// Accepts absolute `http`/`https` URLs with a non-empty host part.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("valid regex"));

/// Tolerance when checking numeric values against a step size.
const STEP_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Field kinds
// ---------------------------------------------------------------------------

/// One entry of an event type's input descriptor, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputField {
    #[serde(rename = "NumericInputField")]
    Numeric(NumericField),
    #[serde(rename = "MultipleChoiceInputField")]
    MultipleChoice(MultipleChoiceField),
    #[serde(rename = "GeolocationInputField")]
    Geolocation(BasicField),
    #[serde(rename = "FileInputField")]
    File(FileField),
    #[serde(rename = "UrlInputField")]
    Url(BasicField),
    #[serde(rename = "PasswordInputField")]
    Password(BasicField),
    /// Plain text.
    #[serde(rename = "InputField")]
    Text(BasicField),
}

/// Attributes shared by kinds without extra constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicField {
    pub key: String,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericField {
    pub key: String,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub step_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceField {
    pub key: String,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// When `true` the value is one option string, otherwise a list.
    #[serde(default)]
    pub single_choice: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileField {
    pub key: String,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// File extensions without the dot; empty means any.
    #[serde(default, deserialize_with = "null_as_default")]
    pub allowed_file_types: Vec<String>,
    #[serde(default)]
    pub max_file_size: Option<i64>,
}

impl InputField {
    pub fn key(&self) -> &str {
        match self {
            Self::Numeric(f) => &f.key,
            Self::MultipleChoice(f) => &f.key,
            Self::File(f) => &f.key,
            Self::Geolocation(f) | Self::Url(f) | Self::Password(f) | Self::Text(f) => &f.key,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            Self::Numeric(f) => f.required,
            Self::MultipleChoice(f) => f.required,
            Self::File(f) => f.required,
            Self::Geolocation(f) | Self::Url(f) | Self::Password(f) | Self::Text(f) => f.required,
        }
    }

    pub fn default_value(&self) -> Option<&str> {
        match self {
            Self::Numeric(f) => f.default_value.as_deref(),
            Self::MultipleChoice(f) => f.default_value.as_deref(),
            Self::File(f) => f.default_value.as_deref(),
            Self::Geolocation(f) | Self::Url(f) | Self::Password(f) | Self::Text(f) => {
                f.default_value.as_deref()
            }
        }
    }

    /// Check a single non-null value against this field's constraints.
    pub fn validate_value(&self, value: &Value) -> Result<(), CoreError> {
        match self {
            Self::Numeric(f) => validate_numeric(f, value),
            Self::MultipleChoice(f) => validate_choice(f, value),
            Self::Geolocation(f) => validate_geolocation(&f.key, value),
            Self::File(f) => validate_file(f, value),
            Self::Url(f) => {
                let url = expect_str(&f.key, value)?;
                if URL_RE.is_match(url) {
                    Ok(())
                } else {
                    Err(invalid(&f.key, format!("'{url}' is not an http(s) URL")))
                }
            }
            Self::Password(f) | Self::Text(f) => expect_str(&f.key, value).map(|_| ()),
        }
    }

    /// The payload value this field starts with, if it declares a default.
    pub fn default_payload_value(&self) -> Option<Value> {
        let raw = self.default_value()?;
        match self {
            Self::Numeric(_) => parse_number(raw),
            Self::MultipleChoice(f) if !f.single_choice => {
                Some(Value::Array(vec![Value::String(raw.to_string())]))
            }
            _ => Some(Value::String(raw.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload-level helpers
// ---------------------------------------------------------------------------

/// Validate a payload against a list of field descriptors.
///
/// Required fields must be present and non-null. Keys the descriptor
/// does not mention are passed through untouched. `owner` names the
/// descriptor's holder in error messages.
pub fn validate_fields(fields: &[InputField], data: &Payload, owner: &str) -> Result<(), CoreError> {
    for field in fields {
        match data.get(field.key()) {
            None | Some(Value::Null) => {
                if field.is_required() {
                    return Err(CoreError::Validation(format!(
                        "Field '{}' is required for {owner}",
                        field.key(),
                    )));
                }
            }
            Some(value) => field.validate_value(value)?,
        }
    }
    Ok(())
}

/// Validate an event payload against its type's input descriptor.
pub fn validate_event_data(event_type: &EventType, data: &Payload) -> Result<(), CoreError> {
    validate_fields(
        &event_type.input_descriptor,
        data,
        &format!("event type '{}'", event_type.name),
    )
}

/// Validate a configuration's `additionalProperties` against the
/// backend's configuration descriptor.
pub fn validate_configuration_properties(
    descriptor: &[InputField],
    properties: &Payload,
) -> Result<(), CoreError> {
    validate_fields(descriptor, properties, "configurations")
}

/// Build a payload pre-filled with every default declared in `fields`.
pub fn field_defaults(fields: &[InputField]) -> Payload {
    fields
        .iter()
        .filter_map(|f| {
            f.default_payload_value()
                .map(|value| (f.key().to_string(), value))
        })
        .collect()
}

/// Defaults for a new event of `event_type`.
pub fn defaults_for(event_type: &EventType) -> Payload {
    field_defaults(&event_type.input_descriptor)
}

// ---------------------------------------------------------------------------
// Per-kind validation
// ---------------------------------------------------------------------------

fn invalid(key: &str, reason: String) -> CoreError {
    CoreError::Validation(format!("Field '{key}': {reason}"))
}

fn expect_str<'a>(key: &str, value: &'a Value) -> Result<&'a str, CoreError> {
    value
        .as_str()
        .ok_or_else(|| invalid(key, "expected a string".to_string()))
}

fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::from(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn validate_numeric(field: &NumericField, value: &Value) -> Result<(), CoreError> {
    // Form inputs may deliver numbers as strings.
    let number = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .ok_or_else(|| invalid(&field.key, "expected a number".to_string()))?;

    if let Some(min) = field.min_value {
        if number < min {
            return Err(invalid(&field.key, format!("{number} is below minimum {min}")));
        }
    }
    if let Some(max) = field.max_value {
        if number > max {
            return Err(invalid(&field.key, format!("{number} is above maximum {max}")));
        }
    }
    if let Some(step) = field.step_size.filter(|s| *s > 0.0) {
        let base = field.min_value.unwrap_or(0.0);
        let steps = (number - base) / step;
        if (steps - steps.round()).abs() > STEP_EPSILON {
            return Err(invalid(
                &field.key,
                format!("{number} is not a multiple of step {step} from {base}"),
            ));
        }
    }
    Ok(())
}

fn validate_choice(field: &MultipleChoiceField, value: &Value) -> Result<(), CoreError> {
    let check = |choice: &Value| -> Result<(), CoreError> {
        let choice = expect_str(&field.key, choice)?;
        if field.options.iter().any(|o| o == choice) {
            Ok(())
        } else {
            Err(invalid(&field.key, format!("'{choice}' is not a listed option")))
        }
    };

    if field.single_choice {
        return check(value);
    }

    let choices = value
        .as_array()
        .ok_or_else(|| invalid(&field.key, "expected a list of options".to_string()))?;
    choices.iter().try_for_each(check)
}

fn validate_geolocation(key: &str, value: &Value) -> Result<(), CoreError> {
    let kind = value.get("type").and_then(Value::as_str);
    if kind != Some("Point") {
        return Err(invalid(key, "expected a GeoJSON Point".to_string()));
    }

    let coordinates: Vec<f64> = value
        .get("coordinates")
        .and_then(Value::as_array)
        .and_then(|c| c.iter().map(Value::as_f64).collect::<Option<Vec<_>>>())
        .unwrap_or_default();

    let [longitude, latitude] = coordinates[..] else {
        return Err(invalid(
            key,
            "expected exactly two numeric coordinates".to_string(),
        ));
    };

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid(key, format!("longitude {longitude} out of range")));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(invalid(key, format!("latitude {latitude} out of range")));
    }
    Ok(())
}

fn validate_file(field: &FileField, value: &Value) -> Result<(), CoreError> {
    let name = expect_str(&field.key, value)?;
    if field.allowed_file_types.is_empty() {
        return Ok(());
    }

    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let allowed = field
        .allowed_file_types
        .iter()
        .any(|t| t.trim_start_matches('.').eq_ignore_ascii_case(&extension));

    if allowed {
        Ok(())
    } else {
        Err(invalid(
            &field.key,
            format!(
                "'{name}' is not one of: {}",
                field.allowed_file_types.join(", ")
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::models::FastViewDescriptor;

    fn basic(key: &str, required: bool) -> BasicField {
        BasicField {
            key: key.into(),
            default_value: None,
            required,
        }
    }

    fn numeric(min: Option<f64>, max: Option<f64>, step: Option<f64>) -> InputField {
        InputField::Numeric(NumericField {
            key: "n".into(),
            default_value: Some("2".into()),
            required: true,
            min_value: min,
            max_value: max,
            step_size: step,
        })
    }

    fn choice(key: &str, single: bool) -> InputField {
        InputField::MultipleChoice(MultipleChoiceField {
            key: key.into(),
            default_value: Some("red".into()),
            required: false,
            single_choice: single,
            options: vec!["red".into(), "green".into()],
        })
    }

    fn event_type(fields: Vec<InputField>) -> EventType {
        EventType {
            name: "Probe".into(),
            icon: None,
            input_descriptor: fields,
            fast_view_descriptor: FastViewDescriptor::default(),
        }
    }

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn tag_names_match_backend() {
        let json = serde_json::to_value(InputField::Url(basic("link", false))).expect("serializable");
        assert_eq!(json["type"], "UrlInputField");
        assert_eq!(json["key"], "link");

        let parsed: InputField = serde_json::from_value(json!({
            "type": "InputField", "key": "text", "defaultValue": "hi", "required": false
        }))
        .expect("plain text field");
        assert_matches!(parsed, InputField::Text(ref f) if f.default_value.as_deref() == Some("hi"));
    }

    #[test]
    fn numeric_bounds() {
        let field = numeric(Some(1.0), Some(10.0), None);
        assert!(field.validate_value(&json!(1)).is_ok());
        assert!(field.validate_value(&json!(10.0)).is_ok());
        assert!(field.validate_value(&json!(0.5)).is_err());
        assert!(field.validate_value(&json!(11)).is_err());
        assert!(field.validate_value(&json!("abc")).is_err());
    }

    #[test]
    fn numeric_accepts_string_numbers() {
        let field = numeric(None, None, None);
        assert!(field.validate_value(&json!(" 4.5 ")).is_ok());
    }

    #[test]
    fn numeric_step_is_relative_to_minimum() {
        let field = numeric(Some(1.0), None, Some(2.0));
        assert!(field.validate_value(&json!(1)).is_ok());
        assert!(field.validate_value(&json!(5)).is_ok());
        assert!(field.validate_value(&json!(4)).is_err());

        let fractional = numeric(None, None, Some(0.1));
        assert!(fractional.validate_value(&json!(0.3)).is_ok());
    }

    #[test]
    fn single_choice_requires_listed_option() {
        let field = choice("c", true);
        assert!(field.validate_value(&json!("green")).is_ok());
        assert!(field.validate_value(&json!("blue")).is_err());
        assert!(field.validate_value(&json!(["red"])).is_err());
    }

    #[test]
    fn multiple_choice_checks_every_entry() {
        let field = choice("c", false);
        assert!(field.validate_value(&json!(["red", "green"])).is_ok());
        assert!(field.validate_value(&json!([])).is_ok());
        assert!(field.validate_value(&json!(["red", "blue"])).is_err());
        assert!(field.validate_value(&json!("red")).is_err());
    }

    #[test]
    fn geolocation_ranges() {
        let field = InputField::Geolocation(basic("pos", true));
        assert!(field
            .validate_value(&json!({"type": "Point", "coordinates": [8.4, 49.0]}))
            .is_ok());
        assert!(field
            .validate_value(&json!({"type": "Point", "coordinates": [181.0, 0.0]}))
            .is_err());
        assert!(field
            .validate_value(&json!({"type": "Point", "coordinates": [0.0, -91.0]}))
            .is_err());
        assert!(field
            .validate_value(&json!({"type": "Point", "coordinates": [1.0]}))
            .is_err());
        assert!(field
            .validate_value(&json!({"type": "Polygon", "coordinates": [1.0, 2.0]}))
            .is_err());
    }

    #[test]
    fn url_requires_http_scheme() {
        let field = InputField::Url(basic("u", false));
        assert!(field.validate_value(&json!("https://example.org/a?b=c")).is_ok());
        assert!(field.validate_value(&json!("http://localhost:8080")).is_ok());
        assert!(field.validate_value(&json!("ftp://example.org")).is_err());
        assert!(field.validate_value(&json!("https://")).is_err());
    }

    #[test]
    fn file_extension_must_be_allowed() {
        let field = InputField::File(FileField {
            key: "f".into(),
            default_value: None,
            required: false,
            allowed_file_types: vec!["png".into(), ".JPG".into()],
            max_file_size: Some(1024),
        });
        assert!(field.validate_value(&json!("photo.png")).is_ok());
        assert!(field.validate_value(&json!("photo.jpg")).is_ok());
        assert!(field.validate_value(&json!("notes.txt")).is_err());
        assert!(field.validate_value(&json!("noextension")).is_err());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let et = event_type(vec![
            InputField::Text(basic("title", true)),
            InputField::Password(basic("secret", false)),
        ]);

        assert!(validate_event_data(&et, &payload(json!({"title": "x"}))).is_ok());
        let err = validate_event_data(&et, &payload(json!({"title": null}))).unwrap_err();
        assert!(err.to_string().contains("title"));
        assert!(validate_event_data(&et, &payload(json!({"secret": "s"}))).is_err());
    }

    #[test]
    fn unknown_keys_pass_through() {
        let et = event_type(vec![InputField::Text(basic("title", false))]);
        assert!(validate_event_data(&et, &payload(json!({"whatever": [1, 2]}))).is_ok());
    }

    #[test]
    fn defaults_are_typed_per_kind() {
        let et = event_type(vec![
            numeric(None, None, None),
            choice("colors", false),
            choice("color", true),
            InputField::Text(basic("no_default", false)),
        ]);

        let defaults = defaults_for(&et);
        assert_eq!(defaults["n"], json!(2));
        assert_eq!(defaults["colors"], json!(["red"]));
        assert_eq!(defaults["color"], json!("red"));
        assert!(!defaults.contains_key("no_default"));
    }

    #[test]
    fn configuration_properties_use_the_same_rules() {
        let descriptor = vec![
            InputField::Url(basic("endpoint", true)),
            numeric(Some(0.0), Some(10.0), None),
        ];

        let ok = payload(json!({"endpoint": "http://bus.local/topic", "n": 3}));
        assert!(validate_configuration_properties(&descriptor, &ok).is_ok());

        let missing = payload(json!({"n": 3}));
        let err = validate_configuration_properties(&descriptor, &missing).unwrap_err();
        assert!(err.to_string().contains("endpoint"));

        let bad_url = payload(json!({"endpoint": "bus.local"}));
        assert!(validate_configuration_properties(&descriptor, &bad_url).is_err());

        assert_eq!(field_defaults(&descriptor)["n"], json!(2));
    }
}
