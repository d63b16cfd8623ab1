//! Hydrated event records and write payloads.
//!
//! A raw feed record is hydrated into an [`EventRecord`] variant selected by
//! the wire `type` tag. The variants share one [`EventBody`] by composition;
//! there is no base-reader hierarchy to subclass. Hydration is deliberately
//! lenient: a record with an id but missing or malformed fields still
//! produces a usable body, because provider data is canonical and a single
//! odd record must never abort a sync pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::{GraphCalError, Result};
use crate::types::enums::{ChangeType, EventType, FreeBusyStatus, Sensitivity};

/// Date/time with the vendor's split timezone representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn new(date_time: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self { date_time: date_time.into(), time_zone: Some(time_zone.into()) }
    }
}

/// Typed value of a single extended property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

/// Explicit key/value map for vendor extension properties.
///
/// Keys are validated at insertion; there is no dynamic catch-all accessor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtendedProperties(BTreeMap<String, PropertyValue>);

impl ExtendedProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property. The key must be non-empty and free of whitespace,
    /// matching the vendor's property-id grammar.
    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) -> Result<()> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(GraphCalError::InvalidInput(
                "extended property key must be non-empty".into(),
            ));
        }
        if key.chars().any(char::is_whitespace) {
            return Err(GraphCalError::InvalidInput(format!(
                "extended property key '{key}' contains whitespace"
            )));
        }
        self.0.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Shared body of a hydrated calendar event.
///
/// All fields other than the id are optional or defaulted so that a sparse
/// record still hydrates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventBody {
    pub id: String,
    pub subject: Option<String>,
    pub body_preview: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
    pub is_all_day: bool,
    pub series_master_id: Option<String>,
    pub show_as: FreeBusyStatus,
    pub sensitivity: Sensitivity,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "ExtendedProperties::is_empty")]
    pub extensions: ExtendedProperties,
}

/// Hydrated representation of one raw feed record, selected by the wire
/// `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum EventRecord {
    /// A standalone event, or an exception materialized as one.
    Single(EventBody),
    /// One occurrence of a recurring series.
    Occurrence(EventBody),
    /// The master record of a recurring series.
    SeriesMaster(EventBody),
    /// A delta-feed removal notice; carries no body.
    Removed { id: String, reason: Option<ChangeType> },
}

impl EventRecord {
    /// Hydrate a raw JSON record.
    ///
    /// Returns `None` when the record carries no id at all; such records
    /// cannot be correlated to anything and the caller skips them. Records
    /// whose remaining fields fail to parse fall back to a minimal body.
    pub fn hydrate(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(Value::as_str)?.to_string();

        if let Some(removed) = value.get("@removed") {
            let reason =
                removed.get("reason").and_then(Value::as_str).and_then(ChangeType::parse);
            return Some(Self::Removed { id, reason });
        }

        let mut body: EventBody =
            serde_json::from_value(value.clone()).unwrap_or_default();
        body.id = id;

        let event_type = value
            .get("type")
            .and_then(Value::as_str)
            .and_then(EventType::parse)
            .unwrap_or_default();

        Some(match event_type {
            EventType::SingleInstance | EventType::Exception => Self::Single(body),
            EventType::Occurrence => Self::Occurrence(body),
            EventType::SeriesMaster => Self::SeriesMaster(body),
        })
    }

    /// Remote id of the record.
    pub fn id(&self) -> &str {
        match self {
            Self::Single(body) | Self::Occurrence(body) | Self::SeriesMaster(body) => &body.id,
            Self::Removed { id, .. } => id,
        }
    }

    /// The type tag this record was selected by.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Single(_) => EventType::SingleInstance,
            Self::Occurrence(_) => EventType::Occurrence,
            Self::SeriesMaster(_) => EventType::SeriesMaster,
            Self::Removed { .. } => EventType::SingleInstance,
        }
    }

    /// Body of the record, when it carries one.
    pub fn body(&self) -> Option<&EventBody> {
        match self {
            Self::Single(body) | Self::Occurrence(body) | Self::SeriesMaster(body) => Some(body),
            Self::Removed { .. } => None,
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }

    pub fn is_occurrence(&self) -> bool {
        matches!(self, Self::Occurrence(_))
    }
}

/// JSON-serializable payload of a pending create/update.
///
/// Field names mirror [`EventBody`], so a payload written out and read back
/// through a success response compares field-for-field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    pub is_all_day: bool,
    pub show_as: FreeBusyStatus,
    pub sensitivity: Sensitivity,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "ExtendedProperties::is_empty")]
    pub extensions: ExtendedProperties,
}

impl EventPayload {
    /// Serialize the payload to its wire form.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
