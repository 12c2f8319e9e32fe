//! Place records exchanged with the place-search provider.
//!
//! Field names follow the provider's JSON payloads (`place_id`,
//! `formatted_address`, `address_components`) so the same types decode web
//! service responses and fixture files.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code attached to every provider lookup. Only [`LookupStatus::Ok`] signals success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LookupStatus {
    Ok,
    ZeroResults,
    NotFound,
    InvalidRequest,
    OverQueryLimit,
    RequestDenied,
    UnknownError,
}

impl LookupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<&str> for LookupStatus {
    fn from(code: &str) -> Self {
        match code {
            "OK" => Self::Ok,
            "ZERO_RESULTS" => Self::ZeroResults,
            "NOT_FOUND" => Self::NotFound,
            "INVALID_REQUEST" => Self::InvalidRequest,
            "OVER_QUERY_LIMIT" => Self::OverQueryLimit,
            "REQUEST_DENIED" => Self::RequestDenied,
            _ => Self::UnknownError,
        }
    }
}

impl From<String> for LookupStatus {
    fn from(code: String) -> Self {
        Self::from(code.as_str())
    }
}

impl From<LookupStatus> for String {
    fn from(status: LookupStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for LookupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lightweight ranked candidate returned before details are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub description: String,
    pub place_id: String,
}

/// One structured part of an address (street number, locality, country...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Full place record produced by a details lookup or a structured selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub formatted_address: String,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub place_id: String,
    /// Untouched provider payload.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

/// The value exposed to the host as the field's "details" output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvedPlace {
    Full(PlaceDetails),
    Lightweight { description: String },
}

impl ResolvedPlace {
    /// Text the field displays for this place.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Full(details) => &details.formatted_address,
            Self::Lightweight { description } => description,
        }
    }
}

/// Result read from the provider widget when it reports a selection.
///
/// A selection carries address components only when the user picked an entry
/// from the dropdown; pressing enter on free text yields just the `name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectedPlace {
    pub name: String,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub address_components: Option<Vec<AddressComponent>>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

impl SelectedPlace {
    /// Pseudo-result carrying only free text, as produced by an enter keypress.
    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_structured(&self) -> bool {
        self.address_components.is_some()
    }

    /// Convert a structured selection into a full record. `displayed` backs a missing formatted address.
    pub fn into_details(self, displayed: &str) -> PlaceDetails {
        PlaceDetails {
            formatted_address: self.formatted_address.unwrap_or_else(|| displayed.to_string()),
            address_components: self.address_components.unwrap_or_default(),
            place_id: self.place_id.unwrap_or_default(),
            raw: self.raw,
        }
    }
}

/// Arguments of a "get predictions" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub input: String,
    /// Character position up to which the provider matches; always the input length.
    pub offset: usize,
}

impl PredictionQuery {
    pub fn for_input(input: impl Into<String>) -> Self {
        let input = input.into();
        let offset = input.chars().count();
        Self { input, offset }
    }
}

/// Response of a "get predictions" request. An absent list and an empty list mean the same thing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub status: LookupStatus,
    #[serde(default)]
    pub predictions: Option<Vec<Prediction>>,
}

impl PredictionResponse {
    pub fn empty(status: LookupStatus) -> Self {
        Self { status, predictions: None }
    }

    /// Highest ranked candidate, if any.
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.as_ref().and_then(|list| list.first())
    }
}

/// Response of a "get details" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailsResponse {
    pub status: LookupStatus,
    #[serde(default)]
    pub result: Option<PlaceDetails>,
}
