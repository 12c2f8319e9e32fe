//! Autocomplete configuration shared by the engine, CLI and settings loader.
//!
//! The shape mirrors the options object accepted by the field binding:
//! a single place type, optional bias bounds, an ISO 3166-1 alpha-2 country
//! restriction, and the `strict`/`watchEnter` behaviour switches.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Place types accepted by the provider's type filter.
pub const SUPPORTED_PLACE_TYPES: &[&str] = &["geocode", "address", "establishment", "(regions)", "(cities)"];

static COUNTRY_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{2}$").expect("country code pattern"));

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Rectangular bias region handed to the provider widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    /// Whether the bounds describe a non-empty region.
    pub fn is_well_formed(&self) -> bool {
        self.south_west.lat <= self.north_east.lat && (-90.0..=90.0).contains(&self.south_west.lat) && (-90.0..=90.0).contains(&self.north_east.lat)
    }
}

/// Country restriction applied through `set_component_restrictions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRestrictions {
    pub country: String,
}

/// Options accepted by an autocomplete field.
///
/// A new value always replaces the previous one wholesale; fields that are
/// absent here clear the corresponding provider filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AutocompleteOptions {
    /// Single place type restriction (`geocode`, `establishment`, `(regions)`, `(cities)`).
    #[serde(default)]
    pub types: Option<String>,
    /// Bias results towards this region. Results outside it may still be returned.
    #[serde(default)]
    pub bounds: Option<LatLngBounds>,
    /// ISO 3166-1 alpha-2 country code, e.g. `ca`, `us`, `gb`.
    #[serde(default)]
    pub country: Option<String>,
    /// Resolve committed text through the details lookup instead of accepting the prediction description.
    #[serde(default)]
    pub strict: bool,
    /// Resolve the top prediction when the provider reports a selection without address data.
    #[serde(default)]
    pub watch_enter: bool,
}

/// Validation failures for [`AutocompleteOptions`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("unsupported place type '{0}'")]
    UnsupportedType(String),

    #[error("country '{0}' is not an ISO 3166-1 alpha-2 code")]
    InvalidCountry(String),

    #[error("bounds south-west corner must lie below the north-east corner")]
    InvalidBounds,
}

impl AutocompleteOptions {
    /// Check the option values the provider would otherwise reject at request time.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if let Some(place_type) = self.types.as_deref()
            && !SUPPORTED_PLACE_TYPES.contains(&place_type)
        {
            return Err(OptionsError::UnsupportedType(place_type.to_string()));
        }
        if let Some(country) = self.country.as_deref()
            && !COUNTRY_CODE_PATTERN.is_match(country)
        {
            return Err(OptionsError::InvalidCountry(country.to_string()));
        }
        if let Some(bounds) = self.bounds
            && !bounds.is_well_formed()
        {
            return Err(OptionsError::InvalidBounds);
        }
        Ok(())
    }

    /// Country restriction derived from `country`, passed through as given.
    pub fn component_restrictions(&self) -> Option<ComponentRestrictions> {
        self.country.as_deref().filter(|country| !country.is_empty()).map(|country| ComponentRestrictions {
            country: country.to_string(),
        })
    }

    /// Type list handed to the widget: one element when `types` is set, empty otherwise.
    pub fn type_list(&self) -> Vec<String> {
        self.types.iter().filter(|place_type| !place_type.is_empty()).cloned().collect()
    }
}
