//! Place-search provider seam.
//!
//! Modules:
//! - `fixture`: In-memory provider loaded from YAML/JSON, with optional latency
//! - `google`: Google Places web service provider
//! - `null`: Provider that never finds anything

mod fixture;
mod google;
mod null;

use std::fmt::Debug;

use async_trait::async_trait;
use geofield_types::{DetailsResponse, PredictionQuery, PredictionResponse};
use thiserror::Error;

pub use fixture::{PlacesFixture, StaticPlacesService};
pub use google::GooglePlacesService;
pub use null::NullPlacesService;

/// Asynchronous lookups offered by the place-search provider.
#[async_trait]
pub trait PlacesService: Send + Sync + Debug {
    /// Ranked candidates for free text.
    async fn get_place_predictions(&self, query: &PredictionQuery) -> Result<PredictionResponse, PlacesError>;

    /// Full record for a place identifier. Success is signalled by an `OK` status.
    async fn get_details(&self, place_id: &str) -> Result<DetailsResponse, PlacesError>;
}

/// Failures that prevent a provider from producing any response at all.
#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Fixture error: {path} - {reason}")]
    Fixture { path: String, reason: String },
}

impl PlacesError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    pub fn fixture(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fixture {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
