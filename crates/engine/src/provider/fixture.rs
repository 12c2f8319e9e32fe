//! In-memory provider backed by a fixture document.
//!
//! Fixtures are YAML (or JSON) documents of the form:
//!
//! ```yaml
//! predictions:
//!   "10 Down":
//!     - { description: "10 Downing Street, London, UK", place_id: p1 }
//! details:
//!   p1:
//!     formatted_address: "10 Downing Street, London"
//!     place_id: p1
//! latency_ms:
//!   "10 Down": 250
//! ```
//!
//! Inputs without an exact entry fall back to a case-insensitive substring
//! search over every known prediction description.

use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use geofield_types::{DetailsResponse, LookupStatus, PlaceDetails, Prediction, PredictionQuery, PredictionResponse};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use super::{PlacesError, PlacesService};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlacesFixture {
    #[serde(default)]
    pub predictions: IndexMap<String, Vec<Prediction>>,
    #[serde(default)]
    pub details: IndexMap<String, PlaceDetails>,
    /// Artificial delay before answering a predictions request, keyed by input.
    #[serde(default)]
    pub latency_ms: IndexMap<String, u64>,
    /// Artificial delay before answering a details request, keyed by place id.
    #[serde(default)]
    pub details_latency_ms: IndexMap<String, u64>,
}

#[derive(Debug, Default)]
pub struct StaticPlacesService {
    fixture: PlacesFixture,
    prediction_requests: AtomicUsize,
    details_requests: AtomicUsize,
}

impl StaticPlacesService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: PlacesFixture) -> Self {
        Self {
            fixture,
            ..Self::default()
        }
    }

    /// Load a fixture document from disk. JSON is accepted as a subset of YAML.
    pub fn from_path(path: &Path) -> Result<Self, PlacesError> {
        let display_path = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|error| PlacesError::fixture(&display_path, error.to_string()))?;
        let fixture: PlacesFixture = serde_yaml::from_str(&content).map_err(|error| PlacesError::fixture(&display_path, error.to_string()))?;
        debug!(
            path = %display_path,
            inputs = fixture.predictions.len(),
            places = fixture.details.len(),
            "places fixture loaded"
        );
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_predictions(mut self, input: impl Into<String>, predictions: Vec<Prediction>) -> Self {
        self.fixture.predictions.insert(input.into(), predictions);
        self
    }

    pub fn with_details(mut self, details: PlaceDetails) -> Self {
        self.fixture.details.insert(details.place_id.clone(), details);
        self
    }

    pub fn with_latency(mut self, input: impl Into<String>, latency: Duration) -> Self {
        self.fixture.latency_ms.insert(input.into(), latency.as_millis() as u64);
        self
    }

    pub fn with_details_latency(mut self, place_id: impl Into<String>, latency: Duration) -> Self {
        self.fixture.details_latency_ms.insert(place_id.into(), latency.as_millis() as u64);
        self
    }

    /// Number of predictions requests answered or in progress.
    pub fn prediction_requests(&self) -> usize {
        self.prediction_requests.load(Ordering::Relaxed)
    }

    pub fn details_requests(&self) -> usize {
        self.details_requests.load(Ordering::Relaxed)
    }

    fn lookup_predictions(&self, input: &str) -> Vec<Prediction> {
        if let Some(exact) = self.fixture.predictions.get(input) {
            return exact.clone();
        }
        let needle = input.to_lowercase();
        let mut matches: Vec<Prediction> = Vec::new();
        for prediction in self.fixture.predictions.values().flatten() {
            let already_listed = matches.iter().any(|existing| existing.place_id == prediction.place_id);
            if !already_listed && prediction.description.to_lowercase().contains(&needle) {
                matches.push(prediction.clone());
            }
        }
        matches
    }
}

async fn simulate_latency(latency_ms: Option<&u64>) {
    if let Some(&millis) = latency_ms
        && millis > 0
    {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[async_trait]
impl PlacesService for StaticPlacesService {
    async fn get_place_predictions(&self, query: &PredictionQuery) -> Result<PredictionResponse, PlacesError> {
        self.prediction_requests.fetch_add(1, Ordering::Relaxed);
        simulate_latency(self.fixture.latency_ms.get(&query.input)).await;
        let predictions = self.lookup_predictions(&query.input);
        if predictions.is_empty() {
            return Ok(PredictionResponse::empty(LookupStatus::ZeroResults));
        }
        Ok(PredictionResponse {
            status: LookupStatus::Ok,
            predictions: Some(predictions),
        })
    }

    async fn get_details(&self, place_id: &str) -> Result<DetailsResponse, PlacesError> {
        self.details_requests.fetch_add(1, Ordering::Relaxed);
        simulate_latency(self.fixture.details_latency_ms.get(place_id)).await;
        let response = match self.fixture.details.get(place_id) {
            Some(details) => DetailsResponse {
                status: LookupStatus::Ok,
                result: Some(details.clone()),
            },
            None => DetailsResponse {
                status: LookupStatus::NotFound,
                result: None,
            },
        };
        Ok(response)
    }
}
