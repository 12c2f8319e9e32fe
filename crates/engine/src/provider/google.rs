use async_trait::async_trait;
use geofield_api::PlacesClient;
use geofield_types::{DetailsResponse, PredictionQuery, PredictionResponse};

use super::{PlacesError, PlacesService};

/// [`PlacesService`] backed by the Google Places web service.
#[derive(Debug, Clone)]
pub struct GooglePlacesService {
    client: PlacesClient,
}

impl GooglePlacesService {
    pub fn new(client: PlacesClient) -> Self {
        Self { client }
    }

    /// Build a client from `GOOGLE_PLACES_API_KEY` and `GOOGLE_PLACES_API_BASE`.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(PlacesClient::new_from_env()?))
    }
}

#[async_trait]
impl PlacesService for GooglePlacesService {
    async fn get_place_predictions(&self, query: &PredictionQuery) -> Result<PredictionResponse, PlacesError> {
        self.client
            .autocomplete(query)
            .await
            .map_err(|error| PlacesError::transport(format!("{error:#}")))
    }

    async fn get_details(&self, place_id: &str) -> Result<DetailsResponse, PlacesError> {
        self.client
            .details(place_id)
            .await
            .map_err(|error| PlacesError::transport(format!("{error:#}")))
    }
}
