use async_trait::async_trait;
use geofield_types::{DetailsResponse, LookupStatus, PredictionQuery, PredictionResponse};

use super::{PlacesError, PlacesService};

#[derive(Debug, Default)]
pub struct NullPlacesService;

#[async_trait]
impl PlacesService for NullPlacesService {
    async fn get_place_predictions(&self, _query: &PredictionQuery) -> Result<PredictionResponse, PlacesError> {
        Ok(PredictionResponse::empty(LookupStatus::ZeroResults))
    }

    async fn get_details(&self, _place_id: &str) -> Result<DetailsResponse, PlacesError> {
        Ok(DetailsResponse {
            status: LookupStatus::NotFound,
            result: None,
        })
    }
}
