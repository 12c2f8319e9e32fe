//! Google Places web service client.
//!
//! Provides a lightweight client for the two lookups the autocomplete field
//! needs:
//!
//! - Place predictions for free text (`/maps/api/place/autocomplete/json`)
//! - Place details for an identifier (`/maps/api/place/details/json`)
//!
//! The API key is read from `GOOGLE_PLACES_API_KEY`. The base URL defaults to
//! the public endpoint and may be overridden with `GOOGLE_PLACES_API_BASE`,
//! which is validated before use.
//!
//! # Example
//!
//! ```ignore
//! use geofield_api::PlacesClient;
//! use geofield_types::PredictionQuery;
//!
//! let client = PlacesClient::new_from_env()?;
//! let response = client.autocomplete(&PredictionQuery::for_input("10 Down")).await?;
//! println!("{}", response.status);
//! ```

use std::{env, time::Duration};

use anyhow::{Context, Result, anyhow};
use geofield_types::{DetailsResponse, LookupStatus, PlaceDetails, PredictionQuery, PredictionResponse};
use reqwest::{Client, Url, header};
use serde_json::Value;
use tracing::debug;

pub const API_KEY_ENV: &str = "GOOGLE_PLACES_API_KEY";
pub const API_BASE_ENV: &str = "GOOGLE_PLACES_API_BASE";
pub const DEFAULT_API_BASE: &str = "https://maps.googleapis.com";

const AUTOCOMPLETE_PATH: &str = "/maps/api/place/autocomplete/json";
const DETAILS_PATH: &str = "/maps/api/place/details/json";
/// Fields requested from the details endpoint.
const DETAILS_FIELDS: &str = "address_component,formatted_address,place_id,name,geometry";

/// Allowed base domains for non-local `GOOGLE_PLACES_API_BASE` values. Subdomains are allowed.
const ALLOWED_API_DOMAINS: &[&str] = &["googleapis.com"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Thin wrapper around a configured `reqwest::Client` for Places access.
#[derive(Clone)]
pub struct PlacesClient {
    pub base_url: String,
    pub http: Client,
    api_key: String,
}

impl std::fmt::Debug for PlacesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacesClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl PlacesClient {
    /// Construct a client for `base_url` authenticated with `api_key`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let user_agent = format!("geofield/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS);
        default_headers.insert(header::USER_AGENT, header::HeaderValue::from_str(&user_agent)?);

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url,
            http,
            api_key: api_key.into(),
        })
    }

    /// Construct a client from `GOOGLE_PLACES_API_KEY` and, when set, `GOOGLE_PLACES_API_BASE`.
    pub fn new_from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("{API_KEY_ENV} is not set"))?;
        let base_url = env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.into());
        Self::new(base_url, api_key)
    }

    /// Ranked predictions for the query text.
    pub async fn autocomplete(&self, query: &PredictionQuery) -> Result<PredictionResponse> {
        let offset = query.offset.to_string();
        let body = self
            .get_json(
                AUTOCOMPLETE_PATH,
                &[("input", query.input.as_str()), ("offset", offset.as_str())],
            )
            .await?;
        parse_predictions(body)
    }

    /// Full record for a place identifier.
    pub async fn details(&self, place_id: &str) -> Result<DetailsResponse> {
        let body = self
            .get_json(DETAILS_PATH, &[("place_id", place_id), ("fields", DETAILS_FIELDS)])
            .await?;
        parse_details(body)
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%path, "places request");
        let response = self
            .http
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|error| anyhow!(error.without_url()))
            .with_context(|| format!("GET {path}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("GET {path} returned HTTP {status}"));
        }
        response
            .json::<Value>()
            .await
            .map_err(|error| anyhow!(error.without_url()))
            .with_context(|| format!("decode {path} response"))
    }
}

fn lookup_status(body: &Value) -> LookupStatus {
    body.get("status")
        .and_then(Value::as_str)
        .map(LookupStatus::from)
        .unwrap_or(LookupStatus::UnknownError)
}

/// Decode an autocomplete response body. A missing prediction list is preserved as `None`.
pub fn parse_predictions(body: Value) -> Result<PredictionResponse> {
    let status = lookup_status(&body);
    let predictions = match body.get("predictions") {
        Some(Value::Null) | None => None,
        Some(list) => Some(serde_json::from_value(list.clone()).context("decode predictions")?),
    };
    Ok(PredictionResponse { status, predictions })
}

/// Decode a details response body, keeping the provider's record in `raw`.
pub fn parse_details(body: Value) -> Result<DetailsResponse> {
    let status = lookup_status(&body);
    let result = match body.get("result") {
        Some(Value::Null) | None => None,
        Some(record) => {
            let mut details: PlaceDetails = serde_json::from_value(record.clone()).context("decode place details")?;
            details.raw = record.clone();
            Some(details)
        }
    };
    Ok(DetailsResponse { status, result })
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and host must be `googleapis.com` or a subdomain
fn validate_base_url(base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid {API_BASE_ENV} URL '{}': {}", base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("{API_BASE_ENV} must include a host"))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "{API_BASE_ENV} must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        ));
    }

    let is_allowed_domain = ALLOWED_API_DOMAINS.iter().any(|&allowed_domain| {
        host_name.eq_ignore_ascii_case(allowed_domain) || host_name.ends_with(&format!(".{}", allowed_domain))
    });
    if !is_allowed_domain {
        return Err(anyhow!(
            "{API_BASE_ENV} host '{}' is not allowed; must be one of {:?} or a subdomain, or localhost",
            host_name,
            ALLOWED_API_DOMAINS
        ));
    }

    Ok(())
}
