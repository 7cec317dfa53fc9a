//! Nearby search over the provider's place web service.

use crate::{
    core::{config::NearbyConfig, geo::LatLng},
    provider::{NearbySearchRequest, NearbySearchResponse, PlaceResult, SearchStatus},
    traits::PlaceSearch,
    MapError, Result,
};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct WireResponse {
    status: SearchStatus,
    #[serde(default)]
    results: Vec<WirePlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePlace {
    name: String,
    geometry: WireGeometry,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    vicinity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireGeometry {
    location: LatLng,
}

impl From<WirePlace> for PlaceResult {
    fn from(place: WirePlace) -> Self {
        PlaceResult {
            name: place.name,
            location: place.geometry.location,
            rating: place.rating,
            vicinity: place.vicinity,
        }
    }
}

/// `PlaceSearch` backed by an HTTP nearby-search endpoint.
#[derive(Debug, Clone)]
pub struct HttpPlaceSearch {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    api_key: String,
}

impl HttpPlaceSearch {
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = reqwest::Url::parse(endpoint)
            .map_err(|e| MapError::Config(format!("invalid nearby endpoint: {}", e)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &NearbyConfig, api_key: impl Into<String>) -> Result<Self> {
        Self::new(&config.endpoint, api_key)
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl PlaceSearch for HttpPlaceSearch {
    async fn nearby_search(&self, request: &NearbySearchRequest) -> Result<NearbySearchResponse> {
        let mut query = vec![
            ("location", request.location.to_string()),
            ("radius", request.radius_m.to_string()),
            ("type", request.category.clone()),
        ];
        if !self.api_key.is_empty() {
            query.push(("key", self.api_key.clone()));
        }

        log::debug!(
            "nearby search {} around {} ({} m)",
            request.category,
            request.location,
            request.radius_m
        );

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&query)
            .send()
            .await
            .map_err(MapError::Network)?
            .error_for_status()
            .map_err(MapError::Network)?;

        let body: WireResponse = response.json().await.map_err(MapError::Network)?;
        if let Some(message) = &body.error_message {
            log::warn!("nearby search {} returned: {}", request.category, message);
        }

        Ok(NearbySearchResponse {
            status: body.status,
            results: body.results.into_iter().map(PlaceResult::from).collect(),
        })
    }
}
