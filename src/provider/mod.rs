//! Value types crossing the provider boundary, plus provider implementations.

pub mod http;
pub mod memory;

pub use http::HttpPlaceSearch;
pub use memory::{InMemoryMapProvider, InMemoryPlaceSearch};

use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// Identifier of a provider map instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub u64);

/// Identifier of a provider marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

/// The element a map is mounted into, addressed by its DOM id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerRef(String);

impl ContainerRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerAnimation {
    /// Falls from the top of the map into place
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerOptions {
    pub position: LatLng,
    pub map: MapId,
    pub animation: Option<MarkerAnimation>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbySearchRequest {
    pub location: LatLng,
    pub radius_m: u32,
    /// Provider place type, e.g. `restaurant`
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    #[serde(other)]
    UnknownError,
}

impl SearchStatus {
    /// Statuses whose result list can be used (possibly empty).
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::ZeroResults)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    pub name: String,
    pub location: LatLng,
    pub rating: Option<f32>,
    pub vicinity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbySearchResponse {
    pub status: SearchStatus,
    pub results: Vec<PlaceResult>,
}

impl NearbySearchResponse {
    pub fn ok(results: Vec<PlaceResult>) -> Self {
        let status = if results.is_empty() {
            SearchStatus::ZeroResults
        } else {
            SearchStatus::Ok
        };
        Self { status, results }
    }

    pub fn failed(status: SearchStatus) -> Self {
        Self {
            status,
            results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_provider_codes() {
        let status: SearchStatus = serde_json::from_str("\"ZERO_RESULTS\"").unwrap();
        assert_eq!(status, SearchStatus::ZeroResults);
        assert!(status.is_success());

        let status: SearchStatus = serde_json::from_str("\"NOT_A_STATUS\"").unwrap();
        assert_eq!(status, SearchStatus::UnknownError);
        assert!(!status.is_success());
    }
}
