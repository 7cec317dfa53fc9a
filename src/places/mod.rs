//! Nearby points of interest around the map center.

pub mod nearby;

pub use nearby::{CycleSummary, LivenessToken, NearbyPlaces, SearchCycle};

use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// A category of interest and the provider place type used to search it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceCategory {
    pub label: String,
    pub kind: String,
}

impl PlaceCategory {
    pub fn new(label: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: kind.into(),
        }
    }

    pub fn dining() -> Self {
        Self::new("dining", "restaurant")
    }

    pub fn education() -> Self {
        Self::new("education", "school")
    }

    pub fn transit() -> Self {
        Self::new("transit", "transit_station")
    }

    pub fn defaults() -> Vec<Self> {
        vec![Self::dining(), Self::education(), Self::transit()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPlace {
    pub name: String,
    pub position: LatLng,
    /// Label of the category the place was found under
    pub category: String,
    pub rating: Option<f32>,
    pub vicinity: Option<String>,
    /// Straight-line distance from the search center
    pub distance_m: f64,
}
