//! # nestmap
//!
//! Interactive map integration for property listings.
//!
//! The crate loads the mapping provider's SDK once per process, keeps a map
//! instance in step with its container and target location, manages listing
//! markers (one listing or a whole result set, with bounds fitting) and
//! gathers nearby points of interest. The provider is reached through the
//! traits in [`traits`], so the same logic runs in the browser or headless.

pub mod core;
pub mod layers;
pub mod places;
pub mod prelude;
pub mod provider;
pub mod runtime;
pub mod sdk;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{MapConfig, MapProfile},
    geo::{LatLng, LatLngBounds},
    lifecycle::{HandleId, MapHandle, MapLifecycle, MapPhase},
    view::{MapStatus, MapView},
};

pub use crate::layers::{
    manager::{MarkerManager, MarkerMode, SyncReport},
    marker::{InfoWindowContent, PlacedMarker, PropertyRecord},
};

pub use crate::places::{NearbyPlace, NearbyPlaces, PlaceCategory, SearchCycle};

pub use crate::sdk::{LoadState, LoadSubscription, ScriptHost, SdkLoader};

pub use crate::traits::{MapProvider, PlaceSearch};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("Search failed with status {0}")]
    SearchStatus(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Install `env_logger` as the `log` backend, honouring `RUST_LOG`.
/// Does nothing if a logger is already set.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
