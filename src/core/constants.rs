//! Core constants for the listing map: zoom levels, search limits and copy.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Zoom used when the location is unknown (world view).
pub const WIDE_ZOOM: f64 = 2.0;

/// Zoom used when centering on a real listing (neighborhood scale).
pub const CLOSE_ZOOM: f64 = 15.0;

/// Message surfaced to the presentation layer when map construction fails.
pub const MAP_INIT_ERROR: &str = "Failed to load map. Please try again.";

/// Default nearby-search radius in meters.
pub const NEARBY_RADIUS_M: u32 = 1500;

/// Results kept per category after each nearby search.
pub const NEARBY_TOP_N: usize = 5;

/// Default SDK script location.
pub const SDK_SCRIPT_URL: &str = "https://maps.googleapis.com/maps/api/js";

/// Default nearby-search web endpoint.
pub const NEARBY_SEARCH_URL: &str =
    "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Fallback link for opening a location in an external maps app.
pub const EXTERNAL_MAPS_URL: &str = "https://www.google.com/maps/search/";
