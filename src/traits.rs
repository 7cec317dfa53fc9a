//! Seams between the map subsystem and the mapping provider
//!
//! The provider's client library is reached only through these traits so the
//! lifecycle, marker and search logic can run against the browser SDK, a web
//! service, or the in-memory doubles in `provider::memory`.

use crate::{
    core::geo::LatLngBounds,
    layers::marker::InfoWindowContent,
    provider::{
        ContainerRef, MapId, MapOptions, MarkerId, MarkerOptions, NearbySearchRequest,
        NearbySearchResponse,
    },
    Result,
};
use async_trait::async_trait;

/// Map, marker and info-window constructors exposed by the provider SDK.
pub trait MapProvider: Send + Sync {
    /// Construct a map inside `container`. Fails for a missing container or
    /// when the provider throws.
    fn create_map(&self, container: &ContainerRef, options: &MapOptions) -> Result<MapId>;

    /// Release a map. Unknown ids are ignored.
    fn destroy_map(&self, map: MapId);

    fn create_marker(&self, options: &MarkerOptions) -> Result<MarkerId>;

    /// Detach a marker from its map. Unknown ids are ignored.
    fn remove_marker(&self, marker: MarkerId);

    /// Bind an info panel that opens when the marker is clicked.
    fn bind_info_window(&self, marker: MarkerId, content: &InfoWindowContent) -> Result<()>;

    fn fit_bounds(&self, map: MapId, bounds: &LatLngBounds);
}

/// The provider's place-search capability.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// One nearby search for one category. The response status carries
    /// provider-level failures; `Err` is reserved for transport problems.
    async fn nearby_search(&self, request: &NearbySearchRequest) -> Result<NearbySearchResponse>;
}
