//! One mounted map component: lifecycle, markers and nearby places together.
//!
//! Every path that can destroy the map handle first releases the markers and
//! detaches the nearby-place sink, so nothing outlives the map it was bound
//! to. After a successful (re)construction the last marker mode is applied
//! again.

use crate::{
    core::{
        config::MapConfig,
        constants,
        geo::LatLng,
        lifecycle::{MapLifecycle, MapPhase},
    },
    layers::manager::{MarkerManager, MarkerMode, SyncReport},
    places::{NearbyPlace, NearbyPlaces, SearchCycle},
    provider::ContainerRef,
    runtime::AsyncHandle,
    sdk::{LoadState, LoadSubscription, SdkLoader},
    traits::{MapProvider, PlaceSearch},
};
use serde::Serialize;
use std::sync::Arc;

/// What the presentation layer needs to pick a loading, error or map state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapStatus {
    pub container: Option<String>,
    #[serde(skip)]
    pub phase: MapPhase,
    pub is_ready: bool,
    pub error: Option<String>,
    /// The SDK script failed to load; terminal for this process
    pub sdk_error: bool,
    /// "Open in maps" link offered next to either error
    pub fallback_url: Option<String>,
}

/// Link that opens `location` in the provider's own maps site.
pub fn external_maps_url(location: LatLng) -> String {
    format!(
        "{}?api=1&query={},{}",
        constants::EXTERNAL_MAPS_URL,
        location.lat,
        location.lng
    )
}

pub struct MapView {
    lifecycle: MapLifecycle,
    markers: MarkerManager,
    places: NearbyPlaces,
    sdk: Option<LoadSubscription>,
    sdk_state: LoadState,
    mode: Option<MarkerMode>,
}

impl MapView {
    pub fn new(
        provider: Arc<dyn MapProvider>,
        search: Arc<dyn PlaceSearch>,
        config: MapConfig,
    ) -> Self {
        Self {
            lifecycle: MapLifecycle::new(provider, config.zoom),
            markers: MarkerManager::new(config.info_window),
            places: NearbyPlaces::new(search, config.nearby),
            sdk: None,
            sdk_state: LoadState::UNLOADED,
            mode: None,
        }
    }

    /// Subscribe to the SDK loader and pick up its current state.
    pub fn attach_sdk(&mut self, loader: &SdkLoader) -> LoadState {
        self.sdk = Some(loader.ensure_loaded());
        self.poll_sdk()
    }

    /// Take in any SDK state change since the last poll.
    pub fn poll_sdk(&mut self) -> LoadState {
        let state = match self.sdk.as_mut() {
            Some(subscription) => subscription.state(),
            None => return LoadState::UNLOADED,
        };
        if state.error && !self.sdk_state.error {
            log::warn!("map SDK failed to load; map stays unbuilt");
        }
        self.sdk_state = state;
        if state.loaded != self.lifecycle.sdk_ready() {
            self.set_sdk_ready(state.loaded);
        }
        state
    }

    pub fn set_sdk_ready(&mut self, ready: bool) {
        let location = self.lifecycle.location();
        self.apply_inputs(location, ready);
    }

    pub fn set_location(&mut self, location: LatLng) {
        let ready = self.lifecycle.sdk_ready();
        self.apply_inputs(location, ready);
    }

    fn apply_inputs(&mut self, location: LatLng, ready: bool) {
        if !self.lifecycle.inputs_changed(location, ready) {
            return;
        }
        self.release_bindings();
        self.lifecycle.update(location, ready);
        self.restore_markers();
    }

    pub fn mount(&mut self, container: ContainerRef) {
        if self.lifecycle.container() == Some(&container) && self.lifecycle.is_ready() {
            return;
        }
        self.release_bindings();
        self.lifecycle.mount(container);
        self.restore_markers();
    }

    pub fn unmount(&mut self) {
        self.release_bindings();
        self.lifecycle.unmount();
    }

    /// "Try again": rebuild the map without waiting for an input change.
    pub fn retry(&mut self) {
        self.release_bindings();
        self.lifecycle.retry();
        self.restore_markers();
    }

    pub fn set_mode(&mut self, mode: MarkerMode) -> SyncReport {
        let report = self.markers.sync(self.lifecycle.handle(), &mode);
        self.mode = Some(mode);
        report
    }

    /// Start a nearby search around the map center and spawn it.
    pub fn trigger_search(&mut self) -> Option<Box<dyn AsyncHandle>> {
        self.places.trigger_search(self.lifecycle.handle(), None)
    }

    /// Start a nearby search and hand the cycle to the caller to drive.
    pub fn search_cycle(&mut self) -> Option<SearchCycle> {
        self.places.search(self.lifecycle.handle(), None)
    }

    pub fn nearby_places(&self) -> Vec<NearbyPlace> {
        self.places.places()
    }

    pub fn places(&self) -> &NearbyPlaces {
        &self.places
    }

    pub fn markers(&self) -> &MarkerManager {
        &self.markers
    }

    pub fn lifecycle(&self) -> &MapLifecycle {
        &self.lifecycle
    }

    pub fn status(&self) -> MapStatus {
        let error = self.lifecycle.error().map(str::to_string);
        let location = self.lifecycle.location();
        let sdk_error = self.sdk_state.error;
        let fallback_url = ((error.is_some() || sdk_error) && !location.is_unknown())
            .then(|| external_maps_url(location));
        MapStatus {
            container: self.lifecycle.container().map(|c| c.id().to_string()),
            phase: self.lifecycle.phase(),
            is_ready: self.lifecycle.is_ready(),
            error,
            sdk_error,
            fallback_url,
        }
    }

    fn release_bindings(&mut self) {
        let released = self.markers.release_all();
        self.places.detach();
        if released > 0 {
            log::debug!("released {} markers ahead of map teardown", released);
        }
    }

    fn restore_markers(&mut self) {
        if let (Some(handle), Some(mode)) = (self.lifecycle.handle(), self.mode.as_ref()) {
            self.markers.sync(Some(handle), mode);
        }
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        self.unmount();
        self.sdk = None;
    }
}
