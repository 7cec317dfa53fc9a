//! Map instance lifecycle
//!
//! `MapLifecycle` is an explicit state machine over three inputs: the target
//! location, whether the SDK is loaded, and whether a container is mounted.
//! Any change of inputs tears the current map down before a new one is built,
//! so a container never carries two live maps. Construction failures are kept
//! as state (`MapPhase::Error` plus a fixed message) and can be retried.

use crate::{
    core::{
        config::ZoomPolicy,
        constants,
        geo::{LatLng, LatLngBounds},
    },
    provider::{ContainerRef, MapId, MapOptions},
    traits::MapProvider,
};
use std::sync::Arc;

/// Generation number of a map handle; a new one is issued per construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

/// Exclusive owner of one provider map. Dropping it destroys the map.
pub struct MapHandle {
    id: HandleId,
    map: MapId,
    container: ContainerRef,
    options: MapOptions,
    provider: Arc<dyn MapProvider>,
}

impl MapHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn map_id(&self) -> MapId {
        self.map
    }

    pub fn container(&self) -> &ContainerRef {
        &self.container
    }

    pub fn center(&self) -> LatLng {
        self.options.center
    }

    pub fn zoom(&self) -> f64 {
        self.options.zoom
    }

    pub fn provider(&self) -> &Arc<dyn MapProvider> {
        &self.provider
    }

    pub fn fit_bounds(&self, bounds: &LatLngBounds) {
        self.provider.fit_bounds(self.map, bounds);
    }
}

impl std::fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapHandle")
            .field("id", &self.id)
            .field("map", &self.map)
            .field("container", &self.container)
            .field("options", &self.options)
            .finish()
    }
}

impl Drop for MapHandle {
    fn drop(&mut self) {
        log::debug!("destroying map {:?} in {}", self.map, self.container);
        self.provider.destroy_map(self.map);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPhase {
    /// No map and nothing attempted for the current inputs
    Uninitialized,
    Constructing,
    Ready,
    Error,
}

pub struct MapLifecycle {
    provider: Arc<dyn MapProvider>,
    zoom: ZoomPolicy,
    container: Option<ContainerRef>,
    location: LatLng,
    sdk_ready: bool,
    phase: MapPhase,
    handle: Option<MapHandle>,
    error: Option<String>,
    generation: u64,
}

impl MapLifecycle {
    pub fn new(provider: Arc<dyn MapProvider>, zoom: ZoomPolicy) -> Self {
        Self {
            provider,
            zoom,
            container: None,
            location: LatLng::UNKNOWN,
            sdk_ready: false,
            phase: MapPhase::Uninitialized,
            handle: None,
            error: None,
            generation: 0,
        }
    }

    pub fn container(&self) -> Option<&ContainerRef> {
        self.container.as_ref()
    }

    pub fn handle(&self) -> Option<&MapHandle> {
        self.handle.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.phase == MapPhase::Ready && self.handle.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> MapPhase {
        self.phase
    }

    pub fn location(&self) -> LatLng {
        self.location
    }

    pub fn sdk_ready(&self) -> bool {
        self.sdk_ready
    }

    /// Whether `update` with these inputs would re-run construction.
    pub fn inputs_changed(&self, location: LatLng, sdk_ready: bool) -> bool {
        self.location != location || self.sdk_ready != sdk_ready
    }

    /// Attach to a container and try to build a map in it.
    pub fn mount(&mut self, container: ContainerRef) -> bool {
        if self.container.as_ref() == Some(&container) && self.is_ready() {
            return true;
        }
        self.teardown();
        self.container = Some(container);
        self.error = None;
        self.construct()
    }

    /// Feed new inputs. Unchanged inputs are a no-op; otherwise the current
    /// map is destroyed and construction is attempted again.
    pub fn update(&mut self, location: LatLng, sdk_ready: bool) -> bool {
        if !self.inputs_changed(location, sdk_ready) {
            return self.is_ready();
        }
        log::debug!(
            "map inputs changed: location {} -> {}, sdk ready {} -> {}",
            self.location,
            location,
            self.sdk_ready,
            sdk_ready
        );
        self.location = location;
        self.sdk_ready = sdk_ready;
        self.teardown();
        self.error = None;
        self.construct()
    }

    /// User-initiated rebuild that does not wait for an input change.
    pub fn retry(&mut self) -> bool {
        self.error = None;
        if self.phase == MapPhase::Error {
            self.phase = MapPhase::Uninitialized;
        }
        if self.container.is_none() || !self.sdk_ready {
            log::debug!("retry ignored: container or SDK not available");
            return false;
        }
        self.construct()
    }

    pub fn unmount(&mut self) {
        self.teardown();
        self.container = None;
        self.error = None;
        self.phase = MapPhase::Uninitialized;
    }

    /// The single release path: drops the handle whatever state it is in.
    pub fn teardown(&mut self) -> Option<HandleId> {
        let released = self.handle.take().map(|handle| handle.id());
        if self.phase != MapPhase::Error {
            self.phase = MapPhase::Uninitialized;
        }
        released
    }

    fn construct(&mut self) -> bool {
        // A container never holds two maps: destroy before building.
        if self.handle.is_some() {
            self.teardown();
        }

        let Some(container) = self.container.clone() else {
            self.phase = MapPhase::Uninitialized;
            return false;
        };
        if !self.sdk_ready {
            self.phase = MapPhase::Uninitialized;
            return false;
        }

        self.phase = MapPhase::Constructing;
        let options = MapOptions {
            center: self.location,
            zoom: self.zoom.zoom_for(&self.location),
        };

        match self.provider.create_map(&container, &options) {
            Ok(map) => {
                self.generation += 1;
                log::info!(
                    "map {:?} ready in {} at {} (zoom {})",
                    map,
                    container,
                    options.center,
                    options.zoom
                );
                self.handle = Some(MapHandle {
                    id: HandleId(self.generation),
                    map,
                    container,
                    options,
                    provider: self.provider.clone(),
                });
                self.error = None;
                self.phase = MapPhase::Ready;
                true
            }
            Err(e) => {
                log::warn!("map construction in {} failed: {}", container, e);
                self.error = Some(constants::MAP_INIT_ERROR.to_string());
                self.phase = MapPhase::Error;
                false
            }
        }
    }
}

impl Drop for MapLifecycle {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemoryMapProvider;

    fn lifecycle() -> (Arc<InMemoryMapProvider>, MapLifecycle) {
        let provider = Arc::new(InMemoryMapProvider::new());
        let lifecycle = MapLifecycle::new(provider.clone(), ZoomPolicy::default());
        (provider, lifecycle)
    }

    #[test]
    fn waits_for_sdk_and_container() {
        let (provider, mut map) = lifecycle();
        assert!(!map.mount(ContainerRef::new("map")));
        assert_eq!(map.phase(), MapPhase::Uninitialized);
        assert_eq!(provider.maps_created(), 0);

        assert!(map.update(LatLng::new(12.97, 77.59), true));
        assert!(map.is_ready());
        assert_eq!(provider.live_maps().len(), 1);
    }

    #[test]
    fn unchanged_inputs_do_not_rebuild() {
        let (provider, mut map) = lifecycle();
        map.mount(ContainerRef::new("map"));
        map.update(LatLng::new(12.97, 77.59), true);
        let first = map.handle().map(|h| h.id());

        map.update(LatLng::new(12.97, 77.59), true);
        assert_eq!(map.handle().map(|h| h.id()), first);
        assert_eq!(provider.maps_created(), 1);
    }

    #[test]
    fn zoom_follows_sentinel_policy() {
        let (provider, mut map) = lifecycle();
        map.mount(ContainerRef::new("map"));

        map.update(LatLng::UNKNOWN, true);
        let wide = map.handle().map(|h| h.map_id()).unwrap();
        assert_eq!(
            provider.map_options(wide).unwrap().zoom,
            constants::WIDE_ZOOM
        );

        map.update(LatLng::new(18.52, 73.85), true);
        let close = map.handle().map(|h| h.map_id()).unwrap();
        assert_eq!(
            provider.map_options(close).unwrap().zoom,
            constants::CLOSE_ZOOM
        );
        assert!(provider.map_options(wide).is_none());
    }

    #[test]
    fn construction_failure_is_state_not_panic() {
        let (provider, mut map) = lifecycle();
        let container = ContainerRef::new("map");
        provider.break_container(&container);
        map.update(LatLng::new(18.52, 73.85), true);

        assert!(!map.mount(container));
        assert_eq!(map.phase(), MapPhase::Error);
        assert_eq!(map.error(), Some(constants::MAP_INIT_ERROR));
        assert!(!map.is_ready());
        assert!(map.handle().is_none());
    }

    #[test]
    fn retry_is_noop_without_container() {
        let (provider, mut map) = lifecycle();
        map.update(LatLng::new(18.52, 73.85), true);
        assert!(!map.retry());
        assert_eq!(provider.maps_created(), 0);
        assert!(map.error().is_none());
    }

    #[test]
    fn unmount_releases_map() {
        let (provider, mut map) = lifecycle();
        map.mount(ContainerRef::new("map"));
        map.update(LatLng::new(18.52, 73.85), true);
        map.unmount();

        assert!(map.handle().is_none());
        assert!(map.container().is_none());
        assert!(provider.live_maps().is_empty());
    }
}
