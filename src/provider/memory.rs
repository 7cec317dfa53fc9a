//! In-memory provider doubles
//!
//! These stand in for the browser SDK in tests and in the headless demo.
//! They keep enough bookkeeping to check the ownership rules: live maps per
//! container, markers left on destroyed maps, and bounds fits per map.

use crate::{
    core::geo::LatLngBounds,
    layers::marker::InfoWindowContent,
    prelude::{HashMap, HashSet},
    provider::{
        ContainerRef, MapId, MapOptions, MarkerId, MarkerOptions, NearbySearchRequest,
        NearbySearchResponse,
    },
    traits::{MapProvider, PlaceSearch},
    MapError, Result,
};
use async_trait::async_trait;
use futures::channel::oneshot;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct LiveMap {
    container: ContainerRef,
    options: MapOptions,
}

#[derive(Debug, Clone)]
struct LiveMarker {
    options: MarkerOptions,
    info: Option<InfoWindowContent>,
}

#[derive(Debug, Default)]
struct ProviderState {
    next_id: u64,
    broken_containers: HashSet<ContainerRef>,
    pending_failures: usize,
    maps: HashMap<MapId, LiveMap>,
    markers: HashMap<MarkerId, LiveMarker>,
    fits: Vec<(MapId, LatLngBounds)>,
    maps_created: usize,
    max_live_per_container: usize,
}

impl ProviderState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn live_on(&self, container: &ContainerRef) -> usize {
        self.maps
            .values()
            .filter(|m| &m.container == container)
            .count()
    }
}

/// Map provider that keeps everything in a mutex-guarded table.
#[derive(Debug, Default)]
pub struct InMemoryMapProvider {
    state: Mutex<ProviderState>,
}

impl InMemoryMapProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every construction against `container` fail until repaired.
    pub fn break_container(&self, container: &ContainerRef) {
        if let Ok(mut state) = self.state.lock() {
            state.broken_containers.insert(container.clone());
        }
    }

    pub fn repair_container(&self, container: &ContainerRef) {
        if let Ok(mut state) = self.state.lock() {
            state.broken_containers.remove(container);
        }
    }

    /// Make the next `count` map constructions throw.
    pub fn fail_next_creates(&self, count: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.pending_failures = count;
        }
    }

    pub fn live_maps(&self) -> Vec<MapId> {
        self.state
            .lock()
            .map(|s| {
                let mut ids: Vec<MapId> = s.maps.keys().copied().collect();
                ids.sort();
                ids
            })
            .unwrap_or_default()
    }

    pub fn live_maps_on(&self, container: &ContainerRef) -> usize {
        self.state
            .lock()
            .map(|s| s.live_on(container))
            .unwrap_or(0)
    }

    /// Highest number of simultaneously live maps seen on any one container.
    pub fn max_live_per_container(&self) -> usize {
        self.state
            .lock()
            .map(|s| s.max_live_per_container)
            .unwrap_or(0)
    }

    pub fn maps_created(&self) -> usize {
        self.state.lock().map(|s| s.maps_created).unwrap_or(0)
    }

    pub fn map_options(&self, map: MapId) -> Option<MapOptions> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.maps.get(&map).map(|m| m.options.clone()))
    }

    pub fn markers_on(&self, map: MapId) -> Vec<MarkerOptions> {
        self.state
            .lock()
            .map(|s| {
                s.markers
                    .values()
                    .filter(|m| m.options.map == map)
                    .map(|m| m.options.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn marker_count(&self) -> usize {
        self.state.lock().map(|s| s.markers.len()).unwrap_or(0)
    }

    /// Markers still attached to a map that no longer exists.
    pub fn dangling_markers(&self) -> usize {
        self.state
            .lock()
            .map(|s| {
                s.markers
                    .values()
                    .filter(|m| !s.maps.contains_key(&m.options.map))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn fit_calls(&self) -> Vec<(MapId, LatLngBounds)> {
        self.state.lock().map(|s| s.fits.clone()).unwrap_or_default()
    }

    /// Simulate a click: the info panel content bound to the marker, if any.
    pub fn click(&self, marker: MarkerId) -> Option<InfoWindowContent> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.markers.get(&marker).and_then(|m| m.info.clone()))
    }

    pub fn marker_ids(&self) -> Vec<MarkerId> {
        self.state
            .lock()
            .map(|s| {
                let mut ids: Vec<MarkerId> = s.markers.keys().copied().collect();
                ids.sort();
                ids
            })
            .unwrap_or_default()
    }
}

impl MapProvider for InMemoryMapProvider {
    fn create_map(&self, container: &ContainerRef, options: &MapOptions) -> Result<MapId> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| MapError::Provider("provider state poisoned".to_string()))?;

        if state.broken_containers.contains(container) {
            return Err(MapError::Container(format!("{} is not a valid container", container)).into());
        }
        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            return Err(MapError::Provider("map constructor threw".to_string()).into());
        }

        let id = MapId(state.next_id());
        state.maps.insert(
            id,
            LiveMap {
                container: container.clone(),
                options: options.clone(),
            },
        );
        state.maps_created += 1;
        let live = state.live_on(container);
        state.max_live_per_container = state.max_live_per_container.max(live);
        Ok(id)
    }

    fn destroy_map(&self, map: MapId) {
        if let Ok(mut state) = self.state.lock() {
            state.maps.remove(&map);
        }
    }

    fn create_marker(&self, options: &MarkerOptions) -> Result<MarkerId> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| MapError::Provider("provider state poisoned".to_string()))?;
        if !state.maps.contains_key(&options.map) {
            return Err(MapError::Provider(format!("map {:?} is not live", options.map)).into());
        }
        let id = MarkerId(state.next_id());
        state.markers.insert(
            id,
            LiveMarker {
                options: options.clone(),
                info: None,
            },
        );
        Ok(id)
    }

    fn remove_marker(&self, marker: MarkerId) {
        if let Ok(mut state) = self.state.lock() {
            state.markers.remove(&marker);
        }
    }

    fn bind_info_window(&self, marker: MarkerId, content: &InfoWindowContent) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| MapError::Provider("provider state poisoned".to_string()))?;
        match state.markers.get_mut(&marker) {
            Some(live) => {
                live.info = Some(content.clone());
                Ok(())
            }
            None => Err(MapError::Provider(format!("marker {:?} is not live", marker)).into()),
        }
    }

    fn fit_bounds(&self, map: MapId, bounds: &LatLngBounds) {
        if let Ok(mut state) = self.state.lock() {
            state.fits.push((map, bounds.clone()));
        }
    }
}

enum Scripted {
    Respond(NearbySearchResponse),
    TransportError(String),
}

/// Place search answering from a per-category script.
///
/// Categories without a script answer `ZERO_RESULTS`. A category can be held
/// so its answer only arrives once the returned sender fires.
#[derive(Default)]
pub struct InMemoryPlaceSearch {
    scripts: Mutex<HashMap<String, Scripted>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    requests: Mutex<Vec<NearbySearchRequest>>,
}

impl InMemoryPlaceSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, category: &str, response: NearbySearchResponse) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(category.to_string(), Scripted::Respond(response));
        }
    }

    pub fn fail(&self, category: &str, message: &str) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(
                category.to_string(),
                Scripted::TransportError(message.to_string()),
            );
        }
    }

    /// Hold the next search for `category` until the sender is fired or dropped.
    pub fn hold(&self, category: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut gates) = self.gates.lock() {
            gates.insert(category.to_string(), rx);
        }
        tx
    }

    pub fn requests(&self) -> Vec<NearbySearchRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PlaceSearch for InMemoryPlaceSearch {
    async fn nearby_search(&self, request: &NearbySearchRequest) -> Result<NearbySearchResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let gate = self
            .gates
            .lock()
            .ok()
            .and_then(|mut gates| gates.remove(&request.category));
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let scripts = self
            .scripts
            .lock()
            .map_err(|_| MapError::Provider("search state poisoned".to_string()))?;
        match scripts.get(&request.category) {
            Some(Scripted::Respond(response)) => Ok(response.clone()),
            Some(Scripted::TransportError(message)) => {
                Err(MapError::Provider(message.clone()).into())
            }
            None => Ok(NearbySearchResponse::ok(Vec::new())),
        }
    }
}
