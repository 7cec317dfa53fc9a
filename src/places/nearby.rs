//! Category searches feeding one append-only place list.
//!
//! A search cycle fans out one request per category and appends each
//! category's results as soon as they arrive. Requests cannot be cancelled,
//! so every append goes through a `LivenessToken`: the sink only accepts
//! writes from the current cycle while the owner is still attached.

use crate::{
    core::{config::NearbyConfig, geo::LatLng, lifecycle::MapHandle},
    places::{NearbyPlace, PlaceCategory},
    provider::{NearbySearchRequest, PlaceResult},
    runtime::{self, AsyncHandle},
    traits::PlaceSearch,
};
use futures::future::join_all;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct SinkState {
    generation: u64,
    live: bool,
    places: Vec<NearbyPlace>,
    revision: u64,
}

/// Write permission for one search cycle.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    sink: Arc<Mutex<SinkState>>,
    generation: u64,
}

impl LivenessToken {
    pub fn is_live(&self) -> bool {
        self.sink
            .lock()
            .map(|s| s.live && s.generation == self.generation)
            .unwrap_or(false)
    }

    /// Appends when still live; the check and the write share one lock.
    fn append(&self, places: Vec<NearbyPlace>) -> bool {
        let Ok(mut sink) = self.sink.lock() else {
            return false;
        };
        if !sink.live || sink.generation != self.generation {
            return false;
        }
        sink.places.extend(places);
        sink.revision += 1;
        true
    }
}

/// Per-category result of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CategoryOutcome {
    Appended(usize),
    Failed,
    Discarded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub appended: usize,
    /// Labels of categories whose search failed
    pub failed: Vec<String>,
    /// Categories that answered after the cycle was invalidated
    pub discarded: usize,
}

/// One dispatched round of category searches.
pub struct SearchCycle {
    search: Arc<dyn PlaceSearch>,
    center: LatLng,
    radius_m: u32,
    top_n: usize,
    categories: Vec<PlaceCategory>,
    token: LivenessToken,
    started: instant::Instant,
}

impl SearchCycle {
    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn token(&self) -> &LivenessToken {
        &self.token
    }

    /// Run every category concurrently. Completes when all have answered.
    pub async fn run(self) -> CycleSummary {
        let outcomes = join_all(
            self.categories
                .iter()
                .map(|category| self.run_category(category)),
        )
        .await;

        let mut summary = CycleSummary::default();
        for (category, outcome) in self.categories.iter().zip(outcomes) {
            match outcome {
                CategoryOutcome::Appended(n) => summary.appended += n,
                CategoryOutcome::Failed => summary.failed.push(category.label.clone()),
                CategoryOutcome::Discarded => summary.discarded += 1,
            }
        }
        log::debug!(
            "nearby search around {} finished in {:?}: {} places, {} failed, {} discarded",
            self.center,
            self.started.elapsed(),
            summary.appended,
            summary.failed.len(),
            summary.discarded
        );
        summary
    }

    async fn run_category(&self, category: &PlaceCategory) -> CategoryOutcome {
        let request = NearbySearchRequest {
            location: self.center,
            radius_m: self.radius_m,
            category: category.kind.clone(),
        };

        let response = match self.search.nearby_search(&request).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("nearby search for {} failed: {}", category.label, e);
                return CategoryOutcome::Failed;
            }
        };
        if !response.status.is_success() {
            log::warn!(
                "nearby search for {} returned {:?}",
                category.label,
                response.status
            );
            return CategoryOutcome::Failed;
        }

        let places: Vec<NearbyPlace> = response
            .results
            .into_iter()
            .take(self.top_n)
            .map(|place| to_nearby(place, category, self.center))
            .collect();
        let count = places.len();

        if self.token.append(places) {
            CategoryOutcome::Appended(count)
        } else {
            log::debug!("dropping late {} results", category.label);
            CategoryOutcome::Discarded
        }
    }
}

fn to_nearby(place: PlaceResult, category: &PlaceCategory, center: LatLng) -> NearbyPlace {
    NearbyPlace {
        distance_m: center.distance_to(&place.location),
        name: place.name,
        position: place.location,
        category: category.label.clone(),
        rating: place.rating,
        vicinity: place.vicinity,
    }
}

/// Gathers nearby places for the map owned by one view.
pub struct NearbyPlaces {
    search: Arc<dyn PlaceSearch>,
    config: NearbyConfig,
    sink: Arc<Mutex<SinkState>>,
}

impl NearbyPlaces {
    pub fn new(search: Arc<dyn PlaceSearch>, config: NearbyConfig) -> Self {
        Self {
            search,
            config,
            sink: Arc::new(Mutex::new(SinkState::default())),
        }
    }

    /// Start a new cycle: clears the list and invalidates older cycles.
    ///
    /// Returns `None` when there is no ready map, no usable center, or the
    /// enrichment is disabled. `center` defaults to the map's own center.
    pub fn search(&mut self, handle: Option<&MapHandle>, center: Option<LatLng>) -> Option<SearchCycle> {
        if !self.config.enabled || self.config.categories.is_empty() {
            return None;
        }
        let handle = handle?;
        let center = center.unwrap_or_else(|| handle.center());
        if center.is_unknown() || !center.is_valid() {
            return None;
        }

        let generation = {
            let mut sink = self.sink.lock().ok()?;
            sink.generation += 1;
            sink.live = true;
            sink.places.clear();
            sink.revision += 1;
            sink.generation
        };

        log::debug!(
            "nearby search #{} around {} for {} categories",
            generation,
            center,
            self.config.categories.len()
        );

        Some(SearchCycle {
            search: self.search.clone(),
            center,
            radius_m: self.config.radius_m,
            top_n: self.config.top_n,
            categories: self.config.categories.clone(),
            token: LivenessToken {
                sink: self.sink.clone(),
                generation,
            },
            started: instant::Instant::now(),
        })
    }

    /// Start a cycle and drive it on the crate runtime.
    ///
    /// Without a usable runtime nothing is started and the current places
    /// are kept; use `search` and drive the cycle yourself instead.
    pub fn trigger_search(
        &mut self,
        handle: Option<&MapHandle>,
        center: Option<LatLng>,
    ) -> Option<Box<dyn AsyncHandle>> {
        if !runtime::available() {
            log::warn!("no async runtime reachable; nearby search not started");
            return None;
        }
        let cycle = self.search(handle, center)?;
        let spawned = runtime::spawn(async move {
            cycle.run().await;
        });
        if spawned.is_none() {
            // The cycle was dropped unrun; do not leave its cleared list live.
            self.detach();
        }
        spawned
    }

    /// Stop accepting results and drop what was gathered.
    pub fn detach(&mut self) {
        if let Ok(mut sink) = self.sink.lock() {
            sink.live = false;
            sink.generation += 1;
            if !sink.places.is_empty() {
                sink.places.clear();
                sink.revision += 1;
            }
        }
    }

    pub fn places(&self) -> Vec<NearbyPlace> {
        self.sink
            .lock()
            .map(|s| s.places.clone())
            .unwrap_or_default()
    }

    /// Bumped on every write to the list.
    pub fn revision(&self) -> u64 {
        self.sink.lock().map(|s| s.revision).unwrap_or(0)
    }

    pub fn is_live(&self) -> bool {
        self.sink.lock().map(|s| s.live).unwrap_or(false)
    }
}

impl Drop for NearbyPlaces {
    fn drop(&mut self) {
        self.detach();
    }
}
