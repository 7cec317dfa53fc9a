use crate::{
    core::{
        config::InfoWindowConfig,
        geo::{BoundsAccumulator, LatLng},
        lifecycle::{HandleId, MapHandle},
    },
    layers::marker::{InfoWindowContent, MarkerMetadata, PlacedMarker, PropertyRecord},
    provider::{MarkerAnimation, MarkerOptions},
};

/// What the markers on the map should represent.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerMode {
    /// One listing at a location; the sentinel location means no marker.
    Single(LatLng),
    /// A result set, one marker per record with usable coordinates.
    Multi(Vec<PropertyRecord>),
}

/// Outcome of one `MarkerManager::sync` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub placed: usize,
    pub skipped: usize,
    pub released: usize,
    pub fitted: bool,
}

/// Owns the markers on one map and keeps them in step with the marker mode.
///
/// Every rebuild starts a new generation and releases all markers of the
/// previous one first. Markers also go away when the owning handle changes.
pub struct MarkerManager {
    info: InfoWindowConfig,
    markers: Vec<PlacedMarker>,
    owner: Option<HandleId>,
    generation: u64,
}

impl MarkerManager {
    pub fn new(info: InfoWindowConfig) -> Self {
        Self {
            info,
            markers: Vec::new(),
            owner: None,
            generation: 0,
        }
    }

    pub fn sync(&mut self, handle: Option<&MapHandle>, mode: &MarkerMode) -> SyncReport {
        let mut report = SyncReport::default();

        let Some(handle) = handle else {
            report.released = self.release_all();
            return report;
        };

        if self.owner != Some(handle.id()) {
            report.released += self.release_all();
            self.owner = Some(handle.id());
        }

        match mode {
            MarkerMode::Single(location) => self.sync_single(handle, *location, &mut report),
            MarkerMode::Multi(records) => self.rebuild(handle, records, &mut report),
        }
        report
    }

    fn sync_single(&mut self, handle: &MapHandle, location: LatLng, report: &mut SyncReport) {
        if location.is_unknown() || !location.is_valid() {
            report.released += self.release_all();
            return;
        }

        let in_place = matches!(
            self.markers.as_slice(),
            [marker] if marker.position() == location
                && *marker.metadata() == MarkerMetadata::Listing
        );
        if in_place {
            return;
        }

        report.released += self.release_all();
        self.generation += 1;

        let options = MarkerOptions {
            position: location,
            map: handle.map_id(),
            animation: Some(MarkerAnimation::Drop),
            title: None,
        };
        match PlacedMarker::place(handle, &options, MarkerMetadata::Listing, self.generation) {
            Ok(marker) => {
                self.markers.push(marker);
                report.placed = 1;
            }
            Err(e) => {
                log::warn!("could not place listing marker at {}: {}", location, e);
                report.skipped = 1;
            }
        }
    }

    fn rebuild(&mut self, handle: &MapHandle, records: &[PropertyRecord], report: &mut SyncReport) {
        report.released += self.release_all();
        self.generation += 1;

        let mut bounds = BoundsAccumulator::new();
        for record in records {
            let Some(position) = record.location() else {
                report.skipped += 1;
                continue;
            };

            let info = InfoWindowContent::for_record(record, &self.info);
            let options = MarkerOptions {
                position,
                map: handle.map_id(),
                animation: None,
                title: Some(record.title.clone()),
            };
            let metadata = MarkerMetadata::Property {
                record_id: record.id.clone(),
                info: info.clone(),
            };

            let marker = match PlacedMarker::place(handle, &options, metadata, self.generation) {
                Ok(marker) => marker,
                Err(e) => {
                    log::warn!("skipping marker for listing {}: {}", record.id, e);
                    report.skipped += 1;
                    continue;
                }
            };
            if let Err(e) = handle.provider().bind_info_window(marker.id(), &info) {
                log::warn!("info window for listing {} not bound: {}", record.id, e);
            }

            bounds.add(position);
            self.markers.push(marker);
        }

        report.placed = bounds.count();
        if let Some(bounds) = bounds.finish() {
            handle.fit_bounds(&bounds);
            report.fitted = true;
        }

        log::debug!(
            "marker rebuild #{}: {} placed, {} skipped, {} released",
            self.generation,
            report.placed,
            report.skipped,
            report.released
        );
    }

    /// Detach every tracked marker from the map.
    pub fn release_all(&mut self) -> usize {
        let released = self.markers.len();
        self.markers.clear();
        released
    }

    pub fn markers(&self) -> &[PlacedMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for MarkerManager {
    fn default() -> Self {
        Self::new(InfoWindowConfig::default())
    }
}
