use nestmap::prelude::*;

/// Marker management against a live in-memory map
#[cfg(test)]
mod marker_tests {
    use super::*;

    fn ready_map() -> (Arc<InMemoryMapProvider>, MapLifecycle) {
        let provider = Arc::new(InMemoryMapProvider::new());
        let mut lifecycle = MapLifecycle::new(provider.clone(), ZoomPolicy::default());
        lifecycle.mount(ContainerRef::new("results-map"));
        lifecycle.update(LatLng::new(12.9716, 77.5946), true);
        assert!(lifecycle.is_ready());
        (provider, lifecycle)
    }

    fn listing(id: &str, lat: Option<f64>, lng: Option<f64>) -> PropertyRecord {
        PropertyRecord {
            id: id.to_string(),
            title: format!("Flat {}", id),
            address: "Jayanagar, Bengaluru".to_string(),
            price: 24000.0,
            bedrooms: 2,
            bathrooms: 2,
            latitude: lat,
            longitude: lng,
        }
    }

    #[test]
    fn rebuild_places_only_valid_records_and_fits_once() {
        let (provider, lifecycle) = ready_map();
        let handle = lifecycle.handle().unwrap();
        let mut markers = MarkerManager::default();

        let records = vec![
            listing("a", Some(12.93), Some(77.58)),
            listing("b", None, Some(77.60)),
            listing("c", Some(12.97), Some(77.64)),
            listing("d", Some(0.0), Some(0.0)),
            listing("e", Some(12.99), Some(77.55)),
        ];
        let report = markers.sync(Some(handle), &MarkerMode::Multi(records));

        assert_eq!(report.placed, 3);
        assert_eq!(report.skipped, 2);
        assert!(report.fitted);
        assert_eq!(markers.len(), 3);
        assert_eq!(provider.markers_on(handle.map_id()).len(), 3);

        let fits = provider.fit_calls();
        assert_eq!(fits.len(), 1);
        assert_eq!(fits[0].0, handle.map_id());
        assert_eq!(fits[0].1, LatLngBounds::from_coords(12.93, 77.55, 12.99, 77.64));
    }

    #[test]
    fn rebuild_leaves_no_residual_markers() {
        let (provider, lifecycle) = ready_map();
        let handle = lifecycle.handle().unwrap();
        let mut markers = MarkerManager::default();

        markers.sync(
            Some(handle),
            &MarkerMode::Multi(vec![
                listing("a", Some(12.93), Some(77.58)),
                listing("b", Some(12.94), Some(77.59)),
                listing("c", Some(12.95), Some(77.60)),
            ]),
        );
        let first_generation = markers.generation();

        let report = markers.sync(
            Some(handle),
            &MarkerMode::Multi(vec![
                listing("x", Some(12.96), Some(77.61)),
                listing("y", None, None),
            ]),
        );
        assert_eq!(report.released, 3);
        assert_eq!(report.placed, 1);
        assert_eq!(provider.marker_count(), 1);
        assert!(markers
            .markers()
            .iter()
            .all(|m| m.generation() > first_generation));
        assert_eq!(provider.fit_calls().len(), 2);
    }

    #[test]
    fn empty_rebuild_does_not_fit() {
        let (provider, lifecycle) = ready_map();
        let handle = lifecycle.handle().unwrap();
        let mut markers = MarkerManager::default();

        markers.sync(
            Some(handle),
            &MarkerMode::Multi(vec![listing("a", Some(12.93), Some(77.58))]),
        );
        let report = markers.sync(
            Some(handle),
            &MarkerMode::Multi(vec![listing("b", None, Some(77.58))]),
        );

        assert_eq!(report.placed, 0);
        assert!(!report.fitted);
        assert_eq!(provider.marker_count(), 0);
        assert_eq!(provider.fit_calls().len(), 1);
    }

    #[test]
    fn clicking_a_marker_shows_listing_details() {
        let (provider, lifecycle) = ready_map();
        let handle = lifecycle.handle().unwrap();
        let mut markers = MarkerManager::default();
        markers.sync(
            Some(handle),
            &MarkerMode::Multi(vec![listing("77", Some(12.93), Some(77.58))]),
        );

        let marker = &markers.markers()[0];
        let info = provider.click(marker.id()).expect("info window bound");
        assert_eq!(info.title, "Flat 77");
        assert_eq!(info.price, "₹24,000/month");
        assert_eq!(info.bedrooms, 2);
        assert_eq!(info.detail_url, "/property/77");

        let options = &provider.markers_on(handle.map_id())[0];
        assert_eq!(options.title.as_deref(), Some("Flat 77"));
        assert!(options.animation.is_none());
    }

    #[test]
    fn single_mode_keeps_one_dropped_marker() {
        let (provider, lifecycle) = ready_map();
        let handle = lifecycle.handle().unwrap();
        let mut markers = MarkerManager::default();
        let home = LatLng::new(12.9716, 77.5946);

        let report = markers.sync(Some(handle), &MarkerMode::Single(home));
        assert_eq!(report.placed, 1);
        let placed = markers.markers()[0].id();
        let options = &provider.markers_on(handle.map_id())[0];
        assert_eq!(options.animation, Some(MarkerAnimation::Drop));
        assert_eq!(options.position, home);

        let report = markers.sync(Some(handle), &MarkerMode::Single(home));
        assert_eq!(report, SyncReport::default());
        assert_eq!(markers.markers()[0].id(), placed);

        markers.sync(Some(handle), &MarkerMode::Single(LatLng::new(12.98, 77.60)));
        assert_eq!(provider.marker_count(), 1);
        assert_ne!(markers.markers()[0].id(), placed);
        assert!(provider.fit_calls().is_empty());
    }

    #[test]
    fn single_mode_sentinel_clears_marker() {
        let (provider, lifecycle) = ready_map();
        let handle = lifecycle.handle().unwrap();
        let mut markers = MarkerManager::default();

        markers.sync(Some(handle), &MarkerMode::Single(LatLng::new(12.97, 77.59)));
        markers.sync(Some(handle), &MarkerMode::Single(LatLng::UNKNOWN));
        assert!(markers.is_empty());
        assert_eq!(provider.marker_count(), 0);
    }

    #[test]
    fn no_handle_means_no_markers() {
        let (provider, lifecycle) = ready_map();
        let mut markers = MarkerManager::default();
        markers.sync(
            lifecycle.handle(),
            &MarkerMode::Single(LatLng::new(12.97, 77.59)),
        );

        let report = markers.sync(None, &MarkerMode::Single(LatLng::new(12.97, 77.59)));
        assert_eq!(report.released, 1);
        assert_eq!(report.placed, 0);
        assert_eq!(provider.marker_count(), 0);
    }

    #[test]
    fn markers_from_an_old_handle_are_released() {
        let (provider, mut lifecycle) = ready_map();
        let mut markers = MarkerManager::default();
        markers.sync(
            lifecycle.handle(),
            &MarkerMode::Multi(vec![listing("a", Some(12.93), Some(77.58))]),
        );
        let old_owner = markers.markers()[0].owner();

        lifecycle.retry();
        let handle = lifecycle.handle().unwrap();
        let report = markers.sync(
            Some(handle),
            &MarkerMode::Multi(vec![listing("a", Some(12.93), Some(77.58))]),
        );

        assert_eq!(report.released, 1);
        assert_ne!(markers.markers()[0].owner(), old_owner);
        assert_eq!(provider.markers_on(handle.map_id()).len(), 1);
        assert_eq!(provider.marker_count(), 1);
    }
}
