use nestmap::constants;
use nestmap::prelude::*;

/// Nearby-place enrichment: category isolation, truncation and liveness
#[cfg(test)]
mod nearby_tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const CENTER: LatLng = LatLng {
        lat: 12.9716,
        lng: 77.5946,
    };

    fn place(name: &str, offset: f64) -> PlaceResult {
        PlaceResult {
            name: name.to_string(),
            location: LatLng::new(CENTER.lat + offset, CENTER.lng + offset),
            rating: Some(4.0),
            vicinity: None,
        }
    }

    fn ready_view(search: Arc<InMemoryPlaceSearch>, config: MapConfig) -> MapView {
        let mut view = MapView::new(Arc::new(InMemoryMapProvider::new()), search, config);
        view.mount(ContainerRef::new("detail-map"));
        view.set_location(CENTER);
        view.set_sdk_ready(true);
        assert!(view.status().is_ready);
        view
    }

    fn dining_only() -> MapConfig {
        let mut config = MapConfig::default();
        config.nearby.categories = vec![PlaceCategory::dining()];
        config
    }

    #[tokio::test]
    async fn failing_transit_does_not_block_other_categories() {
        let search = Arc::new(InMemoryPlaceSearch::new());
        search.respond(
            "restaurant",
            NearbySearchResponse::ok(vec![place("Vidyarthi Bhavan", 0.001)]),
        );
        search.respond(
            "school",
            NearbySearchResponse::ok(vec![place("National Public School", 0.002)]),
        );
        search.fail("transit_station", "connection reset");

        let mut view = ready_view(search.clone(), MapConfig::default());
        let summary = view.search_cycle().unwrap().run().await;

        assert_eq!(summary.appended, 2);
        assert_eq!(summary.failed, vec!["transit".to_string()]);

        let places = view.nearby_places();
        let categories: Vec<&str> = places.iter().map(|p| p.category.as_str()).collect();
        assert!(categories.contains(&"dining"));
        assert!(categories.contains(&"education"));
        assert!(!categories.contains(&"transit"));
        assert!(places.iter().all(|p| p.distance_m > 0.0));

        let requests = search.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|r| r.location == CENTER && r.radius_m == constants::NEARBY_RADIUS_M));
    }

    #[tokio::test]
    async fn provider_status_failure_is_isolated() {
        let search = Arc::new(InMemoryPlaceSearch::new());
        search.respond(
            "restaurant",
            NearbySearchResponse::ok(vec![place("CTR", 0.001)]),
        );
        search.respond(
            "transit_station",
            NearbySearchResponse::failed(SearchStatus::OverQueryLimit),
        );

        let mut view = ready_view(search, MapConfig::default());
        let summary = view.search_cycle().unwrap().run().await;

        assert_eq!(summary.failed, vec!["transit".to_string()]);
        assert_eq!(view.nearby_places().len(), 1);
    }

    #[tokio::test]
    async fn each_category_is_truncated_to_top_n() {
        let search = Arc::new(InMemoryPlaceSearch::new());
        let many: Vec<PlaceResult> = (0..9)
            .map(|i| place(&format!("Cafe {}", i), 0.001 * (i + 1) as f64))
            .collect();
        search.respond("restaurant", NearbySearchResponse::ok(many));

        let mut view = ready_view(search, dining_only());
        view.search_cycle().unwrap().run().await;

        let names: Vec<String> = view.nearby_places().into_iter().map(|p| p.name).collect();
        assert_eq!(names.len(), constants::NEARBY_TOP_N);
        assert_eq!(names[0], "Cafe 0");
    }

    #[tokio::test]
    async fn teardown_before_callback_writes_nothing() {
        let search = Arc::new(InMemoryPlaceSearch::new());
        search.respond(
            "restaurant",
            NearbySearchResponse::ok(vec![place("Brahmin's Coffee Bar", 0.001)]),
        );
        let gate = search.hold("restaurant");

        let mut view = ready_view(search, dining_only());
        let task = tokio::spawn(view.search_cycle().unwrap().run());
        tokio::task::yield_now().await;

        view.unmount();
        let revision = view.places().revision();
        assert!(!view.places().is_live());

        gate.send(()).unwrap();
        let summary = task.await.unwrap();

        assert_eq!(summary.discarded, 1);
        assert_eq!(summary.appended, 0);
        assert_eq!(view.places().revision(), revision);
        assert!(view.nearby_places().is_empty());
    }

    #[tokio::test]
    async fn retrigger_discards_results_of_older_cycle() {
        let search = Arc::new(InMemoryPlaceSearch::new());
        search.respond(
            "restaurant",
            NearbySearchResponse::ok(vec![place("MTR", 0.001)]),
        );
        let gate = search.hold("restaurant");

        let mut view = ready_view(search, dining_only());
        let stale = tokio::spawn(view.search_cycle().unwrap().run());
        let fresh = view.search_cycle().unwrap();

        gate.send(()).unwrap();
        assert_eq!(stale.await.unwrap().discarded, 1);
        assert!(view.nearby_places().is_empty());

        assert_eq!(fresh.run().await.appended, 1);
        assert_eq!(view.nearby_places().len(), 1);
    }

    #[tokio::test]
    async fn no_search_without_ready_map_or_center() {
        let search = Arc::new(InMemoryPlaceSearch::new());
        let mut view = MapView::new(
            Arc::new(InMemoryMapProvider::new()),
            search.clone(),
            MapConfig::default(),
        );
        assert!(view.search_cycle().is_none());

        view.mount(ContainerRef::new("detail-map"));
        view.set_sdk_ready(true);
        // map is up, but centered on the unknown location
        assert!(view.status().is_ready);
        assert!(view.search_cycle().is_none());

        let mut results = MapView::new(
            Arc::new(InMemoryMapProvider::new()),
            search.clone(),
            MapProfile::SearchResults.resolve(),
        );
        results.mount(ContainerRef::new("results-map"));
        results.set_location(CENTER);
        results.set_sdk_ready(true);
        assert!(results.search_cycle().is_none());
        assert!(search.requests().is_empty());
    }

    #[tokio::test]
    async fn trigger_search_runs_on_the_runtime() {
        let search = Arc::new(InMemoryPlaceSearch::new());
        search.respond(
            "restaurant",
            NearbySearchResponse::ok(vec![place("Koshy's", 0.001)]),
        );

        let mut view = ready_view(search, dining_only());
        let handle = view.trigger_search().expect("spawned on tokio");
        for _ in 0..100 {
            if handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(handle.is_finished());
        assert_eq!(view.nearby_places()[0].name, "Koshy's");
    }

    #[test]
    fn trigger_without_runtime_keeps_gathered_places() {
        let search = Arc::new(InMemoryPlaceSearch::new());
        search.respond(
            "restaurant",
            NearbySearchResponse::ok(vec![place("Rameshwaram Cafe", 0.001)]),
        );

        let mut view = ready_view(search.clone(), dining_only());
        let cycle = view.search_cycle().unwrap();
        futures::executor::block_on(cycle.run());
        assert_eq!(view.nearby_places().len(), 1);
        let revision = view.places().revision();

        assert!(view.trigger_search().is_none());
        assert_eq!(view.nearby_places()[0].name, "Rameshwaram Cafe");
        assert_eq!(view.places().revision(), revision);
        assert!(view.places().is_live());
        assert_eq!(search.requests().len(), 1);
    }

    #[tokio::test]
    async fn http_search_sends_query_and_parses_results() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/nearby")
                    .query_param_exists("location")
                    .query_param("radius", "1500")
                    .query_param("type", "restaurant")
                    .query_param("key", "test-key");
                then.status(200).json_body(json!({
                    "status": "OK",
                    "results": [
                        {
                            "name": "Airlines Hotel",
                            "geometry": { "location": { "lat": 12.9721, "lng": 77.5950 } },
                            "rating": 4.1,
                            "vicinity": "Lavelle Road"
                        }
                    ]
                }));
            })
            .await;

        let client = HttpPlaceSearch::new(&server.url("/nearby"), "test-key").unwrap();
        let response = client
            .nearby_search(&NearbySearchRequest {
                location: CENTER,
                radius_m: 1500,
                category: "restaurant".to_string(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, SearchStatus::Ok);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].vicinity.as_deref(), Some("Lavelle Road"));
    }

    #[tokio::test]
    async fn http_denied_status_is_reported_not_thrown() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/nearby");
                then.status(200).json_body(json!({
                    "status": "REQUEST_DENIED",
                    "results": [],
                    "error_message": "The provided API key is invalid."
                }));
            })
            .await;

        let client = HttpPlaceSearch::new(&server.url("/nearby"), "").unwrap();
        let response = client
            .nearby_search(&NearbySearchRequest {
                location: CENTER,
                radius_m: 500,
                category: "school".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.status, SearchStatus::RequestDenied);
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn http_server_error_fails_the_category() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/nearby");
                then.status(503);
            })
            .await;

        let client = HttpPlaceSearch::new(&server.url("/nearby"), "").unwrap();
        let result = client
            .nearby_search(&NearbySearchRequest {
                location: CENTER,
                radius_m: 500,
                category: "transit_station".to_string(),
            })
            .await;
        assert!(result.is_err());
    }
}
