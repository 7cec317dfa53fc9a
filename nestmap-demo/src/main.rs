use anyhow::{anyhow, Context};
use nestmap::prelude::*;

/// Listings shown on the search results map
const LISTINGS: &str = r#"[
    { "id": 101, "title": "Sunny 2BHK near Metro", "address": "Indiranagar, Bengaluru",
      "price": 32000, "bedrooms": 2, "bathrooms": 2, "latitude": 12.9719, "longitude": 77.6412 },
    { "id": 102, "title": "Girls PG with meals", "address": "Koramangala 5th Block",
      "price": 11500, "bedrooms": 1, "bathrooms": 1, "latitude": 12.9352, "longitude": 77.6245 },
    { "id": 103, "title": "Studio, address pending", "address": "HSR Layout",
      "price": 15000, "bedrooms": 1, "bathrooms": 1 },
    { "id": 104, "title": "3BHK villa", "address": "Whitefield",
      "price": 58000, "bedrooms": 3, "bathrooms": 3, "latitude": 12.9698, "longitude": 77.7500 }
]"#;

/// Headless walkthrough of a listing map session against in-memory doubles
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nestmap::init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            MapConfig::from_json_str(&json).map_err(|e| anyhow!(e))?
        }
        None => MapProfile::ListingDetail.resolve(),
    };

    let host = Arc::new(InMemoryScriptHost::new());
    let loader = nestmap::sdk::install(host.clone(), &config.sdk).map_err(|e| anyhow!(e))?;

    let provider = Arc::new(InMemoryMapProvider::new());
    let search = Arc::new(InMemoryPlaceSearch::new());
    seed_places(&search);

    let mut view = MapView::new(provider.clone(), search.clone(), config);
    view.mount(ContainerRef::new("listing-map"));
    view.set_location(LatLng::new(12.9719, 77.6412));
    view.set_mode(MarkerMode::Single(LatLng::new(12.9719, 77.6412)));

    let state = view.attach_sdk(loader);
    log::info!("SDK state after attach: {:?}", state);
    println!("before load: {}", serde_json::to_string(&view.status())?);

    host.fire_load(loader.src());
    view.poll_sdk();
    println!("after load:  {}", serde_json::to_string(&view.status())?);

    if let Some(cycle) = view.search_cycle() {
        let summary = cycle.run().await;
        println!(
            "nearby: {} places ({} failed categories)",
            summary.appended,
            summary.failed.len()
        );
    }
    for place in view.nearby_places() {
        println!(
            "  [{}] {} ({:.0} m){}",
            place.category,
            place.name,
            place.distance_m,
            place
                .rating
                .map(|r| format!(" ★{:.1}", r))
                .unwrap_or_default()
        );
    }

    let listings: Vec<PropertyRecord> = serde_json::from_str(LISTINGS)?;
    let report = view.set_mode(MarkerMode::Multi(listings));
    println!(
        "results map: {} markers, {} skipped, bounds fitted: {}",
        report.placed, report.skipped, report.fitted
    );
    for marker in view.markers().markers() {
        if let Some(info) = provider.click(marker.id()) {
            println!("  {}", info.to_html());
        }
    }

    view.unmount();
    println!(
        "after unmount: {} live maps, {} markers",
        provider.live_maps().len(),
        provider.marker_count()
    );
    Ok(())
}

fn seed_places(search: &InMemoryPlaceSearch) {
    let place = |name: &str, lat: f64, lng: f64, rating: Option<f32>| PlaceResult {
        name: name.to_string(),
        location: LatLng::new(lat, lng),
        rating,
        vicinity: None,
    };
    search.respond(
        "restaurant",
        NearbySearchResponse::ok(vec![
            place("Toit", 12.9791, 77.6408, Some(4.5)),
            place("Truffles", 12.9716, 77.6387, Some(4.4)),
        ]),
    );
    search.respond(
        "school",
        NearbySearchResponse::ok(vec![place("Kendriya Vidyalaya", 12.9650, 77.6380, None)]),
    );
    search.fail("transit_station", "quota exceeded");
}
