//! Configuration for the listing map
//!
//! Settings are grouped per concern (zoom policy, SDK script, nearby search,
//! info windows). Presets cover the two screens that embed a map; anything
//! else goes through `MapProfile::Custom` or `MapConfig::from_json_str`.

use crate::{
    core::{constants, geo::LatLng},
    places::PlaceCategory,
    MapError, Result,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum MapProfile {
    /// A single listing with its marker and nearby places
    ListingDetail,
    /// Search results: many markers, no nearby enrichment
    SearchResults,
    Custom(MapConfig),
}

impl MapProfile {
    pub fn resolve(&self) -> MapConfig {
        match self {
            Self::ListingDetail => MapConfig::default(),
            Self::SearchResults => MapConfig {
                nearby: NearbyConfig {
                    enabled: false,
                    ..NearbyConfig::default()
                },
                ..MapConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for MapProfile {
    fn default() -> Self {
        Self::ListingDetail
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub zoom: ZoomPolicy,
    pub sdk: SdkConfig,
    pub nearby: NearbyConfig,
    pub info_window: InfoWindowConfig,
}

impl MapConfig {
    /// Parses a JSON document; missing sections fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.zoom.wide < self.zoom.close) {
            return Err(MapError::Config(format!(
                "wide zoom {} must be below close zoom {}",
                self.zoom.wide, self.zoom.close
            ))
            .into());
        }
        if self.nearby.radius_m == 0 {
            return Err(MapError::Config("nearby radius must be positive".to_string()).into());
        }
        if self.nearby.top_n == 0 {
            return Err(MapError::Config("nearby top_n must be positive".to_string()).into());
        }
        Ok(())
    }
}

/// Picks the initial zoom from the target location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomPolicy {
    pub wide: f64,
    pub close: f64,
}

impl ZoomPolicy {
    pub fn zoom_for(&self, location: &LatLng) -> f64 {
        if location.is_unknown() {
            self.wide
        } else {
            self.close
        }
    }
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self {
            wide: constants::WIDE_ZOOM,
            close: constants::CLOSE_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    pub script_url: String,
    pub api_key: String,
    pub libraries: Vec<String>,
}

impl SdkConfig {
    /// Full script `src`, including key and requested libraries.
    pub fn script_src(&self) -> Result<String> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if !self.api_key.is_empty() {
            params.push(("key", self.api_key.clone()));
        }
        if !self.libraries.is_empty() {
            params.push(("libraries", self.libraries.join(",")));
        }
        let url = reqwest::Url::parse_with_params(&self.script_url, &params)
            .map_err(|e| MapError::Config(format!("invalid SDK script url: {}", e)))?;
        Ok(url.to_string())
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            script_url: constants::SDK_SCRIPT_URL.to_string(),
            api_key: String::new(),
            libraries: vec!["places".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearbyConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub radius_m: u32,
    pub top_n: usize,
    pub categories: Vec<PlaceCategory>,
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: constants::NEARBY_SEARCH_URL.to_string(),
            radius_m: constants::NEARBY_RADIUS_M,
            top_n: constants::NEARBY_TOP_N,
            categories: PlaceCategory::defaults(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoWindowConfig {
    pub currency: String,
    pub price_suffix: String,
    /// Path template; `{id}` is replaced with the listing id.
    pub detail_path: String,
}

impl InfoWindowConfig {
    pub fn detail_link(&self, id: &str) -> String {
        self.detail_path.replace("{id}", id)
    }

    pub fn format_price(&self, price: f64) -> String {
        format!(
            "{}{}{}",
            self.currency,
            group_thousands(price.round() as i64),
            self.price_suffix
        )
    }
}

impl Default for InfoWindowConfig {
    fn default() -> Self {
        Self {
            currency: "₹".to_string(),
            price_suffix: "/month".to_string(),
            detail_path: "/property/{id}".to_string(),
        }
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}
