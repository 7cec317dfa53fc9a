use crate::{
    core::{config::InfoWindowConfig, geo::LatLng, lifecycle::HandleId, lifecycle::MapHandle},
    provider::{MarkerId, MarkerOptions},
    traits::MapProvider,
    Result,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// A listing row as delivered by the data-access layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl PropertyRecord {
    /// The record's coordinate, if it has a usable one.
    pub fn location(&self) -> Option<LatLng> {
        LatLng::from_parts(self.latitude, self.longitude)
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(n) => n.to_string(),
    })
}

/// Content of the click-triggered info panel on a listing marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoWindowContent {
    pub title: String,
    pub address: String,
    pub price: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub detail_url: String,
}

impl InfoWindowContent {
    pub fn for_record(record: &PropertyRecord, config: &InfoWindowConfig) -> Self {
        Self {
            title: record.title.clone(),
            address: record.address.clone(),
            price: config.format_price(record.price),
            bedrooms: record.bedrooms,
            bathrooms: record.bathrooms,
            detail_url: config.detail_link(&record.id),
        }
    }

    /// Markup handed to the provider's info window.
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                "<div class=\"info-window\">",
                "<h3>{}</h3>",
                "<p>{}</p>",
                "<p><strong>{}</strong></p>",
                "<p>{} {} · {} {}</p>",
                "<a href=\"{}\">View details</a>",
                "</div>"
            ),
            escape_html(&self.title),
            escape_html(&self.address),
            escape_html(&self.price),
            self.bedrooms,
            plural(self.bedrooms, "bed", "beds"),
            self.bathrooms,
            plural(self.bathrooms, "bath", "baths"),
            escape_html(&self.detail_url),
        )
    }
}

fn plural(count: u32, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerMetadata {
    /// The one marker of a listing detail map
    Listing,
    Property {
        record_id: String,
        info: InfoWindowContent,
    },
}

/// A marker attached to a live map. Dropping it detaches it from the map.
pub struct PlacedMarker {
    id: MarkerId,
    position: LatLng,
    owner: HandleId,
    generation: u64,
    metadata: MarkerMetadata,
    provider: Arc<dyn MapProvider>,
}

impl PlacedMarker {
    pub fn place(
        handle: &MapHandle,
        options: &MarkerOptions,
        metadata: MarkerMetadata,
        generation: u64,
    ) -> Result<Self> {
        let id = handle.provider().create_marker(options)?;
        Ok(Self {
            id,
            position: options.position,
            owner: handle.id(),
            generation,
            metadata,
            provider: handle.provider().clone(),
        })
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn owner(&self) -> HandleId {
        self.owner
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn metadata(&self) -> &MarkerMetadata {
        &self.metadata
    }
}

impl std::fmt::Debug for PlacedMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacedMarker")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("owner", &self.owner)
            .field("generation", &self.generation)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl Drop for PlacedMarker {
    fn drop(&mut self) {
        self.provider.remove_marker(self.id);
    }
}
