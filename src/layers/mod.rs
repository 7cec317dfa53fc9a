pub mod manager;
pub mod marker;

pub use manager::{MarkerManager, MarkerMode, SyncReport};
pub use marker::{InfoWindowContent, MarkerMetadata, PlacedMarker, PropertyRecord};
