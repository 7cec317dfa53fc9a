//! Prelude module for common nestmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use nestmap::prelude::*;`

pub use crate::core::{
    config::{InfoWindowConfig, MapConfig, MapProfile, NearbyConfig, SdkConfig, ZoomPolicy},
    geo::{BoundsAccumulator, LatLng, LatLngBounds},
    lifecycle::{HandleId, MapHandle, MapLifecycle, MapPhase},
    view::{MapStatus, MapView},
};

pub use crate::layers::{
    manager::{MarkerManager, MarkerMode, SyncReport},
    marker::{InfoWindowContent, MarkerMetadata, PlacedMarker, PropertyRecord},
};

pub use crate::places::{CycleSummary, NearbyPlace, NearbyPlaces, PlaceCategory, SearchCycle};

pub use crate::provider::{
    ContainerRef, HttpPlaceSearch, InMemoryMapProvider, InMemoryPlaceSearch, MapId, MapOptions,
    MarkerAnimation, MarkerId, MarkerOptions, NearbySearchRequest, NearbySearchResponse,
    PlaceResult, SearchStatus,
};

pub use crate::sdk::{
    InMemoryScriptHost, LoadState, LoadSubscription, ScriptEvent, ScriptHost, ScriptTag,
    SdkLoader,
};

pub use crate::runtime::{spawn, AsyncHandle, AsyncSpawner};

pub use crate::traits::{MapProvider, PlaceSearch};

pub use crate::{Error as MapError, Result};

pub use std::{
    pin::Pin,
    sync::Arc,
    time::Duration,
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::Future;
