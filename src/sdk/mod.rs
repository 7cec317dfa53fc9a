//! Loading the mapping provider's SDK script.

pub mod host;
pub mod loader;
pub mod memory;

#[cfg(feature = "wasm")]
pub mod dom;

pub use host::{ListenerId, ScriptEvent, ScriptHost, ScriptListener, ScriptTag};
pub use loader::{global, install, LoadCell, LoadState, LoadSubscription, SdkLoader};
pub use memory::InMemoryScriptHost;

#[cfg(feature = "wasm")]
pub use dom::DomScriptHost;
