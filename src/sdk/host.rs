use crate::Result;
use std::sync::Arc;

/// What the host document knows about a script tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptTag {
    Absent,
    /// Inserted, neither `load` nor `error` fired yet
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEvent {
    Load,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

pub type ScriptListener = Arc<dyn Fn(ScriptEvent) + Send + Sync>;

/// The environment the SDK script lives in (a browser document, or a double).
pub trait ScriptHost: Send + Sync {
    /// The SDK's global namespace is already installed.
    fn sdk_available(&self) -> bool;

    fn script_tag(&self, src: &str) -> ScriptTag;

    /// Insert a script tag for `src`.
    fn inject(&self, src: &str) -> Result<()>;

    /// Listen for `load`/`error` on the tag for `src`. On error nothing may
    /// stay registered.
    fn add_listener(&self, src: &str, listener: ScriptListener) -> Result<ListenerId>;

    /// Detach a listener. The tag itself stays in place.
    fn remove_listener(&self, src: &str, id: ListenerId);
}
