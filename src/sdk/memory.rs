use crate::{
    prelude::HashMap,
    sdk::host::{ListenerId, ScriptEvent, ScriptHost, ScriptListener, ScriptTag},
    MapError, Result,
};
use std::sync::Mutex;

#[derive(Default)]
struct HostState {
    sdk_available: bool,
    refuse_injection: bool,
    refuse_listeners: bool,
    next_listener: u64,
    tags: HashMap<String, ScriptTag>,
    listeners: HashMap<String, Vec<(ListenerId, ScriptListener)>>,
    injections: Vec<String>,
}

/// A document stand-in: script tags, their listeners, and manual
/// `load`/`error` firing.
#[derive(Default)]
pub struct InMemoryScriptHost {
    state: Mutex<HostState>,
}

impl InMemoryScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose SDK namespace is already installed.
    pub fn with_sdk_present() -> Self {
        let host = Self::default();
        if let Ok(mut state) = host.state.lock() {
            state.sdk_available = true;
        }
        host
    }

    /// Pretend another part of the page inserted the tag already.
    pub fn with_pending_tag(src: &str) -> Self {
        let host = Self::default();
        if let Ok(mut state) = host.state.lock() {
            state.tags.insert(src.to_string(), ScriptTag::Pending);
        }
        host
    }

    pub fn refuse_injections(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.refuse_injection = true;
        }
    }

    /// Make every `add_listener` fail, as a document that rejects
    /// `addEventListener` would.
    pub fn refuse_listeners(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.refuse_listeners = true;
        }
    }

    pub fn injections(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.injections.clone())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, src: &str) -> usize {
        self.state
            .lock()
            .map(|s| s.listeners.get(src).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn has_tag(&self, src: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.tags.contains_key(src))
            .unwrap_or(false)
    }

    pub fn fire_load(&self, src: &str) {
        self.fire(src, ScriptEvent::Load);
    }

    pub fn fire_error(&self, src: &str) {
        self.fire(src, ScriptEvent::Error);
    }

    fn fire(&self, src: &str, event: ScriptEvent) {
        // Listeners run outside the lock; they may call back into the host.
        let listeners: Vec<ScriptListener> = match self.state.lock() {
            Ok(mut state) => {
                let tag = match event {
                    ScriptEvent::Load => ScriptTag::Loaded,
                    ScriptEvent::Error => ScriptTag::Failed,
                };
                state.tags.insert(src.to_string(), tag);
                if event == ScriptEvent::Load {
                    state.sdk_available = true;
                }
                state
                    .listeners
                    .get(src)
                    .map(|l| l.iter().map(|(_, f)| f.clone()).collect())
                    .unwrap_or_default()
            }
            Err(_) => return,
        };
        for listener in listeners {
            listener(event);
        }
    }
}

impl ScriptHost for InMemoryScriptHost {
    fn sdk_available(&self) -> bool {
        self.state.lock().map(|s| s.sdk_available).unwrap_or(false)
    }

    fn script_tag(&self, src: &str) -> ScriptTag {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.tags.get(src).copied())
            .unwrap_or(ScriptTag::Absent)
    }

    fn inject(&self, src: &str) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| MapError::Provider("script host poisoned".to_string()))?;
        if state.refuse_injection {
            return Err(MapError::Provider("document refused script insertion".to_string()).into());
        }
        state.tags.insert(src.to_string(), ScriptTag::Pending);
        state.injections.push(src.to_string());
        Ok(())
    }

    fn add_listener(&self, src: &str, listener: ScriptListener) -> Result<ListenerId> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| MapError::Provider("script host poisoned".to_string()))?;
        if !state.tags.contains_key(src) {
            return Err(MapError::Provider(format!("no script tag for {}", src)).into());
        }
        if state.refuse_listeners {
            return Err(MapError::Provider("listener registration rejected".to_string()).into());
        }
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state
            .listeners
            .entry(src.to_string())
            .or_default()
            .push((id, listener));
        Ok(id)
    }

    fn remove_listener(&self, src: &str, id: ListenerId) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(listeners) = state.listeners.get_mut(src) {
                listeners.retain(|(listener_id, _)| *listener_id != id);
            }
        }
    }
}
