//! Process-wide SDK loading
//!
//! The load state lives in one `LoadCell` per loader. It only moves from
//! unloaded to loaded or to failed, and every transition is fanned out to
//! the subscribers' channels. `ensure_loaded` serializes the "is there a tag
//! yet?" check with the injection, so concurrent callers share one script.

use crate::{
    core::config::SdkConfig,
    sdk::host::{ListenerId, ScriptEvent, ScriptHost, ScriptListener, ScriptTag},
    Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadState {
    pub loaded: bool,
    pub error: bool,
}

impl LoadState {
    pub const UNLOADED: LoadState = LoadState {
        loaded: false,
        error: false,
    };
    pub const LOADED: LoadState = LoadState {
        loaded: true,
        error: false,
    };
    pub const FAILED: LoadState = LoadState {
        loaded: false,
        error: true,
    };

    pub fn is_settled(&self) -> bool {
        self.loaded || self.error
    }
}

#[derive(Debug, Default)]
struct CellInner {
    state: LoadState,
    subscribers: Vec<Sender<LoadState>>,
}

/// Shared load state with one-way transitions.
#[derive(Debug, Default)]
pub struct LoadCell {
    inner: Mutex<CellInner>,
}

impl LoadCell {
    pub fn get(&self) -> LoadState {
        self.inner.lock().map(|i| i.state).unwrap_or_default()
    }

    fn subscribe(&self) -> (LoadState, Receiver<LoadState>) {
        let (tx, rx) = unbounded();
        match self.inner.lock() {
            Ok(mut inner) => {
                if !inner.state.is_settled() {
                    inner.subscribers.push(tx);
                }
                (inner.state, rx)
            }
            Err(_) => (LoadState::FAILED, rx),
        }
    }

    /// Settle the cell. Returns false if it was already settled.
    fn resolve(&self, outcome: LoadState) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if inner.state.is_settled() {
            return false;
        }
        inner.state = outcome;
        for subscriber in inner.subscribers.drain(..) {
            let _ = subscriber.send(outcome);
        }
        true
    }
}

/// A caller's view of the load state. Dropping it detaches the listener it
/// attached, never the script tag.
pub struct LoadSubscription {
    state: LoadState,
    rx: Receiver<LoadState>,
    listener: Option<AttachedListener>,
}

struct AttachedListener {
    host: Arc<dyn ScriptHost>,
    src: String,
    id: ListenerId,
}

impl Drop for AttachedListener {
    fn drop(&mut self) {
        self.host.remove_listener(&self.src, self.id);
    }
}

impl LoadSubscription {
    /// Latest known state, taking in any pending transition.
    pub fn state(&mut self) -> LoadState {
        for state in self.rx.try_iter() {
            self.state = state;
        }
        self.state
    }

    pub fn is_loaded(&mut self) -> bool {
        self.state().loaded
    }

    pub fn has_error(&mut self) -> bool {
        self.state().error
    }

    /// Block until the state settles or `timeout` passes.
    pub fn wait_timeout(&mut self, timeout: Duration) -> LoadState {
        if self.state().is_settled() {
            return self.state;
        }
        if let Ok(state) = self.rx.recv_timeout(timeout) {
            self.state = state;
        }
        self.state
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    pub fn detach(&mut self) {
        self.listener = None;
    }
}

pub struct SdkLoader {
    host: Arc<dyn ScriptHost>,
    src: String,
    cell: Arc<LoadCell>,
    inject_lock: Mutex<()>,
}

impl SdkLoader {
    pub fn new(host: Arc<dyn ScriptHost>, config: &SdkConfig) -> Result<Self> {
        Ok(Self {
            host,
            src: config.script_src()?,
            cell: Arc::new(LoadCell::default()),
            inject_lock: Mutex::new(()),
        })
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn state(&self) -> LoadState {
        self.cell.get()
    }

    /// Make sure the SDK is loading or loaded, and subscribe to the outcome.
    pub fn ensure_loaded(&self) -> LoadSubscription {
        // Subscribe first so a transition racing with the checks below is
        // still delivered.
        let (state, rx) = self.cell.subscribe();
        let mut subscription = LoadSubscription {
            state,
            rx,
            listener: None,
        };
        if state.is_settled() {
            return subscription;
        }

        let _guard = match self.inject_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if self.cell.get().is_settled() {
            return subscription;
        }
        if self.host.sdk_available() {
            self.cell.resolve(LoadState::LOADED);
            return subscription;
        }

        match self.host.script_tag(&self.src) {
            ScriptTag::Loaded => {
                self.cell.resolve(LoadState::LOADED);
            }
            ScriptTag::Failed => {
                self.cell.resolve(LoadState::FAILED);
            }
            ScriptTag::Pending => {
                log::debug!("SDK script already pending, attaching to it");
                subscription.listener = self.attach();
            }
            ScriptTag::Absent => {
                log::info!("injecting SDK script {}", self.src);
                match self.host.inject(&self.src) {
                    Ok(()) => subscription.listener = self.attach(),
                    Err(e) => {
                        log::warn!("SDK script injection failed: {}", e);
                        self.cell.resolve(LoadState::FAILED);
                    }
                }
            }
        }
        subscription
    }

    fn attach(&self) -> Option<AttachedListener> {
        let cell = self.cell.clone();
        let listener: ScriptListener = Arc::new(move |event| {
            let outcome = match event {
                ScriptEvent::Load => LoadState::LOADED,
                ScriptEvent::Error => LoadState::FAILED,
            };
            if cell.resolve(outcome) {
                log::info!("SDK script settled: {:?}", event);
            }
        });

        match self.host.add_listener(&self.src, listener) {
            Ok(id) => Some(AttachedListener {
                host: self.host.clone(),
                src: self.src.clone(),
                id,
            }),
            Err(e) => {
                log::warn!("could not listen to SDK script: {}", e);
                self.cell.resolve(LoadState::FAILED);
                None
            }
        }
    }
}

static GLOBAL: OnceCell<SdkLoader> = OnceCell::new();

/// Install the process-wide loader. Later calls return the first instance.
pub fn install(host: Arc<dyn ScriptHost>, config: &SdkConfig) -> Result<&'static SdkLoader> {
    GLOBAL.get_or_try_init(|| SdkLoader::new(host, config))
}

pub fn global() -> Option<&'static SdkLoader> {
    GLOBAL.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_transitions_once() {
        let cell = LoadCell::default();
        let (state, rx) = cell.subscribe();
        assert_eq!(state, LoadState::UNLOADED);

        assert!(cell.resolve(LoadState::FAILED));
        assert!(!cell.resolve(LoadState::LOADED));
        assert_eq!(cell.get(), LoadState::FAILED);
        assert_eq!(rx.try_recv().unwrap(), LoadState::FAILED);
    }

    #[test]
    fn late_subscriber_sees_settled_state() {
        let cell = LoadCell::default();
        cell.resolve(LoadState::LOADED);
        let (state, rx) = cell.subscribe();
        assert_eq!(state, LoadState::LOADED);
        assert!(rx.try_recv().is_err());
    }
}
