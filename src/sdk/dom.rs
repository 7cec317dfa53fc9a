//! Browser script host, built on `web-sys`.
//!
//! Closures registered on script tags are not `Send`, so they are parked in
//! a thread-local table keyed by listener id until they are detached.

use crate::{
    prelude::HashMap,
    sdk::host::{ListenerId, ScriptEvent, ScriptHost, ScriptListener, ScriptTag},
    MapError, Result,
};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlScriptElement};

const STATE_ATTR: &str = "data-sdk-state";

type EventClosure = Closure<dyn FnMut(Event)>;

thread_local! {
    static LISTENERS: RefCell<HashMap<ListenerId, EventClosure>> = RefCell::new(HashMap::default());
}

static NEXT_LISTENER: AtomicU64 = AtomicU64::new(1);

fn js_error(context: &str, value: JsValue) -> MapError {
    MapError::Provider(format!("{}: {:?}", context, value))
}

fn document() -> Result<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| MapError::Provider("no document available".to_string()).into())
}

fn find_tag(src: &str) -> Option<Element> {
    let document = document().ok()?;
    document
        .query_selector(&format!("script[src=\"{}\"]", src))
        .ok()
        .flatten()
}

/// Script host for the page the crate is running in.
#[derive(Debug, Clone)]
pub struct DomScriptHost {
    /// Global the SDK installs itself under, e.g. `google`
    namespace: String,
    /// Property on that global that proves the SDK is usable, e.g. `maps`
    module: String,
}

impl DomScriptHost {
    pub fn new(namespace: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            module: module.into(),
        }
    }
}

impl Default for DomScriptHost {
    fn default() -> Self {
        Self::new("google", "maps")
    }
}

impl ScriptHost for DomScriptHost {
    fn sdk_available(&self) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        let Ok(namespace) = js_sys::Reflect::get(&window, &JsValue::from_str(&self.namespace))
        else {
            return false;
        };
        if namespace.is_undefined() || namespace.is_null() {
            return false;
        }
        js_sys::Reflect::get(&namespace, &JsValue::from_str(&self.module))
            .map(|module| !module.is_undefined() && !module.is_null())
            .unwrap_or(false)
    }

    fn script_tag(&self, src: &str) -> ScriptTag {
        match find_tag(src) {
            None => ScriptTag::Absent,
            Some(tag) => match tag.get_attribute(STATE_ATTR).as_deref() {
                Some("loaded") => ScriptTag::Loaded,
                Some("failed") => ScriptTag::Failed,
                _ => ScriptTag::Pending,
            },
        }
    }

    fn inject(&self, src: &str) -> Result<()> {
        let document = document()?;
        let script: HtmlScriptElement = document
            .create_element("script")
            .map_err(|e| js_error("create script", e))?
            .dyn_into()
            .map_err(|_| MapError::Provider("created element is not a script".to_string()))?;
        script.set_src(src);
        script.set_async(true);
        script.set_defer(true);

        // Record the outcome on the tag so later loaders can tell a
        // settled tag from a pending one.
        for (event, state) in [("load", "loaded"), ("error", "failed")] {
            let tag = script.clone();
            let mark = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                let _ = tag.set_attribute(STATE_ATTR, state);
            });
            script
                .add_event_listener_with_callback(event, mark.as_ref().unchecked_ref())
                .map_err(|e| js_error("listen on script", e))?;
            // Lives as long as the tag, which is never removed.
            mark.forget();
        }

        let head = document
            .head()
            .ok_or_else(|| MapError::Provider("document has no <head>".to_string()))?;
        head.append_child(&script)
            .map_err(|e| js_error("append script", e))?;
        Ok(())
    }

    fn add_listener(&self, src: &str, listener: ScriptListener) -> Result<ListenerId> {
        let tag = find_tag(src)
            .ok_or_else(|| MapError::Provider(format!("no script tag for {}", src)))?;

        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let kind = if event.type_() == "load" {
                ScriptEvent::Load
            } else {
                ScriptEvent::Error
            };
            listener(kind);
        });
        let mut attached: Vec<&str> = Vec::with_capacity(2);
        for event in ["load", "error"] {
            if let Err(e) = tag.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            {
                // Unhook before `closure` is dropped, or the tag keeps a
                // dangling callback.
                for done in attached {
                    let _ = tag
                        .remove_event_listener_with_callback(done, closure.as_ref().unchecked_ref());
                }
                return Err(js_error("listen on script", e).into());
            }
            attached.push(event);
        }

        let id = ListenerId(NEXT_LISTENER.fetch_add(1, Ordering::Relaxed));
        LISTENERS.with(|listeners| listeners.borrow_mut().insert(id, closure));
        Ok(id)
    }

    fn remove_listener(&self, src: &str, id: ListenerId) {
        let Some(closure) = LISTENERS.with(|listeners| listeners.borrow_mut().remove(&id)) else {
            return;
        };
        if let Some(tag) = find_tag(src) {
            for event in ["load", "error"] {
                let _ = tag
                    .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            }
        }
    }
}
