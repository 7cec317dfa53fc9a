//! Runtime abstraction layer for async operations
//!
//! Nearby searches are driven as detached tasks. This module lets the crate
//! spawn them on Tokio natively or on the browser event loop under `wasm`,
//! without the callers caring which one is in use.

use crate::prelude::{Future, Pin};

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it, or `None` when no executor
    /// is reachable from the current context.
    fn spawn_boxed(
        &self,
        future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
    ) -> Option<Box<dyn AsyncHandle>>;

    /// Whether `spawn_boxed` would find an executor from the current context.
    fn can_spawn(&self) -> bool {
        true
    }
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Stop driving the task, where the executor supports it
    fn cancel(&self);
}

/// Whether a spawned task would actually run from here.
pub fn available() -> bool {
    runtime().map(|spawner| spawner.can_spawn()).unwrap_or(false)
}

/// Spawn a future on the installed runtime
pub fn spawn<F>(future: F) -> Option<Box<dyn AsyncHandle>>
where
    F: Future<Output = ()> + Send + 'static,
{
    match runtime() {
        Some(spawner) => spawner.spawn_boxed(Box::pin(future)),
        None => {
            log::warn!("no async runtime available; task dropped");
            None
        }
    }
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::task::JoinHandle;

        /// Tokio-based async spawner
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(
                &self,
                future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
            ) -> Option<Box<dyn AsyncHandle>> {
                let runtime = match ::tokio::runtime::Handle::try_current() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        log::warn!("not inside a tokio runtime: {}", e);
                        return None;
                    }
                };
                Some(Box::new(TokioHandle(runtime.spawn(future))))
            }

            fn can_spawn(&self) -> bool {
                ::tokio::runtime::Handle::try_current().is_ok()
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }

    #[cfg(feature = "wasm")]
    pub mod wasm {
        use super::*;
        use std::sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        };

        /// WASM-compatible async spawner
        pub struct WasmSpawner;

        impl AsyncSpawner for WasmSpawner {
            fn spawn_boxed(
                &self,
                future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
            ) -> Option<Box<dyn AsyncHandle>> {
                let finished = Arc::new(AtomicBool::new(false));
                let flag = finished.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    future.await;
                    flag.store(true, Ordering::SeqCst);
                });
                Some(Box::new(WasmHandle { finished }))
            }
        }

        struct WasmHandle {
            finished: Arc<AtomicBool>,
        }

        impl AsyncHandle for WasmHandle {
            fn is_finished(&self) -> bool {
                self.finished.load(Ordering::SeqCst)
            }

            fn cancel(&self) {
                // spawn_local tasks cannot be aborted; results are fenced off
                // by the caller's liveness checks instead
            }
        }
    }
}

/// Global runtime instance
static RUNTIME: std::sync::OnceLock<Option<Box<dyn AsyncSpawner>>> = std::sync::OnceLock::new();

/// Initialize the runtime with a specific spawner. Only the first call wins.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) -> bool {
    RUNTIME.set(Some(spawner)).is_ok()
}

/// Get the global runtime spawner
pub fn runtime() -> Option<&'static dyn AsyncSpawner> {
    RUNTIME
        .get_or_init(|| {
            #[cfg(feature = "tokio-runtime")]
            {
                Some(Box::new(spawners::tokio_impl::TokioSpawner) as Box<dyn AsyncSpawner>)
            }

            #[cfg(all(feature = "wasm", not(feature = "tokio-runtime")))]
            {
                Some(Box::new(spawners::wasm::WasmSpawner) as Box<dyn AsyncSpawner>)
            }

            #[cfg(not(any(feature = "tokio-runtime", feature = "wasm")))]
            {
                None
            }
        })
        .as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    #[::tokio::test]
    async fn test_tokio_spawner() {
        let handle = spawn(async {
            ::tokio::time::sleep(::tokio::time::Duration::from_millis(10)).await;
        })
        .expect("tokio runtime is active");

        // Should not be finished immediately
        assert!(!handle.is_finished());

        // Wait a bit and check again
        ::tokio::time::sleep(::tokio::time::Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }

    #[cfg(feature = "tokio-runtime")]
    #[::tokio::test]
    async fn test_cancel_stops_task() {
        let handle = spawn(async {
            ::tokio::time::sleep(::tokio::time::Duration::from_secs(60)).await;
        })
        .expect("tokio runtime is active");

        handle.cancel();
        ::tokio::time::sleep(::tokio::time::Duration::from_millis(20)).await;
        assert!(handle.is_finished());
    }

    #[cfg(feature = "tokio-runtime")]
    #[test]
    fn test_no_executor_outside_runtime() {
        assert!(!available());
        assert!(spawn(async {}).is_none());
    }
}
