//! Task spawning.
//!
//! - On native platforms: `tokio::task::spawn`
//! - On WASM: `wasm_bindgen_futures::spawn_local` (single-threaded, no `Send`)
//!
//! Timers in the authentication core are fire-and-forget, so the portable
//! surface is [`spawn_detached`]. Native callers that need the handle can use
//! [`spawn`].

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::task::{yield_now, JoinError, JoinHandle};

#[cfg(not(target_arch = "wasm32"))]
/// Spawns a task on the tokio runtime and returns its handle.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

#[cfg(not(target_arch = "wasm32"))]
/// Spawns a task whose result nobody waits for.
pub fn spawn_detached<F>(future: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    drop(tokio::task::spawn(future));
}

#[cfg(target_arch = "wasm32")]
/// Spawns a task on the browser event loop.
pub fn spawn_detached<F>(future: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}
