//! Boxed futures with the platform's `Send` bound.
//!
//! Native futures must be `Send` so they can move between tokio worker
//! threads. Browser futures never leave the event loop and frequently hold
//! `JsValue`s, which are not `Send`.

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformBoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;

#[cfg(target_arch = "wasm32")]
pub type PlatformBoxFuture<'a, T> = futures::future::LocalBoxFuture<'a, T>;

/// Boxes a future into a [`PlatformBoxFuture`].
#[cfg(not(target_arch = "wasm32"))]
pub fn boxed<'a, F>(future: F) -> PlatformBoxFuture<'a, F::Output>
where
    F: std::future::Future + Send + 'a,
{
    Box::pin(future)
}

/// Boxes a future into a [`PlatformBoxFuture`].
#[cfg(target_arch = "wasm32")]
pub fn boxed<'a, F>(future: F) -> PlatformBoxFuture<'a, F::Output>
where
    F: std::future::Future + 'a,
{
    Box::pin(future)
}
