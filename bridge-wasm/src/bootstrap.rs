//! Convenience helpers for wiring all wasm bridge implementations together.
//!
//! Host shells can use [`build_wasm_bridges`] to construct every browser
//! adapter the session core needs in one call. The result mirrors the role
//! that the `bridge-desktop` crate plays for native targets.

use std::sync::Arc;

use bridge_traits::{
    environment::BrowserEnvironment,
    error::Result as BridgeResult,
    http::HttpClient,
    storage::{CookieJar, WebStorage},
    window::WindowHost,
};

use crate::{
    BrowserWebStorage, DocumentCookieJar, WasmBrowserEnvironment, WasmHttpClient, WasmWindowHost,
};

/// Fully constructed wasm bridge objects ready for injection into the core.
pub struct WasmBridgeSet {
    /// HTTP client powered by browser `fetch`.
    pub http_client: Arc<dyn HttpClient>,
    /// `sessionStorage`, where the provider keeps its cache.
    pub session_storage: Arc<dyn WebStorage>,
    /// `localStorage`, purged alongside session storage.
    pub local_storage: Arc<dyn WebStorage>,
    /// `document.cookie`
    pub cookies: Arc<dyn CookieJar>,
    /// Frame, origin and popup detection.
    pub environment: Arc<dyn BrowserEnvironment>,
    /// Popups, navigation and history.
    pub window: Arc<dyn WindowHost>,
}

/// Build the default wasm bridge stack.
///
/// Hosts should call this during startup and pass the returned trait objects
/// into `core-service`.
pub fn build_wasm_bridges() -> BridgeResult<WasmBridgeSet> {
    Ok(WasmBridgeSet {
        http_client: Arc::new(WasmHttpClient::new()?),
        session_storage: Arc::new(BrowserWebStorage::session()?),
        local_storage: Arc::new(BrowserWebStorage::local()?),
        cookies: Arc::new(DocumentCookieJar::new()?),
        environment: Arc::new(WasmBrowserEnvironment::new()),
        window: Arc::new(WasmWindowHost::new()?),
    })
}
