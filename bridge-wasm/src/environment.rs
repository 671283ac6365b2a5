//! Page environment detection.

use bridge_traits::environment::BrowserEnvironment;
use tracing::debug;

/// Answers from the live `window`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmBrowserEnvironment;

impl WasmBrowserEnvironment {
    /// Create the browser environment.
    pub fn new() -> Self {
        Self
    }
}

impl BrowserEnvironment for WasmBrowserEnvironment {
    fn is_browser(&self) -> bool {
        web_sys::window().is_some()
    }

    /// A page whose `window.top` is unreadable is assumed to be framed.
    fn is_embedded(&self) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        match window.top() {
            Ok(Some(top)) => {
                let own: &wasm_bindgen::JsValue = window.as_ref();
                let top: &wasm_bindgen::JsValue = top.as_ref();
                own != top
            }
            Ok(None) | Err(_) => true,
        }
    }

    fn hostname(&self) -> Option<String> {
        web_sys::window()?.location().hostname().ok()
    }

    fn origin(&self) -> Option<String> {
        web_sys::window()?.location().origin().ok()
    }

    /// Opens and immediately closes a 1x1 blank window.
    fn popups_supported(&self) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        let test_window = window.open_with_url_and_target_and_features(
            "about:blank",
            "_blank",
            "width=1,height=1",
        );
        match test_window {
            Ok(Some(test_window)) => {
                test_window.close().ok();
                true
            }
            Ok(None) => {
                debug!("Test popup was blocked");
                false
            }
            Err(_) => false,
        }
    }
}
