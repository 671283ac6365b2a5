//! Window, popup and history control.
//!
//! Popups are watched by polling: the popup's location becomes readable once
//! it navigates back to the same-origin redirect URI, and that URL is handed
//! back to the caller.

use async_trait::async_trait;
use bridge_traits::{
    error::Result as BridgeResult,
    window::{PopupFeatures, PopupOutcome, WindowHost},
};
use core_async::time::{sleep, Duration};
use tracing::{debug, warn};
use wasm_bindgen::JsValue;
use web_sys::Window;

use crate::error::{browser_window, js_error};

/// Interval between popup location checks
const POPUP_POLL_INTERVAL: Duration = Duration::from_millis(100);

const POPUP_TARGET: &str = "sharepoint-chat-auth";

/// Window host over the live browser window.
#[derive(Clone)]
pub struct WasmWindowHost {
    window: Window,
}

impl WasmWindowHost {
    /// Bind to the current window.
    pub fn new() -> BridgeResult<Self> {
        Ok(Self {
            window: browser_window()?,
        })
    }
}

/// Whether `href` is the redirect URI carrying an authorization response.
pub fn is_redirect_response(href: &str, redirect_uri: &str) -> bool {
    let redirect = redirect_uri.trim_end_matches('/');
    href.starts_with(redirect) && (href.contains("code=") || href.contains("error="))
}

#[async_trait(?Send)]
impl WindowHost for WasmWindowHost {
    fn current_url(&self) -> BridgeResult<String> {
        self.window
            .location()
            .href()
            .map_err(|err| js_error("location.href", err))
    }

    async fn open_popup(
        &self,
        url: &str,
        features: PopupFeatures,
        redirect_uri: &str,
        timeout: Duration,
    ) -> BridgeResult<PopupOutcome> {
        let popup = match self.window.open_with_url_and_target_and_features(
            url,
            POPUP_TARGET,
            &features.to_feature_string(),
        ) {
            Ok(Some(popup)) => popup,
            Ok(None) => return Ok(PopupOutcome::Blocked),
            Err(err) => {
                warn!(error = %js_error("window.open", err), "Popup could not be opened");
                return Ok(PopupOutcome::Blocked);
            }
        };

        let started = js_sys::Date::now();
        let timeout_ms = timeout.as_millis() as f64;

        loop {
            sleep(POPUP_POLL_INTERVAL).await;

            if popup.closed().unwrap_or(true) {
                debug!("Popup closed before returning to the redirect URI");
                return Ok(PopupOutcome::Closed);
            }

            // Throws while the popup is on a cross-origin page
            if let Ok(href) = popup.location().href() {
                if is_redirect_response(&href, redirect_uri) {
                    popup.close().ok();
                    return Ok(PopupOutcome::Completed(href));
                }
            }

            if js_sys::Date::now() - started >= timeout_ms {
                popup.close().ok();
                return Ok(PopupOutcome::TimedOut);
            }
        }
    }

    fn navigate(&self, url: &str) -> BridgeResult<()> {
        self.window
            .location()
            .assign(url)
            .map_err(|err| js_error("location.assign", err))
    }

    fn replace_url(&self, url: &str) -> BridgeResult<()> {
        self.window
            .history()
            .map_err(|err| js_error("window.history", err))?
            .replace_state_with_url(&JsValue::NULL, "", Some(url))
            .map_err(|err| js_error("history.replaceState", err))
    }

    fn reload(&self) -> BridgeResult<()> {
        self.window
            .location()
            .reload()
            .map_err(|err| js_error("location.reload", err))
    }

    fn open_new_window(&self, url: &str) -> BridgeResult<()> {
        match self.window.open_with_url_and_target(url, "_blank") {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                warn!("New window was blocked");
                Ok(())
            }
            Err(err) => Err(js_error("window.open", err)),
        }
    }
}
