//! Window Navigation Abstractions
//!
//! Popup and full-page navigation used by interactive sign-in flows.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{error::Result, platform::PlatformSendSync};

/// Placement of a popup window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupFeatures {
    pub width: u32,
    pub height: u32,
    pub top: u32,
    pub left: u32,
}

impl PopupFeatures {
    /// Render as a `window.open` features string
    pub fn to_feature_string(&self) -> String {
        format!(
            "width={},height={},top={},left={},scrollbars=yes",
            self.width, self.height, self.top, self.left
        )
    }
}

impl Default for PopupFeatures {
    fn default() -> Self {
        Self {
            width: 480,
            height: 600,
            top: 100,
            left: 100,
        }
    }
}

/// How a popup window ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupOutcome {
    /// The popup navigated back to the redirect URI; carries the full URL
    Completed(String),
    /// The user closed the window
    Closed,
    /// The window could not be opened
    Blocked,
    /// No redirect arrived before the deadline
    TimedOut,
}

/// Host window operations
///
/// Implementations:
/// - **Web**: `window.open` with location polling, `location.assign`,
///   `history.replaceState`, `location.reload`
/// - **Native**: headless recorder (`bridge-desktop`)
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait WindowHost: PlatformSendSync {
    /// Full URL of the current page, including query and fragment
    fn current_url(&self) -> Result<String>;

    /// Open a popup at `url` and wait until it returns to `redirect_uri`,
    /// closes, or `timeout` elapses.
    async fn open_popup(
        &self,
        url: &str,
        features: PopupFeatures,
        redirect_uri: &str,
        timeout: Duration,
    ) -> Result<PopupOutcome>;

    /// Navigate the current page away
    fn navigate(&self, url: &str) -> Result<()>;

    /// Replace the current URL without navigating
    fn replace_url(&self, url: &str) -> Result<()>;

    fn reload(&self) -> Result<()>;

    /// Open `url` in a new top-level window (escape hatch for embedded pages)
    fn open_new_window(&self, url: &str) -> Result<()>;
}
