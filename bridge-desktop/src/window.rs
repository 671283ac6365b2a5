//! Window host for native hosts: records navigation, cannot open popups.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    window::{PopupFeatures, PopupOutcome, WindowHost},
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct Recorded {
    current_url: String,
    navigations: Vec<String>,
    popups: Vec<String>,
    new_windows: Vec<String>,
    reloads: usize,
}

/// [`WindowHost`] without a display.
///
/// Navigations are recorded so a host can forward them (for example by
/// printing the sign-in URL). Popups always report [`PopupOutcome::Blocked`].
#[derive(Default)]
pub struct HeadlessWindowHost {
    recorded: Mutex<Recorded>,
}

impl HeadlessWindowHost {
    pub fn new(current_url: impl Into<String>) -> Self {
        Self {
            recorded: Mutex::new(Recorded {
                current_url: current_url.into(),
                ..Recorded::default()
            }),
        }
    }

    /// Simulate the browser landing on `url` (e.g. a sign-in callback).
    pub fn set_current_url(&self, url: impl Into<String>) {
        self.recorded().current_url = url.into();
    }

    pub fn navigations(&self) -> Vec<String> {
        self.recorded().navigations.clone()
    }

    pub fn popups(&self) -> Vec<String> {
        self.recorded().popups.clone()
    }

    pub fn new_windows(&self) -> Vec<String> {
        self.recorded().new_windows.clone()
    }

    pub fn reload_count(&self) -> usize {
        self.recorded().reloads
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WindowHost for HeadlessWindowHost {
    fn current_url(&self) -> Result<String> {
        Ok(self.recorded().current_url.clone())
    }

    async fn open_popup(
        &self,
        url: &str,
        _features: PopupFeatures,
        _redirect_uri: &str,
        _timeout: Duration,
    ) -> Result<PopupOutcome> {
        debug!(url, "Popup requested on a headless host");
        self.recorded().popups.push(url.to_string());
        Ok(PopupOutcome::Blocked)
    }

    fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, "Navigation recorded");
        self.recorded().navigations.push(url.to_string());
        Ok(())
    }

    fn replace_url(&self, url: &str) -> Result<()> {
        self.recorded().current_url = url.to_string();
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        self.recorded().reloads += 1;
        Ok(())
    }

    fn open_new_window(&self, url: &str) -> Result<()> {
        self.recorded().new_windows.push(url.to_string());
        Ok(())
    }
}
