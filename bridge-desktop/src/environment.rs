//! Environment answers for hosts without a browser window.

use bridge_traits::environment::BrowserEnvironment;
use std::sync::atomic::{AtomicBool, Ordering};

/// Configurable [`BrowserEnvironment`] for native hosts and tests.
///
/// Defaults to "no browser": the authentication core then stays signed out
/// instead of failing.
pub struct HeadlessEnvironment {
    origin: Option<String>,
    browser: AtomicBool,
    embedded: AtomicBool,
    popups: AtomicBool,
}

impl HeadlessEnvironment {
    pub fn new() -> Self {
        Self {
            origin: None,
            browser: AtomicBool::new(false),
            embedded: AtomicBool::new(false),
            popups: AtomicBool::new(false),
        }
    }

    /// Pretend to be a top-level page served from `origin`.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        let env = Self {
            origin: Some(origin.into().trim_end_matches('/').to_string()),
            ..Self::new()
        };
        env.browser.store(true, Ordering::Relaxed);
        env
    }

    pub fn embedded(self, embedded: bool) -> Self {
        self.embedded.store(embedded, Ordering::Relaxed);
        self
    }

    pub fn popups(self, supported: bool) -> Self {
        self.popups.store(supported, Ordering::Relaxed);
        self
    }
}

impl Default for HeadlessEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserEnvironment for HeadlessEnvironment {
    fn is_browser(&self) -> bool {
        self.browser.load(Ordering::Relaxed)
    }

    fn is_embedded(&self) -> bool {
        self.embedded.load(Ordering::Relaxed)
    }

    fn hostname(&self) -> Option<String> {
        let origin = self.origin.as_deref()?;
        let host = origin.split("://").nth(1).unwrap_or(origin);
        Some(host.split(':').next().unwrap_or(host).to_string())
    }

    fn origin(&self) -> Option<String> {
        self.origin.clone()
    }

    fn popups_supported(&self) -> bool {
        self.popups.load(Ordering::Relaxed)
    }
}
