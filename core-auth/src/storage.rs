//! Provider storage artifacts.
//!
//! The authentication client keeps its cache, pending request and
//! interaction markers in browser storage under a provider namespace. This
//! module finds and purges those entries across session storage, local
//! storage and cookies.

use bridge_traits::storage::{CookieJar, WebStorage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Key prefixes owned by the authentication client
pub const DEFAULT_KEY_PREFIXES: &[&str] = &["msal."];

/// Key fragments that mark an interactive flow as running
pub const INTERACTION_MARKERS: &[&str] = &["interaction.status", "interaction.in.progress"];

const DISPLAY_VALUE_LIMIT: usize = 50;

/// One provider entry, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Label of the store (`sessionStorage`, `localStorage`, `cookie`)
    pub store: String,
    pub key: String,
    /// Value truncated for display
    pub value: String,
}

/// Access to the provider's persisted artifacts.
#[derive(Clone)]
pub struct ProviderStorage {
    session: Arc<dyn WebStorage>,
    local: Arc<dyn WebStorage>,
    cookies: Arc<dyn CookieJar>,
    prefixes: Arc<Vec<String>>,
}

impl ProviderStorage {
    pub fn new(
        session: Arc<dyn WebStorage>,
        local: Arc<dyn WebStorage>,
        cookies: Arc<dyn CookieJar>,
    ) -> Self {
        Self {
            session,
            local,
            cookies,
            prefixes: Arc::new(DEFAULT_KEY_PREFIXES.iter().map(|p| p.to_string()).collect()),
        }
    }

    /// Replace the prefix list.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = Arc::new(prefixes.into_iter().map(Into::into).collect());
        self
    }

    pub fn matches(&self, key: &str) -> bool {
        self.prefixes.iter().any(|prefix| key.starts_with(prefix.as_str()))
    }

    /// Session-scoped store, where the client keeps its cache.
    pub fn session(&self) -> &Arc<dyn WebStorage> {
        &self.session
    }

    pub fn cookies(&self) -> &Arc<dyn CookieJar> {
        &self.cookies
    }

    /// Remove every provider entry from both stores and the cookie jar.
    ///
    /// Best-effort: a failing key is logged and skipped. Calling it on a
    /// clean store does nothing.
    #[instrument(skip(self))]
    pub fn clear_all(&self) {
        let removed = self.clear_store(self.session.as_ref(), |_| true)
            + self.clear_store(self.local.as_ref(), |_| true)
            + self.clear_cookies();

        info!(removed, "Provider storage cleared");
    }

    /// Remove only interaction markers from both stores.
    ///
    /// Used at startup: a marker left behind by an abandoned page is stale,
    /// while cached accounts and a pending redirect request are not.
    #[instrument(skip(self))]
    pub fn clear_interaction_markers(&self) {
        let removed = self.clear_store(self.session.as_ref(), is_interaction_marker)
            + self.clear_store(self.local.as_ref(), is_interaction_marker);

        if removed > 0 {
            info!(removed, "Stale interaction markers cleared");
        }
    }

    /// Heuristic: does any session key carry an interaction marker?
    pub fn has_interaction_marker(&self) -> bool {
        match self.session.keys() {
            Ok(keys) => keys
                .iter()
                .any(|key| self.matches(key) && is_interaction_marker(key)),
            Err(e) => {
                warn!(store = self.session.label(), error = %e, "Failed to list storage keys");
                false
            }
        }
    }

    /// Snapshot of every provider entry across both stores and the cookie jar.
    pub fn provider_entries(&self) -> Vec<StorageEntry> {
        let mut entries = Vec::new();

        for store in [self.session.as_ref(), self.local.as_ref()] {
            for key in self.matching_keys(store) {
                let value = match store.get(&key) {
                    Ok(Some(value)) => truncate_for_display(&value),
                    Ok(None) => continue,
                    Err(e) => format!("<unreadable: {}>", e),
                };
                entries.push(StorageEntry {
                    store: store.label().to_string(),
                    key,
                    value,
                });
            }
        }

        if let Ok(names) = self.cookies.names() {
            entries.extend(names.into_iter().filter(|n| self.matches(n)).map(|name| {
                StorageEntry {
                    store: "cookie".to_string(),
                    key: name,
                    value: String::new(),
                }
            }));
        }

        entries
    }

    fn matching_keys(&self, store: &dyn WebStorage) -> Vec<String> {
        match store.keys() {
            Ok(keys) => keys.into_iter().filter(|key| self.matches(key)).collect(),
            Err(e) => {
                warn!(store = store.label(), error = %e, "Failed to list storage keys");
                Vec::new()
            }
        }
    }

    fn clear_store(&self, store: &dyn WebStorage, also: impl Fn(&str) -> bool) -> usize {
        let mut removed = 0;
        for key in self.matching_keys(store).into_iter().filter(|key| also(key)) {
            match store.remove(&key) {
                Ok(()) => {
                    debug!(store = store.label(), key = %key, "Removed provider entry");
                    removed += 1;
                }
                Err(e) => {
                    warn!(
                        store = store.label(),
                        key = %key,
                        error = %e,
                        "Failed to remove provider entry"
                    );
                }
            }
        }
        removed
    }

    fn clear_cookies(&self) -> usize {
        let names = match self.cookies.names() {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Failed to list cookies");
                return 0;
            }
        };

        let mut removed = 0;
        for name in names.into_iter().filter(|name| self.matches(name)) {
            match self.cookies.expire(&name) {
                Ok(()) => {
                    debug!(cookie = %name, "Expired provider cookie");
                    removed += 1;
                }
                Err(e) => warn!(cookie = %name, error = %e, "Failed to expire provider cookie"),
            }
        }
        removed
    }
}

fn is_interaction_marker(key: &str) -> bool {
    INTERACTION_MARKERS.iter().any(|marker| key.contains(marker))
}

fn truncate_for_display(value: &str) -> String {
    if value.chars().count() <= DISPLAY_VALUE_LIMIT {
        value.to_string()
    } else {
        let head: String = value.chars().take(DISPLAY_VALUE_LIMIT).collect();
        format!("{}...", head)
    }
}
