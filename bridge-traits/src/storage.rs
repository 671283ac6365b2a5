//! Browser Storage Abstractions
//!
//! Mirrors the synchronous Web Storage API (`sessionStorage`/`localStorage`)
//! and the document cookie jar. The authentication core keeps its cache and
//! interaction markers here and purges them on reset.

use crate::{error::Result, platform::PlatformSendSync};

/// Synchronous key-value store with Web Storage semantics
///
/// Implementations:
/// - **Web**: `window.sessionStorage` / `window.localStorage`
/// - **Native**: in-memory map (`bridge-desktop`)
///
/// Every call is synchronous, matching the browser API. A failure on one key
/// must not poison the store; callers treat failures as per-key.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::WebStorage;
///
/// fn purge(storage: &dyn WebStorage) -> bridge_traits::error::Result<()> {
///     for key in storage.keys()? {
///         if key.starts_with("msal.") {
///             storage.remove(&key)?;
///         }
///     }
///     Ok(())
/// }
/// ```
pub trait WebStorage: PlatformSendSync {
    /// Human-readable name of the backing store, used in logs
    fn label(&self) -> &str;

    /// Snapshot of every key currently in the store
    fn keys(&self) -> Result<Vec<String>>;

    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Document cookie jar
///
/// Only cookie names are observable; values stay opaque to the core.
pub trait CookieJar: PlatformSendSync {
    fn names(&self) -> Result<Vec<String>>;

    /// Write a session cookie scoped to `/`
    fn set(&self, name: &str, value: &str) -> Result<()>;

    /// Expire a cookie (`name=; expires=Thu, 01 Jan 1970 00:00:00 UTC; path=/;`)
    fn expire(&self, name: &str) -> Result<()>;
}
