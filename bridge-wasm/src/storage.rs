//! Web Storage and cookie bridges.
//!
//! `BrowserWebStorage` wraps `sessionStorage` or `localStorage`;
//! `DocumentCookieJar` reads and writes `document.cookie`.

use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    storage::{CookieJar, WebStorage},
};
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

use crate::error::{browser_window, js_error};

/// Attributes that make a cookie expire immediately.
pub const EXPIRED_COOKIE_ATTRIBUTES: &str = "expires=Thu, 01 Jan 1970 00:00:00 UTC; path=/;";

#[derive(Clone)]
/// A browser `Storage` area.
pub struct BrowserWebStorage {
    storage: web_sys::Storage,
    label: &'static str,
}

impl BrowserWebStorage {
    /// The page's `sessionStorage`.
    pub fn session() -> BridgeResult<Self> {
        let storage = browser_window()?
            .session_storage()
            .map_err(|err| js_error("sessionStorage", err))?
            .ok_or_else(|| BridgeError::NotAvailable("sessionStorage".into()))?;
        Ok(Self {
            storage,
            label: "sessionStorage",
        })
    }

    /// The origin's `localStorage`.
    pub fn local() -> BridgeResult<Self> {
        let storage = browser_window()?
            .local_storage()
            .map_err(|err| js_error("localStorage", err))?
            .ok_or_else(|| BridgeError::NotAvailable("localStorage".into()))?;
        Ok(Self {
            storage,
            label: "localStorage",
        })
    }
}

impl WebStorage for BrowserWebStorage {
    fn label(&self) -> &str {
        self.label
    }

    fn keys(&self) -> BridgeResult<Vec<String>> {
        let length = self
            .storage
            .length()
            .map_err(|err| js_error("storage.length", err))?;

        let mut keys = Vec::with_capacity(length as usize);
        for index in 0..length {
            if let Some(key) = self
                .storage
                .key(index)
                .map_err(|err| js_error("storage.key", err))?
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn get(&self, key: &str) -> BridgeResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|err| js_error("get_item", err))
    }

    fn set(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.storage
            .set_item(key, value)
            .map_err(|err| js_error("set_item", err))
    }

    fn remove(&self, key: &str) -> BridgeResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|err| js_error("remove_item", err))
    }
}

#[derive(Clone)]
/// Cookies of the current document.
pub struct DocumentCookieJar {
    document: HtmlDocument,
}

impl DocumentCookieJar {
    /// Bind to `window.document`.
    pub fn new() -> BridgeResult<Self> {
        let document = browser_window()?
            .document()
            .ok_or_else(|| BridgeError::NotAvailable("document".into()))?
            .dyn_into::<HtmlDocument>()
            .map_err(|_| BridgeError::NotAvailable("HTML document".into()))?;
        Ok(Self { document })
    }

    fn raw(&self) -> BridgeResult<String> {
        self.document
            .cookie()
            .map_err(|err| js_error("document.cookie", err))
    }

    fn write(&self, cookie: &str) -> BridgeResult<()> {
        self.document
            .set_cookie(cookie)
            .map_err(|err| js_error("set document.cookie", err))
    }
}

impl CookieJar for DocumentCookieJar {
    fn names(&self) -> BridgeResult<Vec<String>> {
        Ok(parse_cookie_names(&self.raw()?))
    }

    fn set(&self, name: &str, value: &str) -> BridgeResult<()> {
        self.write(&format!("{name}={value}; path=/; SameSite=Lax"))
    }

    fn expire(&self, name: &str) -> BridgeResult<()> {
        self.write(&format!("{name}=; {EXPIRED_COOKIE_ATTRIBUTES}"))
    }
}

/// Cookie names from a `document.cookie` string (`a=1; b=2`).
pub fn parse_cookie_names(raw: &str) -> Vec<String> {
    raw.split(';')
        .filter_map(|pair| {
            let name = pair.split('=').next()?.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}
