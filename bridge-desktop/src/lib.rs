//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for native hosts
//! (macOS, Windows, Linux) and integration tests.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `WebStorage` and `CookieJar` held in memory
//! - `BrowserEnvironment` with configurable answers
//! - `WindowHost` that records navigations and blocks popups
//!
//! A native host has no page to redirect, so interactive sign-in cannot
//! complete here; the session core stays signed out and token calls fail
//! cleanly.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HeadlessEnvironment, MemoryCookieJar, MemoryWebStorage, ReqwestHttpClient};
//! use std::sync::Arc;
//!
//! let http = Arc::new(ReqwestHttpClient::new());
//! let session = Arc::new(MemoryWebStorage::session());
//! let local = Arc::new(MemoryWebStorage::local());
//! let cookies = Arc::new(MemoryCookieJar::new());
//! let environment = Arc::new(HeadlessEnvironment::new());
//! ```

mod environment;
mod http;
mod storage;
mod window;

pub use environment::HeadlessEnvironment;
pub use http::ReqwestHttpClient;
pub use storage::{MemoryCookieJar, MemoryWebStorage};
pub use window::HeadlessWindowHost;
