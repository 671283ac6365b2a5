//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the chat core and the environment it
//! runs in. The production host is a browser page (`bridge-wasm`); native hosts
//! (`bridge-desktop`) exist for headless use and for tests.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP for the token endpoint, Graph and the model API
//!
//! ### Storage
//! - [`WebStorage`](storage::WebStorage) - Session/durable key-value stores
//! - [`CookieJar`](storage::CookieJar) - Document cookies
//!
//! ### Page Integration
//! - [`BrowserEnvironment`](environment::BrowserEnvironment) - Frame, hostname, origin and popup facts
//! - [`WindowHost`](window::WindowHost) - Popups, navigation and reloads
//!
//! ### Utilities
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Browser  | `bridge-wasm`       |
//! | Native   | `bridge-desktop`    |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations convert host errors (`JsValue`, `reqwest::Error`) into it and
//! keep the message actionable.
//!
//! ## Thread Safety
//!
//! Bridge traits require [`PlatformSendSync`](platform::PlatformSendSync):
//! `Send + Sync` on native targets, nothing on `wasm32` where everything runs
//! on the page's event loop.

pub mod environment;
pub mod error;
pub mod http;
pub mod platform;
pub mod storage;
pub mod time;
pub mod window;

pub use error::BridgeError;

// Re-export commonly used types
pub use environment::BrowserEnvironment;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use platform::{PlatformSend, PlatformSendSync};
pub use storage::{CookieJar, WebStorage};
pub use time::{LogEntry, LogLevel, LoggerSink};
pub use window::{PopupFeatures, PopupOutcome, WindowHost};
