//! WebAssembly Bridge Implementations
//!
//! This crate provides browser implementations of the bridge traits defined
//! in `bridge-traits`, built on `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It will not compile for native targets.
//!
//! # Implementations
//!
//! - `WasmHttpClient`: `fetch` with `AbortController` timeouts
//! - `BrowserWebStorage`: `sessionStorage` / `localStorage`
//! - `DocumentCookieJar`: `document.cookie`
//! - `WasmBrowserEnvironment`: frame, origin and popup detection
//! - `WasmWindowHost`: popups, navigation and history
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::build_wasm_bridges;
//!
//! let bridges = build_wasm_bridges()?;
//! let origin = bridges.environment.origin();
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod environment;
pub mod error;
pub mod http;
pub mod storage;
pub mod window;

// Re-export commonly used types
pub use bootstrap::{build_wasm_bridges, WasmBridgeSet};
pub use environment::WasmBrowserEnvironment;
pub use error::{WasmError, WasmResult};
pub use http::WasmHttpClient;
pub use storage::{BrowserWebStorage, DocumentCookieJar};
pub use window::WasmWindowHost;
