//! Runtime-agnostic async primitives for the SharePoint chat core.
//!
//! The authentication core is written against a single-threaded, cooperative
//! model (a browser event loop) but is also driven from tokio on native hosts
//! and in tests. This crate hides the difference:
//!
//! - Native platforms: re-exports from `tokio`
//! - WebAssembly: `gloo-timers` for timers, `wasm-bindgen-futures` for tasks,
//!   `futures::lock` for async locks
//!
//! All `core-*` and `provider-*` crates depend on this crate instead of
//! naming tokio directly.
//!
//! # Modules
//!
//! - `task`: detached task spawning
//! - `time`: sleep and timeout
//! - `sync`: async mutex
//! - `future`: boxed futures with the right `Send` bound per platform
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! fn arm_timer() {
//!     task::spawn_detached(async {
//!         sleep(Duration::from_secs(30)).await;
//!     });
//! }
//! ```

pub mod future;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn_detached;
pub use time::{sleep, Duration};
