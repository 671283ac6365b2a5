//! Async synchronization primitives.
//!
//! - On native platforms: `tokio::sync::Mutex`
//! - On WASM: `futures::lock::Mutex` (single-threaded)
//!
//! Both expose `Mutex::new` and `lock().await`, which is the only surface the
//! workspace relies on. Short, non-async critical sections use
//! `std::sync::Mutex` directly.

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::sync::{Mutex, MutexGuard};

#[cfg(target_arch = "wasm32")]
pub use futures::lock::{Mutex, MutexGuard};
