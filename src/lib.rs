//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (mainly `core-service`). Host applications can depend on
//! `sharepoint-chat-workspace` and pick `desktop-shims` or `wasm` without
//! wiring each crate individually.

#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_service::*;
