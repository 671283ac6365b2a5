//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the chat core:
//! - Logging and tracing infrastructure
//! - Application configuration
//! - Event bus system
//!
//! ## Overview
//!
//! This crate holds the runtime utilities that the authentication core, the
//! Graph provider and the query pipeline depend on. It fixes the logging
//! conventions, the configuration surface and the event types used throughout
//! the workspace.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use error::{Error, Result};
