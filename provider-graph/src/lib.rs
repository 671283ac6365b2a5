//! # Microsoft Graph Provider
//!
//! Thin client for the Microsoft Graph endpoints the chat assistant reads.
//!
//! ## Overview
//!
//! This module provides:
//! - Federated search across drive items, list items, sites and lists
//! - Document content download by drive and item id
//! - Site metadata lookup
//! - A `/me` connectivity check and profile photo download
//! - Retry with backoff for throttling and transient server errors
//!
//! Every call is authorized with a bearer token from an
//! [`AccessTokenSource`](core_auth::AccessTokenSource), fetched per request.

pub mod client;
pub mod error;
pub mod types;

pub use client::GraphClient;
pub use error::{GraphError, Result};
pub use types::{SearchRequest, SiteInfo, UserProfile};
