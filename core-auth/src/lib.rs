//! # Authentication Module
//!
//! Browser sign-in session management against the Microsoft identity platform.
//!
//! ## Overview
//!
//! This module owns the authentication client instance, drives the sign-in
//! state machine shown by the UI, and hands out access tokens for Microsoft
//! Graph calls. Host capabilities (storage, cookies, window, HTTP) come in
//! through `bridge-traits`.
//!
//! ## Features
//!
//! - Single-flight client initialization with reset and generation tracking
//! - Popup and redirect sign-in with authorization code + PKCE
//! - Classification of provider failures into user-facing session phases
//! - Stuck-interaction detection and recovery
//! - Silent token acquisition with popup fallback
//! - Diagnostics snapshot of client, accounts and provider storage
//!
//! ## Layout
//!
//! - [`client`]: the provider client contract and observer hook
//! - [`pkce_client`]: the concrete client over the host bridges
//! - [`lifecycle`]: ownership of the client instance
//! - [`coordinator`]: the session state machine
//! - [`interaction`]: interaction-in-progress tracking
//! - [`token`]: access tokens for resource calls

pub mod client;
pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod interaction;
pub mod lifecycle;
pub mod oauth;
pub mod pkce_client;
pub mod signature;
pub mod storage;
pub mod token;
pub mod types;

#[cfg(all(test, not(target_arch = "wasm32")))]
pub(crate) mod test_support;

pub use client::{
    AuthClient, ClientEvent, ClientEventKind, ClientEventObserver, ClientFactory, ObserverId,
    ProviderResult,
};
pub use config::{ClientConfig, LoginRequest, TokenRequest};
pub use coordinator::{select_flow, SessionCoordinator, SessionSnapshot};
pub use diagnostics::AuthDiagnostics;
pub use error::{AuthError, ProviderError, Result};
pub use interaction::InteractionTracker;
pub use lifecycle::{ClientHandle, ClientLifecycle};
pub use pkce_client::{PkceAuthClient, PkceClientFactory};
pub use storage::ProviderStorage;
pub use token::{AccessTokenSource, SessionTokenSource};
pub use types::{
    AuthenticationResult, ConfigurationErrorKind, Identity, InteractionFlow, InteractionStatus,
    SessionPhase, TokenSet,
};
