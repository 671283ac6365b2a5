//! # Application Configuration
//!
//! Settings for the chat client: identity-provider registration, the Graph
//! endpoint, the text-generation model and the timing constants that drive the
//! authentication state machine.
//!
//! ## Overview
//!
//! `AppConfig` is assembled with a builder. Every setting has a default except
//! the three externally supplied values (client id, tenant id, model API key).
//! Those are not checked at startup: a wrong client id surfaces as a provider
//! error during sign-in, a wrong API key as a generation failure.
//! [`AppConfig::validate`] only checks the structural settings.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .client_id("00000000-0000-0000-0000-000000000000")
//!     .tenant_id("contoso.onmicrosoft.com")
//!     .model_api_key(std::env::var("OPENAI_API_KEY").unwrap_or_default())
//!     .build()?;
//! ```
//!
//! ## Environment
//!
//! [`AppConfig::from_env`] reads `AZURE_AD_CLIENT_ID`, `AZURE_AD_TENANT_ID` and
//! `OPENAI_API_KEY`. Missing variables become empty strings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_CLIENT_ID: &str = "AZURE_AD_CLIENT_ID";
pub const ENV_TENANT_ID: &str = "AZURE_AD_TENANT_ID";
pub const ENV_MODEL_API_KEY: &str = "OPENAI_API_KEY";

/// Scopes requested at sign-in
pub const DEFAULT_SCOPES: &[&str] = &[
    "User.Read",
    "Sites.Read.All",
    "Files.Read.All",
    "Sites.ReadWrite.All",
];

/// Identity-provider registration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Application (client) id
    pub client_id: String,
    /// Tenant id or domain; `common` when empty
    pub tenant_id: String,
    /// Identity-provider host
    pub authority_host: String,
    /// Delegated resource scopes
    pub scopes: Vec<String>,
    /// Hostname substring identifying the preview-hosting environment
    pub preview_host_marker: String,
    /// Origin used when the page origin cannot be read
    pub fallback_origin: String,
}

impl AuthSettings {
    /// `https://{authority_host}/{tenant}`
    pub fn authority(&self) -> String {
        let tenant = if self.tenant_id.trim().is_empty() {
            "common"
        } else {
            self.tenant_id.trim()
        };
        format!("https://{}/{}", self.authority_host.trim_end_matches('/'), tenant)
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            tenant_id: String::new(),
            authority_host: "login.microsoftonline.com".to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            preview_host_marker: "lite.vusercontent.net".to_string(),
            fallback_origin: "https://v0-it-project.vercel.app".to_string(),
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("client_id", &self.client_id)
            .field("authority", &self.authority())
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Microsoft Graph endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSettings {
    pub endpoint: String,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://graph.microsoft.com/v1.0".to_string(),
        }
    }
}

/// Text-generation model
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 500,
        }
    }
}

impl std::fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSettings")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Timers used by the authentication state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Popup assumed closed if no outcome arrives within this window
    pub popup_timeout: Duration,
    /// Delay before a detected in-progress interaction is re-checked and cleared
    pub interaction_watchdog: Duration,
    /// Pause after a reset so storage mutation settles before reloading
    pub reset_settle: Duration,
    /// Maximum time a popup may take to return to the redirect URI
    pub window_hash_timeout: Duration,
    /// Maximum time a hidden frame may take to return
    pub iframe_hash_timeout: Duration,
    /// Delay before navigating a frame
    pub navigate_frame_wait: Duration,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            popup_timeout: Duration::from_secs(60),
            interaction_watchdog: Duration::from_secs(30),
            reset_settle: Duration::from_millis(500),
            window_hash_timeout: Duration::from_secs(60),
            iframe_hash_timeout: Duration::from_secs(10),
            navigate_frame_wait: Duration::from_millis(500),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub auth: AuthSettings,
    pub graph: GraphSettings,
    pub model: ModelSettings,
    pub timing: TimingSettings,
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Builds a configuration from the process environment.
    ///
    /// Missing variables are left empty; see the module docs.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::builder()
            .client_id(lookup(ENV_CLIENT_ID).unwrap_or_default())
            .tenant_id(lookup(ENV_TENANT_ID).unwrap_or_default())
            .model_api_key(lookup(ENV_MODEL_API_KEY).unwrap_or_default())
            .build()
    }

    /// Validates structural settings.
    ///
    /// This checks:
    /// - Endpoints are `https://` URLs
    /// - Timers are non-zero
    /// - At least one scope is requested
    ///
    /// Credentials are not checked.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("graph endpoint", &self.graph.endpoint),
            ("model base URL", &self.model.base_url),
        ] {
            if !url.starts_with("https://") && !url.starts_with("http://localhost") {
                return Err(Error::Config(format!(
                    "The {} must be an https URL, got '{}'",
                    name, url
                )));
            }
        }

        if self.auth.authority_host.trim().is_empty() {
            return Err(Error::Config("Authority host cannot be empty".to_string()));
        }

        if self.auth.scopes.is_empty() {
            return Err(Error::Config(
                "At least one scope must be requested".to_string(),
            ));
        }

        let timing = &self.timing;
        if timing.popup_timeout.is_zero()
            || timing.interaction_watchdog.is_zero()
            || timing.window_hash_timeout.is_zero()
        {
            return Err(Error::Config(
                "Popup, watchdog and window-hash timeouts must be greater than zero".to_string(),
            ));
        }

        if self.model.max_tokens == 0 {
            return Err(Error::Config(
                "Model max_tokens must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`AppConfig`]
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.auth.client_id = client_id.into();
        self
    }

    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.config.auth.tenant_id = tenant_id.into();
        self
    }

    pub fn authority_host(mut self, host: impl Into<String>) -> Self {
        self.config.auth.authority_host = host.into();
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.auth.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn preview_host_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.auth.preview_host_marker = marker.into();
        self
    }

    pub fn fallback_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.auth.fallback_origin = origin.into();
        self
    }

    pub fn graph_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.graph.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.model.api_key = api_key.into();
        self
    }

    pub fn model_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.model.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.model.max_tokens = max_tokens;
        self
    }

    pub fn timing(mut self, timing: TimingSettings) -> Self {
        self.config.timing = timing;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<AppConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
