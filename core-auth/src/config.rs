//! Static configuration handed to an authentication client at construction.

use bridge_traits::window::PopupFeatures;
use core_runtime::config::{AuthSettings, TimingSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::Identity;

/// OIDC scopes requested alongside the resource scopes
pub const OIDC_SCOPES: &[&str] = &["openid", "profile", "offline_access"];

/// Prompt sent with interactive sign-in so the user picks an account
pub const SELECT_ACCOUNT_PROMPT: &str = "select_account";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheLocation {
    SessionStorage,
    LocalStorage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheOptions {
    pub location: CacheLocation,
    /// Mirror request state into a cookie so it survives storage partitioning
    pub store_auth_state_in_cookie: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemOptions {
    pub window_hash_timeout: Duration,
    pub iframe_hash_timeout: Duration,
    pub navigate_frame_wait: Duration,
    pub allow_redirect_in_iframe: bool,
}

/// Client instance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    /// `https://{host}/{tenant}`
    pub authority: String,
    pub redirect_uri: String,
    pub post_logout_redirect_uri: String,
    pub navigate_to_login_request_url: bool,
    pub cache: CacheOptions,
    pub system: SystemOptions,
}

impl ClientConfig {
    /// Build the configuration for a page served from `origin`.
    ///
    /// Redirect and post-logout URIs both point back at the origin.
    pub fn from_settings(auth: &AuthSettings, timing: &TimingSettings, origin: &str) -> Self {
        let origin = origin.trim_end_matches('/').to_string();
        Self {
            client_id: auth.client_id.clone(),
            authority: auth.authority(),
            redirect_uri: origin.clone(),
            post_logout_redirect_uri: origin,
            navigate_to_login_request_url: true,
            cache: CacheOptions {
                location: CacheLocation::SessionStorage,
                store_auth_state_in_cookie: true,
            },
            system: SystemOptions {
                window_hash_timeout: timing.window_hash_timeout,
                iframe_hash_timeout: timing.iframe_hash_timeout,
                navigate_frame_wait: timing.navigate_frame_wait,
                allow_redirect_in_iframe: true,
            },
        }
    }

    /// Host part of the authority, recorded on accounts as their environment.
    pub fn authority_host(&self) -> String {
        url::Url::parse(&self.authority)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default()
    }
}

/// Interactive sign-in request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub scopes: Vec<String>,
    pub prompt: Option<String>,
    pub login_hint: Option<String>,
    pub popup: PopupFeatures,
}

impl LoginRequest {
    /// The standard request: configured scopes, `select_account`, default popup placement.
    pub fn from_settings(auth: &AuthSettings) -> Self {
        Self {
            scopes: auth.scopes.clone(),
            prompt: Some(SELECT_ACCOUNT_PROMPT.to_string()),
            login_hint: None,
            popup: PopupFeatures::default(),
        }
    }
}

/// Token request for a specific account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub scopes: Vec<String>,
    pub account: Identity,
    pub force_refresh: bool,
}

impl TokenRequest {
    pub fn new(scopes: Vec<String>, account: Identity) -> Self {
        Self {
            scopes,
            account,
            force_refresh: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_uri_follows_origin() {
        let auth = AuthSettings {
            client_id: "client".into(),
            tenant_id: "contoso".into(),
            ..AuthSettings::default()
        };
        let config =
            ClientConfig::from_settings(&auth, &TimingSettings::default(), "https://app.example/");

        assert_eq!(config.redirect_uri, "https://app.example");
        assert_eq!(config.post_logout_redirect_uri, "https://app.example");
        assert_eq!(config.authority, "https://login.microsoftonline.com/contoso");
        assert_eq!(config.authority_host(), "login.microsoftonline.com");
        assert_eq!(config.cache.location, CacheLocation::SessionStorage);
        assert!(config.cache.store_auth_state_in_cookie);
        assert_eq!(config.system.window_hash_timeout, Duration::from_secs(60));
        assert_eq!(config.system.iframe_hash_timeout, Duration::from_secs(10));
        assert!(config.system.allow_redirect_in_iframe);
    }

    #[test]
    fn login_request_selects_account() {
        let request = LoginRequest::from_settings(&AuthSettings::default());
        assert_eq!(request.prompt.as_deref(), Some("select_account"));
        assert_eq!(request.scopes.len(), 4);
        assert_eq!(request.popup, PopupFeatures::default());
    }
}
