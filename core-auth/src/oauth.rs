//! OAuth 2.0 Authorization Code Flow with PKCE against the Microsoft identity platform
//!
//! This module implements RFC 6749 (OAuth 2.0), RFC 7636 (PKCE) and the parts
//! of OpenID Connect a public browser client needs, over the v2 endpoints
//! `{authority}/oauth2/v2.0/{authorize,token,logout}`.
//!
//! # Overview
//!
//! The OAuth flow manager handles:
//! - Building authorization URLs with PKCE challenge, state and nonce
//! - Exchanging authorization codes for tokens
//! - Refreshing access tokens
//! - Building logout URLs
//!
//! Helpers parse authorization responses out of a callback URL and decode
//! ID-token claims.
//!
//! # Security
//!
//! - Public client: no client secret is ever sent
//! - Generates cryptographically secure random state, nonce and code verifier
//! - Never logs sensitive values (tokens, codes, verifiers)
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{AuthorityEndpoints, AuthorizeParams, OAuthFlowManager};
//! use std::sync::Arc;
//!
//! # fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let flow = OAuthFlowManager::new(
//!     "client-id",
//!     "https://app.example",
//!     AuthorityEndpoints::from_authority("https://login.microsoftonline.com/common"),
//!     http_client,
//! );
//! let scopes = vec!["User.Read".to_string()];
//! let (auth_url, verifier) = flow.build_auth_url(&AuthorizeParams::new(&scopes))?;
//! // Send the user to auth_url, keep the verifier for the callback
//! # Ok(())
//! # }
//! ```

use crate::config::OIDC_SCOPES;
use crate::error::{codes, AuthError, ProviderError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_async::time::sleep;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Endpoints of a v2 authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityEndpoints {
    pub authorize: String,
    pub token: String,
    pub logout: String,
}

impl AuthorityEndpoints {
    pub fn from_authority(authority: &str) -> Self {
        let base = authority.trim_end_matches('/');
        Self {
            authorize: format!("{}/oauth2/v2.0/authorize", base),
            token: format!("{}/oauth2/v2.0/token", base),
            logout: format!("{}/oauth2/v2.0/logout", base),
        }
    }
}

/// PKCE (Proof Key for Code Exchange) verifier, plus the state and nonce
/// bound to the same authorization request.
///
/// # Security
///
/// The verifier must be kept secret and never transmitted to the authorization server.
/// Only the challenge (derived from the verifier) is sent during authorization.
#[derive(Clone, Serialize, Deserialize)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
    nonce: String,
}

impl PkceVerifier {
    /// Create a new PKCE verifier with cryptographically secure random values.
    ///
    /// Generates a 32-byte code verifier and 16-byte state and nonce values,
    /// all URL-safe base64 without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        // 43 characters once encoded, the RFC 7636 minimum
        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);

        let mut nonce_bytes = [0u8; 16];
        rng.fill(&mut nonce_bytes);

        Self {
            verifier: URL_SAFE_NO_PAD.encode(verifier_bytes),
            state: URL_SAFE_NO_PAD.encode(state_bytes),
            nonce: URL_SAFE_NO_PAD.encode(nonce_bytes),
        }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Compute the code challenge from the verifier.
    ///
    /// Uses S256 method: BASE64URL(SHA256(code_verifier))
    pub fn challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceVerifier")
            .field("verifier", &"[REDACTED]")
            .field("state", &self.state)
            .finish()
    }
}

/// Per-request authorization parameters.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizeParams<'a> {
    pub scopes: &'a [String],
    pub prompt: Option<&'a str>,
    pub login_hint: Option<&'a str>,
}

impl<'a> AuthorizeParams<'a> {
    pub fn new(scopes: &'a [String]) -> Self {
        Self {
            scopes,
            prompt: None,
            login_hint: None,
        }
    }
}

/// OAuth 2.0 flow manager for a public client.
pub struct OAuthFlowManager {
    client_id: String,
    redirect_uri: String,
    endpoints: AuthorityEndpoints,
    http_client: Arc<dyn HttpClient>,
}

impl OAuthFlowManager {
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        endpoints: AuthorityEndpoints,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            endpoints,
            http_client,
        }
    }

    pub fn endpoints(&self) -> &AuthorityEndpoints {
        &self.endpoints
    }

    /// Build the authorization URL with PKCE challenge, state and nonce.
    ///
    /// Returns the URL and the verifier, which must be kept until the
    /// authorization response comes back.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorize endpoint is not a valid URL.
    #[instrument(skip(self, params), fields(client_id = %self.client_id))]
    pub fn build_auth_url(&self, params: &AuthorizeParams<'_>) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();
        let challenge = verifier.challenge();

        let mut url = Url::parse(&self.endpoints.authorize)
            .map_err(|e| AuthError::Other(format!("Invalid authorize URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.client_id);
            query.append_pair("redirect_uri", &self.redirect_uri);
            query.append_pair("response_type", "code");
            query.append_pair("response_mode", "query");
            query.append_pair("scope", &request_scopes(params.scopes));
            query.append_pair("state", verifier.state());
            query.append_pair("nonce", verifier.nonce());
            query.append_pair("code_challenge", &challenge);
            query.append_pair("code_challenge_method", "S256");
            if let Some(prompt) = params.prompt {
                query.append_pair("prompt", prompt);
            }
            if let Some(hint) = params.login_hint {
                query.append_pair("login_hint", hint);
            }
        }

        debug!("Built authorization URL");

        Ok((url.to_string(), verifier))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// - `AuthError::StateMismatch` when `state` does not belong to `verifier`
    /// - `AuthError::Provider` carrying the token endpoint's `error` and
    ///   `error_description` (this is how SPA misconfiguration surfaces)
    /// - `AuthError::NetworkError` on transport failure
    #[instrument(skip(self, code, verifier), fields(client_id = %self.client_id))]
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &str,
        verifier: &PkceVerifier,
    ) -> Result<TokenResponse> {
        if state != verifier.state() {
            warn!("OAuth state mismatch in authorization response");
            return Err(AuthError::StateMismatch);
        }

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", verifier.verifier()),
        ];

        debug!("Exchanging authorization code for tokens");

        let request = HttpRequest::new(HttpMethod::Post, self.endpoints.token.clone())
            .form_encoded(encode_form(&params)?);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            warn!(
                status = response.status,
                "Token endpoint rejected the authorization code"
            );
            return Err(token_endpoint_error(&response, |body| {
                AuthError::InvalidAuthCode(body)
            }));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Other(format!("Failed to parse token response: {}", e)))?;

        info!(
            expires_in = token_response.expires_in,
            "Exchanged authorization code for tokens"
        );

        Ok(token_response)
    }

    /// Refresh an access token.
    ///
    /// Server errors are retried up to three times with exponential backoff.
    /// Client errors fail immediately.
    #[instrument(skip(self, refresh_token, scopes), fields(client_id = %self.client_id))]
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        scopes: &[String],
    ) -> Result<TokenResponse> {
        let scope = request_scopes(scopes);
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("scope", scope.as_str()),
        ];
        let body = encode_form(&params)?;

        debug!("Refreshing access token");

        let mut attempts = 0;
        const MAX_RETRIES: u32 = 3;

        loop {
            attempts += 1;

            let request = HttpRequest::new(HttpMethod::Post, self.endpoints.token.clone())
                .form_encoded(body.clone());

            let response = self
                .http_client
                .execute(request)
                .await
                .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

            if response.is_success() {
                let mut token_response: TokenResponse = response.json().map_err(|e| {
                    AuthError::Other(format!("Failed to parse token response: {}", e))
                })?;
                if token_response.refresh_token.is_none() {
                    token_response.refresh_token = Some(refresh_token.to_string());
                }

                info!(
                    expires_in = token_response.expires_in,
                    "Refreshed access token"
                );
                return Ok(token_response);
            }

            let status = response.status;

            if response.is_client_error() {
                warn!(status, "Token refresh rejected without retry");
                return Err(token_endpoint_error(&response, AuthError::TokenRefreshFailed));
            }

            if attempts >= MAX_RETRIES {
                let error_body = response
                    .text()
                    .unwrap_or_else(|_| "Unable to read error response".to_string());

                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token refresh failed after {} attempts. Last error: {} - {}",
                    attempts, status, error_body
                )));
            }

            let delay = Duration::from_millis(100 * 2u64.pow(attempts - 1));
            warn!(
                status,
                attempts,
                delay_ms = delay.as_millis() as u64,
                "Token refresh failed, retrying"
            );
            sleep(delay).await;
        }
    }

    /// End-session URL returning to `post_logout_redirect_uri`.
    pub fn logout_url(
        &self,
        post_logout_redirect_uri: &str,
        logout_hint: Option<&str>,
    ) -> Result<String> {
        let mut url = Url::parse(&self.endpoints.logout)
            .map_err(|e| AuthError::Other(format!("Invalid logout URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("post_logout_redirect_uri", post_logout_redirect_uri);
            if let Some(hint) = logout_hint {
                query.append_pair("logout_hint", hint);
            }
        }
        Ok(url.to_string())
    }
}

/// Scope string sent to the provider: resource scopes plus the OIDC scopes, deduplicated.
fn request_scopes(scopes: &[String]) -> String {
    let mut all: Vec<&str> = Vec::with_capacity(scopes.len() + OIDC_SCOPES.len());
    for scope in scopes.iter().map(String::as_str).chain(OIDC_SCOPES.iter().copied()) {
        if !all.contains(&scope) {
            all.push(scope);
        }
    }
    all.join(" ")
}

fn encode_form(params: &[(&str, &str)]) -> Result<String> {
    serde_urlencoded::to_string(params)
        .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))
}

/// Turn a token-endpoint failure into a provider error when the body follows
/// the OAuth error format, otherwise into `fallback(raw body)`.
fn token_endpoint_error(
    response: &HttpResponse,
    fallback: impl FnOnce(String) -> AuthError,
) -> AuthError {
    match response.json::<TokenErrorResponse>() {
        Ok(body) => AuthError::Provider(ProviderError::new(
            body.error,
            body.error_description.unwrap_or_default(),
        )),
        Err(_) => {
            let raw = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            fallback(format!("Token endpoint returned {}: {}", response.status, raw))
        }
    }
}

/// Token response from the token endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Granted scopes, falling back to `requested` when the response omits them.
    pub fn granted_scopes(&self, requested: &[String]) -> Vec<String> {
        match &self.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => requested.to_vec(),
        }
    }
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Claims read from the ID token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Decode the payload segment of a JWT.
///
/// The signature is not verified: the token came straight from the token
/// endpoint over TLS and is only used for display and account keys.
pub fn decode_id_token(id_token: &str) -> Result<IdTokenClaims> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::InvalidAuthCode("ID token is not a JWT".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidAuthCode(format!("ID token payload: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidAuthCode(format!("ID token claims: {}", e)))
}

/// Authorization response parameters found in a callback URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Provider error carried by the callback, if any.
    ///
    /// `access_denied` means the user declined and is reported as a cancellation.
    pub fn provider_error(&self) -> Option<ProviderError> {
        let error = self.error.as_deref()?;
        let description = self.error_description.clone().unwrap_or_default();
        if error == "access_denied" {
            Some(ProviderError::new(codes::USER_CANCELLED, description))
        } else {
            Some(ProviderError::new(error, description))
        }
    }
}

/// Read an authorization response from the query or fragment of `url`.
///
/// Returns `None` when neither carries a `code` or `error` parameter.
pub fn parse_callback(url: &str) -> Option<CallbackParams> {
    let parsed = Url::parse(url).ok()?;
    let candidates = [parsed.query(), parsed.fragment()];
    let found = candidates
        .into_iter()
        .flatten()
        .filter_map(|raw| serde_urlencoded::from_str::<CallbackParams>(raw).ok())
        .find(|params| params.code.is_some() || params.error.is_some());
    found
}
