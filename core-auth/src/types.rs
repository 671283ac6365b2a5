use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The signed-in principal.
///
/// Accounts are produced by the authentication client after a successful
/// sign-in or redirect completion and cached until sign-out or reset.
///
/// # Examples
///
/// ```
/// use core_auth::Identity;
///
/// let identity = Identity {
///     home_account_id: "oid.tid".to_string(),
///     local_account_id: "oid".to_string(),
///     tenant_id: "tid".to_string(),
///     username: "ada@contoso.com".to_string(),
///     display_name: None,
///     environment: "login.microsoftonline.com".to_string(),
/// };
///
/// assert_eq!(identity.display_name_or("User"), "User");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque provider-issued account reference (`{oid}.{tid}`)
    pub home_account_id: String,
    /// Object id of the user within the tenant
    pub local_account_id: String,
    pub tenant_id: String,
    /// Unique sign-in name (`preferred_username`)
    pub username: String,
    pub display_name: Option<String>,
    /// Identity-provider host that issued the account
    pub environment: String,
}

impl Identity {
    /// Display name, or `fallback` when the provider did not supply one.
    pub fn display_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => fallback,
        }
    }
}

/// Which registration problem blocks sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigurationErrorKind {
    /// The application is not registered as a single-page application.
    Spa,
    /// The redirect URI in use is not registered.
    RedirectUriMismatch,
}

impl ConfigurationErrorKind {
    /// Remediation shown to whoever administers the app registration.
    pub fn remediation(&self) -> &'static str {
        match self {
            ConfigurationErrorKind::Spa => {
                "The application must be registered as a Single-Page Application. In the app registration, add the redirect URI under the 'Single-page application' platform instead of 'Web'."
            }
            ConfigurationErrorKind::RedirectUriMismatch => {
                "The redirect URI used by this page is not registered for the application. Add this page's origin as a redirect URI in the app registration."
            }
        }
    }
}

/// Mutually exclusive authentication UI state.
///
/// # State Transitions
///
/// ```text
/// Loading -> Unauthenticated | Authenticated | ConfigurationError | Error
/// Unauthenticated -> Authenticating -> Authenticated
///                                   -> PopupClosedByUser | UserCancelled
///                                   -> InteractionInProgress
///                                   -> ConfigurationError | Error
/// * -> Unauthenticated (reset, sign-out)
/// ```
///
/// # Examples
///
/// ```
/// use core_auth::SessionPhase;
///
/// assert_eq!(SessionPhase::default(), SessionPhase::Loading);
/// assert!(SessionPhase::Authenticated.is_authenticated());
/// assert!(!SessionPhase::Unauthenticated.is_authenticated());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "phase", content = "detail")]
pub enum SessionPhase {
    #[default]
    Loading,
    Unauthenticated,
    Authenticating,
    InteractionInProgress,
    PopupClosedByUser,
    UserCancelled,
    ConfigurationError(ConfigurationErrorKind),
    Error {
        message: String,
    },
    Authenticated,
}

impl SessionPhase {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionPhase::Authenticated)
    }

    /// `true` while the coordinator is waiting on initialization or a flow.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionPhase::Loading | SessionPhase::Authenticating)
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, SessionPhase::ConfigurationError(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionPhase::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Loading => write!(f, "Loading"),
            SessionPhase::Unauthenticated => write!(f, "Unauthenticated"),
            SessionPhase::Authenticating => write!(f, "Authenticating"),
            SessionPhase::InteractionInProgress => write!(f, "InteractionInProgress"),
            SessionPhase::PopupClosedByUser => write!(f, "PopupClosedByUser"),
            SessionPhase::UserCancelled => write!(f, "UserCancelled"),
            SessionPhase::ConfigurationError(kind) => write!(f, "ConfigurationError({:?})", kind),
            SessionPhase::Error { .. } => write!(f, "Error"),
            SessionPhase::Authenticated => write!(f, "Authenticated"),
        }
    }
}

/// Interactive flow variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionFlow {
    Popup,
    Redirect,
}

impl InteractionFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionFlow::Popup => "popup",
            InteractionFlow::Redirect => "redirect",
        }
    }
}

impl fmt::Display for InteractionFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime interaction status reported by the authentication client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionStatus {
    None,
    Startup,
    Login,
    Logout,
    AcquireToken,
    SsoSilent,
    HandleRedirect,
}

impl InteractionStatus {
    /// Whether the status represents an interactive flow that blocks another one.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            InteractionStatus::Login
                | InteractionStatus::Logout
                | InteractionStatus::AcquireToken
                | InteractionStatus::HandleRedirect
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::None => "none",
            InteractionStatus::Startup => "startup",
            InteractionStatus::Login => "login",
            InteractionStatus::Logout => "logout",
            InteractionStatus::AcquireToken => "acquireToken",
            InteractionStatus::SsoSilent => "ssoSilent",
            InteractionStatus::HandleRedirect => "handleRedirect",
        }
    }

    /// Parse a persisted marker value. Unknown values map to `None`.
    pub fn from_marker(value: &str) -> Self {
        match value {
            "startup" => InteractionStatus::Startup,
            "login" => InteractionStatus::Login,
            "logout" => InteractionStatus::Logout,
            "acquireToken" => InteractionStatus::AcquireToken,
            "ssoSilent" => InteractionStatus::SsoSilent,
            "handleRedirect" => InteractionStatus::HandleRedirect,
            _ => InteractionStatus::None,
        }
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached token set for one account.
///
/// # Security
///
/// Tokens are never logged. The `Debug` implementation redacts them.
///
/// # Examples
///
/// ```
/// use core_auth::TokenSet;
///
/// let tokens = TokenSet::new("access".to_string(), Some("refresh".to_string()), 3600, vec![]);
/// assert!(!tokens.is_expired());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// Buffer before expiry inside which a cached access token is not reused.
    pub const EXPIRY_BUFFER_SECS: i64 = 300;

    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
            scopes,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(Self::EXPIRY_BUFFER_SECS)
    }

    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        Utc::now() >= self.expires_at - Duration::seconds(buffer_seconds)
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Result of a sign-in or token acquisition.
#[derive(Clone)]
pub struct AuthenticationResult {
    pub account: Identity,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub scopes: Vec<String>,
    /// `true` when served from the token cache without a network call
    pub from_cache: bool,
}

impl fmt::Debug for AuthenticationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationResult")
            .field("account", &self.account.username)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("from_cache", &self.from_cache)
            .finish()
    }
}
