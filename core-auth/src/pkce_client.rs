//! Browser authentication client over the host bridges.
//!
//! `PkceAuthClient` runs the authorization-code flow with PKCE in a popup or
//! through a full-page redirect and keeps its account and token cache in
//! session storage under `msal.<client_id>.*`:
//!
//! | Key | Content |
//! |-----|---------|
//! | `interaction.status` | marker for the running interactive flow |
//! | `request.params` | pending redirect request (verifier, state, nonce) |
//! | `accounts` | JSON list of cached accounts |
//! | `active-account` | home account id of the active account |
//! | `token.<home_account_id>` | cached token set |

use bridge_traits::error::BridgeError;
use bridge_traits::http::HttpClient;
use bridge_traits::storage::WebStorage;
use bridge_traits::window::{PopupFeatures, PopupOutcome, WindowHost};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::client::{
    AuthClient, ClientEvent, ClientEventKind, ClientEventObserver, ClientFactory, ObserverId,
    ObserverRegistry, ProviderResult,
};
use crate::config::{ClientConfig, LoginRequest, TokenRequest};
use crate::error::{codes, ProviderError};
use crate::oauth::{
    decode_id_token, parse_callback, AuthorityEndpoints, AuthorizeParams, CallbackParams,
    IdTokenClaims, OAuthFlowManager, PkceVerifier, TokenResponse,
};
use crate::storage::ProviderStorage;
use crate::types::{AuthenticationResult, Identity, InteractionFlow, InteractionStatus, TokenSet};

/// Storage keys for one client id.
#[derive(Debug, Clone)]
struct CacheKeys {
    base: String,
}

impl CacheKeys {
    fn new(client_id: &str) -> Self {
        Self {
            base: format!("msal.{}", client_id),
        }
    }

    fn interaction_status(&self) -> String {
        format!("{}.interaction.status", self.base)
    }

    fn request_params(&self) -> String {
        format!("{}.request.params", self.base)
    }

    fn request_state_cookie(&self) -> String {
        format!("{}.request.state", self.base)
    }

    fn accounts(&self) -> String {
        format!("{}.accounts", self.base)
    }

    fn active_account(&self) -> String {
        format!("{}.active-account", self.base)
    }

    fn token(&self, home_account_id: &str) -> String {
        format!("{}.token.{}", self.base, home_account_id)
    }
}

/// Redirect request persisted across the navigation.
#[derive(Debug, Serialize, Deserialize)]
struct PendingRequest {
    verifier: PkceVerifier,
    scopes: Vec<String>,
}

pub struct PkceAuthClient {
    config: ClientConfig,
    keys: CacheKeys,
    flow: OAuthFlowManager,
    storage: ProviderStorage,
    window: Arc<dyn WindowHost>,
    observers: ObserverRegistry,
    initialized: AtomicBool,
    interaction_lock: Mutex<()>,
}

impl PkceAuthClient {
    pub fn new(
        config: ClientConfig,
        http_client: Arc<dyn HttpClient>,
        storage: ProviderStorage,
        window: Arc<dyn WindowHost>,
    ) -> ProviderResult<Self> {
        url::Url::parse(&config.redirect_uri).map_err(|e| {
            ProviderError::new(
                "invalid_redirect_uri",
                format!("Redirect URI '{}' is not a valid URL: {}", config.redirect_uri, e),
            )
        })?;

        let flow = OAuthFlowManager::new(
            config.client_id.clone(),
            config.redirect_uri.clone(),
            AuthorityEndpoints::from_authority(&config.authority),
            http_client,
        );

        Ok(Self {
            keys: CacheKeys::new(&config.client_id),
            config,
            flow,
            storage,
            window,
            observers: ObserverRegistry::new(),
            initialized: AtomicBool::new(false),
            interaction_lock: Mutex::new(()),
        })
    }

    fn store(&self) -> &dyn WebStorage {
        self.storage.session().as_ref()
    }

    fn ensure_initialized(&self) -> ProviderResult<()> {
        if self.initialized.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProviderError::uninitialized())
        }
    }

    fn notify(&self, event: ClientEvent) {
        self.observers.notify(&event);
    }

    /// Set the interaction marker, failing if another flow holds it.
    fn begin_interaction(&self, status: InteractionStatus) -> ProviderResult<()> {
        let _guard = self.interaction_lock.lock().map_err(|_| {
            ProviderError::new(codes::UNKNOWN, "Interaction lock poisoned")
        })?;

        let key = self.keys.interaction_status();
        let current = self.store().get(&key).map_err(storage_error)?;
        if let Some(current) = current {
            if InteractionStatus::from_marker(&current).is_in_progress() {
                warn!(current = %current, requested = %status, "Interaction already in progress");
                return Err(ProviderError::interaction_in_progress());
            }
        }

        self.store().set(&key, status.as_str()).map_err(storage_error)
    }

    fn end_interaction(&self) {
        if let Err(e) = self.store().remove(&self.keys.interaction_status()) {
            warn!(error = %e, "Failed to clear interaction marker");
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store().get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache entry");
                None
            }
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> ProviderResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| ProviderError::new(codes::STORAGE_ERROR, e.to_string()))?;
        self.store().set(key, &raw).map_err(storage_error)
    }

    fn remove_key(&self, key: &str) {
        if let Err(e) = self.store().remove(key) {
            warn!(key = %key, error = %e, "Failed to remove cache entry");
        }
    }

    fn save_account(&self, account: &Identity) -> ProviderResult<()> {
        let mut accounts = self.all_accounts();
        accounts.retain(|existing| existing.home_account_id != account.home_account_id);
        accounts.push(account.clone());
        self.write_json(&self.keys.accounts(), &accounts)
    }

    fn load_tokens(&self, home_account_id: &str) -> Option<TokenSet> {
        self.read_json(&self.keys.token(home_account_id))
    }

    fn save_tokens(&self, home_account_id: &str, tokens: &TokenSet) -> ProviderResult<()> {
        self.write_json(&self.keys.token(home_account_id), tokens)
    }

    /// Drop `account` from the cache, or every account when `None`.
    fn forget_accounts(&self, account: Option<&Identity>) {
        let accounts = self.all_accounts();
        let (removed, kept): (Vec<Identity>, Vec<Identity>) = match account {
            Some(target) => accounts
                .into_iter()
                .partition(|a| a.home_account_id == target.home_account_id),
            None => (accounts, Vec::new()),
        };

        for account in &removed {
            self.remove_key(&self.keys.token(&account.home_account_id));
        }
        if let Some(target) = account {
            // Tokens may exist for an account missing from the list
            self.remove_key(&self.keys.token(&target.home_account_id));
        }

        if kept.is_empty() {
            self.remove_key(&self.keys.accounts());
        } else if let Err(e) = self.write_json(&self.keys.accounts(), &kept) {
            warn!(error = %e, "Failed to rewrite account cache");
        }

        let active_removed = self
            .active_account()
            .map(|active| removed.iter().any(|r| r.home_account_id == active.home_account_id))
            .unwrap_or(true);
        if account.is_none() || active_removed {
            self.remove_key(&self.keys.active_account());
        }
    }

    fn save_pending(&self, pending: &PendingRequest) -> ProviderResult<()> {
        self.write_json(&self.keys.request_params(), pending)?;
        if self.config.cache.store_auth_state_in_cookie {
            if let Err(e) = self
                .storage
                .cookies()
                .set(&self.keys.request_state_cookie(), pending.verifier.state())
            {
                warn!(error = %e, "Failed to mirror request state into cookie");
            }
        }
        Ok(())
    }

    fn take_pending(&self) -> Option<PendingRequest> {
        let pending = self.read_json(&self.keys.request_params());
        self.remove_key(&self.keys.request_params());
        if self.config.cache.store_auth_state_in_cookie {
            if let Err(e) = self.storage.cookies().expire(&self.keys.request_state_cookie()) {
                warn!(error = %e, "Failed to expire request state cookie");
            }
        }
        pending
    }

    fn identity_from_claims(&self, claims: &IdTokenClaims) -> ProviderResult<Identity> {
        let object_id = claims
            .oid
            .clone()
            .or_else(|| claims.sub.clone())
            .ok_or_else(|| {
                ProviderError::new(codes::INVALID_RESPONSE, "ID token has no subject")
            })?;
        let tenant_id = claims.tid.clone().unwrap_or_default();

        Ok(Identity {
            home_account_id: format!("{}.{}", object_id, tenant_id),
            local_account_id: object_id,
            tenant_id,
            username: claims.preferred_username.clone().unwrap_or_default(),
            display_name: claims.name.clone(),
            environment: self.config.authority_host(),
        })
    }

    /// Validate an authorization response and redeem its code.
    async fn complete_authorization(
        &self,
        params: &CallbackParams,
        verifier: &PkceVerifier,
        scopes: &[String],
    ) -> ProviderResult<AuthenticationResult> {
        if let Some(state) = params.state.as_deref() {
            if state != verifier.state() {
                warn!("Authorization response state does not match the request");
                return Err(ProviderError::new(
                    codes::STATE_MISMATCH,
                    "State returned by the identity provider does not match the request",
                ));
            }
        }

        if let Some(err) = params.provider_error() {
            info!(code = %err.code, "Identity provider returned an error");
            return Err(err);
        }

        let code = params.code.as_deref().ok_or_else(|| {
            ProviderError::new(codes::INVALID_RESPONSE, "Authorization response has no code")
        })?;
        let state = params.state.as_deref().unwrap_or_default();

        let tokens = self.flow.exchange_code(code, state, verifier).await?;
        self.accept_tokens(tokens, Some(verifier), scopes)
    }

    /// Cache tokens from the token endpoint and activate their account.
    fn accept_tokens(
        &self,
        tokens: TokenResponse,
        verifier: Option<&PkceVerifier>,
        scopes: &[String],
    ) -> ProviderResult<AuthenticationResult> {
        let id_token = tokens.id_token.as_deref().ok_or_else(|| {
            ProviderError::new(codes::INVALID_RESPONSE, "Token response has no ID token")
        })?;
        let claims = decode_id_token(id_token)?;

        if let Some(verifier) = verifier {
            if claims.nonce.as_deref() != Some(verifier.nonce()) {
                warn!("ID token nonce does not match the request");
                return Err(ProviderError::new(
                    codes::NONCE_MISMATCH,
                    "Nonce in the ID token does not match the request",
                ));
            }
        }

        let account = self.identity_from_claims(&claims)?;
        let token_set = TokenSet::new(
            tokens.access_token.clone(),
            tokens.refresh_token.clone(),
            tokens.expires_in,
            tokens.granted_scopes(scopes),
        );

        self.save_account(&account)?;
        self.save_tokens(&account.home_account_id, &token_set)?;
        self.set_active_account(Some(&account));

        info!(username = %account.username, "Account signed in");

        Ok(AuthenticationResult {
            account,
            access_token: token_set.access_token,
            expires_at: token_set.expires_at,
            scopes: token_set.scopes,
            from_cache: false,
        })
    }

    async fn run_popup(&self, request: &LoginRequest) -> ProviderResult<AuthenticationResult> {
        let params = AuthorizeParams {
            scopes: &request.scopes,
            prompt: request.prompt.as_deref(),
            login_hint: request.login_hint.as_deref(),
        };
        let (url, verifier) = self.flow.build_auth_url(&params)?;

        let outcome = self
            .window
            .open_popup(
                &url,
                request.popup,
                &self.config.redirect_uri,
                self.config.system.window_hash_timeout,
            )
            .await
            .map_err(|e| ProviderError::new(codes::POPUP_WINDOW_ERROR, e.to_string()))?;

        match outcome {
            PopupOutcome::Completed(callback_url) => {
                let params = parse_callback(&callback_url).ok_or_else(|| {
                    ProviderError::new(
                        codes::INVALID_RESPONSE,
                        "Popup returned without an authorization response",
                    )
                })?;
                self.complete_authorization(&params, &verifier, &request.scopes)
                    .await
            }
            PopupOutcome::Closed => Err(ProviderError::new(
                codes::POPUP_WINDOW_CLOSED,
                "User closed the popup window before completing sign-in.",
            )),
            PopupOutcome::Blocked => Err(ProviderError::new(
                codes::POPUP_WINDOW_ERROR,
                "Error opening popup window. Popups may be blocked in the browser.",
            )),
            PopupOutcome::TimedOut => Err(ProviderError::new(
                codes::TIMED_OUT,
                "Timed out waiting for the popup window to return to the redirect URI.",
            )),
        }
    }

    async fn silent(&self, request: &TokenRequest) -> ProviderResult<AuthenticationResult> {
        let home_account_id = &request.account.home_account_id;
        let cached = self.load_tokens(home_account_id).ok_or_else(|| {
            ProviderError::interaction_required("No cached tokens for the account")
        })?;

        if !request.force_refresh && !cached.is_expired() {
            debug!("Serving access token from cache");
            return Ok(AuthenticationResult {
                account: request.account.clone(),
                access_token: cached.access_token,
                expires_at: cached.expires_at,
                scopes: cached.scopes,
                from_cache: true,
            });
        }

        let refresh_token = cached.refresh_token.ok_or_else(|| {
            ProviderError::interaction_required("Access token expired and no refresh token is cached")
        })?;

        let tokens = self
            .flow
            .refresh_access_token(&refresh_token, &request.scopes)
            .await?;
        let token_set = TokenSet::new(
            tokens.access_token.clone(),
            tokens.refresh_token.clone(),
            tokens.expires_in,
            tokens.granted_scopes(&request.scopes),
        );
        self.save_tokens(home_account_id, &token_set)?;

        Ok(AuthenticationResult {
            account: request.account.clone(),
            access_token: token_set.access_token,
            expires_at: token_set.expires_at,
            scopes: token_set.scopes,
            from_cache: false,
        })
    }

    fn logout_url(&self, account: Option<&Identity>) -> ProviderResult<String> {
        Ok(self.flow.logout_url(
            &self.config.post_logout_redirect_uri,
            account.map(|a| a.username.as_str()),
        )?)
    }
}

fn storage_error(err: BridgeError) -> ProviderError {
    ProviderError::new(codes::STORAGE_ERROR, err.to_string())
}

fn navigation_error(err: BridgeError) -> ProviderError {
    ProviderError::new(codes::NAVIGATION_FAILED, err.to_string())
}

fn login_outcome_event(
    result: &ProviderResult<AuthenticationResult>,
    flow: InteractionFlow,
) -> ClientEvent {
    match result {
        Ok(result) => ClientEvent::new(ClientEventKind::LoginSuccess)
            .with_flow(flow)
            .with_account(result.account.clone()),
        Err(err) => ClientEvent::new(ClientEventKind::LoginFailure)
            .with_flow(flow)
            .with_error(err.clone()),
    }
}

fn token_outcome_event(result: &ProviderResult<AuthenticationResult>) -> ClientEvent {
    match result {
        Ok(result) => ClientEvent::new(ClientEventKind::AcquireTokenSuccess)
            .with_account(result.account.clone()),
        Err(err) => ClientEvent::new(ClientEventKind::AcquireTokenFailure).with_error(err.clone()),
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl AuthClient for PkceAuthClient {
    fn configuration(&self) -> &ClientConfig {
        &self.config
    }

    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    async fn initialize(&self) -> ProviderResult<()> {
        self.store().keys().map_err(storage_error)?;
        self.initialized.store(true, Ordering::SeqCst);
        debug!(redirect_uri = %self.config.redirect_uri, "Authentication client initialized");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn handle_redirect_promise(&self) -> ProviderResult<Option<AuthenticationResult>> {
        self.ensure_initialized()?;

        let current = self.window.current_url().map_err(navigation_error)?;
        let Some(params) = parse_callback(&current) else {
            if self.take_pending().is_some() {
                debug!("Discarded pending request without an authorization response");
            }
            return Ok(None);
        };

        self.notify(
            ClientEvent::new(ClientEventKind::HandleRedirectStart)
                .with_flow(InteractionFlow::Redirect),
        );

        let outcome = match self.take_pending() {
            Some(pending) => self
                .complete_authorization(&params, &pending.verifier, &pending.scopes)
                .await
                .map(Some),
            None => {
                warn!("Authorization response found without a pending request");
                Ok(None)
            }
        };

        self.end_interaction();
        if let Err(e) = self.window.replace_url(&self.config.redirect_uri) {
            warn!(error = %e, "Failed to strip authorization response from the URL");
        }

        match &outcome {
            Ok(Some(result)) => self.notify(
                ClientEvent::new(ClientEventKind::LoginSuccess)
                    .with_flow(InteractionFlow::Redirect)
                    .with_account(result.account.clone()),
            ),
            Ok(None) => {}
            Err(err) => self.notify(
                ClientEvent::new(ClientEventKind::LoginFailure)
                    .with_flow(InteractionFlow::Redirect)
                    .with_error(err.clone()),
            ),
        }
        self.notify(
            ClientEvent::new(ClientEventKind::HandleRedirectEnd)
                .with_flow(InteractionFlow::Redirect),
        );

        outcome
    }

    fn all_accounts(&self) -> Vec<Identity> {
        self.read_json(&self.keys.accounts()).unwrap_or_default()
    }

    fn active_account(&self) -> Option<Identity> {
        let home_account_id = match self.store().get(&self.keys.active_account()) {
            Ok(Some(id)) => id,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read active account");
                return None;
            }
        };
        self.all_accounts()
            .into_iter()
            .find(|account| account.home_account_id == home_account_id)
    }

    fn set_active_account(&self, account: Option<&Identity>) {
        let key = self.keys.active_account();
        let result = match account {
            Some(account) => self.store().set(&key, &account.home_account_id),
            None => self.store().remove(&key),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to update active account");
        }
    }

    #[instrument(skip(self, request))]
    async fn login_popup(&self, request: &LoginRequest) -> ProviderResult<AuthenticationResult> {
        self.ensure_initialized()?;
        self.notify(
            ClientEvent::new(ClientEventKind::LoginStart).with_flow(InteractionFlow::Popup),
        );

        let result = match self.begin_interaction(InteractionStatus::Login) {
            Ok(()) => {
                let result = self.run_popup(request).await;
                self.end_interaction();
                result
            }
            Err(err) => Err(err),
        };

        self.notify(login_outcome_event(&result, InteractionFlow::Popup));
        result
    }

    #[instrument(skip(self, request))]
    async fn login_redirect(&self, request: &LoginRequest) -> ProviderResult<()> {
        self.ensure_initialized()?;
        self.notify(
            ClientEvent::new(ClientEventKind::LoginStart).with_flow(InteractionFlow::Redirect),
        );

        let result = self.start_redirect(request);
        if let Err(err) = &result {
            self.notify(
                ClientEvent::new(ClientEventKind::LoginFailure)
                    .with_flow(InteractionFlow::Redirect)
                    .with_error(err.clone()),
            );
        }
        result
    }

    #[instrument(skip(self, account))]
    async fn logout_popup(&self, account: Option<&Identity>) -> ProviderResult<()> {
        self.ensure_initialized()?;
        self.notify(
            ClientEvent::new(ClientEventKind::LogoutStart).with_flow(InteractionFlow::Popup),
        );
        self.begin_interaction(InteractionStatus::Logout)?;

        self.forget_accounts(account);
        let result = match self.logout_url(account) {
            Ok(url) => self
                .window
                .open_popup(
                    &url,
                    PopupFeatures::default(),
                    &self.config.post_logout_redirect_uri,
                    self.config.system.window_hash_timeout,
                )
                .await
                .map_err(|e| ProviderError::new(codes::POPUP_WINDOW_ERROR, e.to_string()))
                .and_then(|outcome| match outcome {
                    PopupOutcome::Blocked => Err(ProviderError::new(
                        codes::POPUP_WINDOW_ERROR,
                        "Error opening logout popup window.",
                    )),
                    other => {
                        debug!(outcome = ?other, "Logout popup finished");
                        Ok(())
                    }
                }),
            Err(err) => Err(err),
        };
        self.end_interaction();

        self.notify(ClientEvent::new(ClientEventKind::LogoutEnd).with_flow(InteractionFlow::Popup));
        result
    }

    #[instrument(skip(self, account))]
    async fn logout_redirect(&self, account: Option<&Identity>) -> ProviderResult<()> {
        self.ensure_initialized()?;
        self.notify(
            ClientEvent::new(ClientEventKind::LogoutStart).with_flow(InteractionFlow::Redirect),
        );
        self.begin_interaction(InteractionStatus::Logout)?;

        self.forget_accounts(account);
        let result = self
            .logout_url(account)
            .and_then(|url| self.window.navigate(&url).map_err(navigation_error));
        self.end_interaction();

        self.notify(
            ClientEvent::new(ClientEventKind::LogoutEnd).with_flow(InteractionFlow::Redirect),
        );
        result
    }

    #[instrument(skip(self, request), fields(username = %request.account.username))]
    async fn acquire_token_silent(
        &self,
        request: &TokenRequest,
    ) -> ProviderResult<AuthenticationResult> {
        self.ensure_initialized()?;
        self.notify(ClientEvent::new(ClientEventKind::AcquireTokenStart));

        let result = self.silent(request).await;
        self.notify(token_outcome_event(&result));
        result
    }

    #[instrument(skip(self, request), fields(username = %request.account.username))]
    async fn acquire_token_popup(
        &self,
        request: &TokenRequest,
    ) -> ProviderResult<AuthenticationResult> {
        self.ensure_initialized()?;
        self.notify(
            ClientEvent::new(ClientEventKind::AcquireTokenStart).with_flow(InteractionFlow::Popup),
        );

        let result = match self.begin_interaction(InteractionStatus::AcquireToken) {
            Ok(()) => {
                let login = LoginRequest {
                    scopes: request.scopes.clone(),
                    prompt: None,
                    login_hint: Some(request.account.username.clone()),
                    popup: PopupFeatures::default(),
                };
                let result = self.run_popup(&login).await;
                self.end_interaction();
                result
            }
            Err(err) => Err(err),
        };

        self.notify(token_outcome_event(&result));
        result
    }

    fn interaction_status(&self) -> Option<InteractionStatus> {
        match self.store().get(&self.keys.interaction_status()) {
            Ok(Some(marker)) => Some(InteractionStatus::from_marker(&marker)),
            Ok(None) => Some(InteractionStatus::None),
            Err(e) => {
                warn!(error = %e, "Failed to read interaction marker");
                None
            }
        }
    }

    fn add_event_observer(&self, observer: Arc<dyn ClientEventObserver>) -> ObserverId {
        self.observers.add(observer)
    }

    fn remove_event_observer(&self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }
}

impl PkceAuthClient {
    /// Persist the request and navigate away. The marker stays set until the
    /// page comes back and the response is handled.
    fn start_redirect(&self, request: &LoginRequest) -> ProviderResult<()> {
        self.begin_interaction(InteractionStatus::Login)?;

        let params = AuthorizeParams {
            scopes: &request.scopes,
            prompt: request.prompt.as_deref(),
            login_hint: request.login_hint.as_deref(),
        };

        let launched = self
            .flow
            .build_auth_url(&params)
            .map_err(ProviderError::from)
            .and_then(|(url, verifier)| {
                self.save_pending(&PendingRequest {
                    verifier,
                    scopes: request.scopes.clone(),
                })?;
                self.window.navigate(&url).map_err(navigation_error)
            });

        if launched.is_err() {
            self.take_pending();
            self.end_interaction();
        }
        launched
    }
}

/// Builds [`PkceAuthClient`]s on shared bridges.
pub struct PkceClientFactory {
    http_client: Arc<dyn HttpClient>,
    storage: ProviderStorage,
    window: Arc<dyn WindowHost>,
}

impl PkceClientFactory {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        storage: ProviderStorage,
        window: Arc<dyn WindowHost>,
    ) -> Self {
        Self {
            http_client,
            storage,
            window,
        }
    }
}

impl ClientFactory for PkceClientFactory {
    fn create(&self, config: ClientConfig) -> ProviderResult<Arc<dyn AuthClient>> {
        let client = PkceAuthClient::new(
            config,
            self.http_client.clone(),
            self.storage.clone(),
            self.window.clone(),
        )?;
        Ok(Arc::new(client))
    }
}
