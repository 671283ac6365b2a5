//! In-memory bridges and a scripted client shared by the unit tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::environment::BrowserEnvironment;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::{CookieJar, WebStorage};
use bridge_traits::window::{PopupFeatures, PopupOutcome, WindowHost};
use core_runtime::config::{AuthSettings, TimingSettings};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::{
    AuthClient, ClientEvent, ClientEventKind, ClientEventObserver, ClientFactory, ObserverId,
    ObserverRegistry, ProviderResult,
};
use crate::config::{ClientConfig, LoginRequest, TokenRequest};
use crate::error::ProviderError;
use crate::storage::ProviderStorage;
use crate::types::{AuthenticationResult, Identity, InteractionStatus};

#[derive(Default)]
pub(crate) struct MapStorage {
    label: &'static str,
    entries: Mutex<BTreeMap<String, String>>,
    failing_key: Option<String>,
}

impl MapStorage {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Default::default()
        }
    }

    pub(crate) fn with(self, key: &str, value: &str) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub(crate) fn failing_on(mut self, key: &str) -> Self {
        self.failing_key = Some(key.to_string());
        self
    }
}

impl WebStorage for MapStorage {
    fn label(&self) -> &str {
        self.label
    }

    fn keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }

    fn get(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> BridgeResult<()> {
        if self.failing_key.as_deref() == Some(key) {
            return Err(BridgeError::Storage("quota".to_string()));
        }
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct SetCookieJar {
    names: Mutex<BTreeSet<String>>,
}

impl SetCookieJar {
    pub(crate) fn with(self, name: &str) -> Self {
        self.names.lock().unwrap().insert(name.to_string());
        self
    }
}

impl CookieJar for SetCookieJar {
    fn names(&self) -> BridgeResult<Vec<String>> {
        Ok(self.names.lock().unwrap().iter().cloned().collect())
    }

    fn set(&self, name: &str, _value: &str) -> BridgeResult<()> {
        self.names.lock().unwrap().insert(name.to_string());
        Ok(())
    }

    fn expire(&self, name: &str) -> BridgeResult<()> {
        self.names.lock().unwrap().remove(name);
        Ok(())
    }
}

/// Session store, local store and cookie jar wired into a [`ProviderStorage`].
pub(crate) struct StorageHarness {
    pub(crate) session: Arc<MapStorage>,
    pub(crate) local: Arc<MapStorage>,
    pub(crate) cookies: Arc<SetCookieJar>,
    pub(crate) storage: ProviderStorage,
}

impl StorageHarness {
    pub(crate) fn new() -> Self {
        let session = Arc::new(MapStorage::new("sessionStorage"));
        let local = Arc::new(MapStorage::new("localStorage"));
        let cookies = Arc::new(SetCookieJar::default());
        let storage = ProviderStorage::new(session.clone(), local.clone(), cookies.clone());
        Self {
            session,
            local,
            cookies,
            storage,
        }
    }
}

pub(crate) struct FakeEnvironment {
    pub(crate) browser: AtomicBool,
    pub(crate) embedded: AtomicBool,
    pub(crate) popups: AtomicBool,
    hostname: Mutex<String>,
}

impl FakeEnvironment {
    pub(crate) fn new(hostname: &str) -> Self {
        Self {
            browser: AtomicBool::new(true),
            embedded: AtomicBool::new(false),
            popups: AtomicBool::new(true),
            hostname: Mutex::new(hostname.to_string()),
        }
    }

    pub(crate) fn embedded(self) -> Self {
        self.embedded.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn headless(self) -> Self {
        self.browser.store(false, Ordering::SeqCst);
        self
    }
}

impl BrowserEnvironment for FakeEnvironment {
    fn is_browser(&self) -> bool {
        self.browser.load(Ordering::SeqCst)
    }

    fn is_embedded(&self) -> bool {
        self.embedded.load(Ordering::SeqCst)
    }

    fn hostname(&self) -> Option<String> {
        Some(self.hostname.lock().unwrap().clone())
    }

    fn origin(&self) -> Option<String> {
        Some(format!("https://{}", self.hostname.lock().unwrap()))
    }

    fn popups_supported(&self) -> bool {
        self.popups.load(Ordering::SeqCst)
    }
}

/// Window host that records navigations and answers popups from a script.
pub(crate) struct RecordingWindow {
    current_url: Mutex<String>,
    outcomes: Mutex<VecDeque<PopupOutcome>>,
    auto_complete: AtomicBool,
    popups: Mutex<Vec<String>>,
    navigations: Mutex<Vec<String>>,
    replaced: Mutex<Vec<String>>,
    pub(crate) reloads: AtomicUsize,
}

impl RecordingWindow {
    pub(crate) fn new(current_url: &str) -> Self {
        Self {
            current_url: Mutex::new(current_url.to_string()),
            outcomes: Mutex::new(VecDeque::new()),
            auto_complete: AtomicBool::new(false),
            popups: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
            replaced: Mutex::new(Vec::new()),
            reloads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn next_popup(&self, outcome: PopupOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Unscripted popups return to the redirect URI with a code and the request's state.
    pub(crate) fn complete_popups(&self) {
        self.auto_complete.store(true, Ordering::SeqCst);
    }

    pub(crate) fn set_current_url(&self, url: &str) {
        *self.current_url.lock().unwrap() = url.to_string();
    }

    pub(crate) fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub(crate) fn replaced_urls(&self) -> Vec<String> {
        self.replaced.lock().unwrap().clone()
    }

    pub(crate) fn last_popup_param(&self, name: &str) -> Option<String> {
        let popups = self.popups.lock().unwrap();
        let url = url::Url::parse(popups.last()?).ok()?;
        let value = url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned());
        value
    }
}

#[async_trait::async_trait]
impl WindowHost for RecordingWindow {
    fn current_url(&self) -> BridgeResult<String> {
        Ok(self.current_url.lock().unwrap().clone())
    }

    async fn open_popup(
        &self,
        url: &str,
        _features: PopupFeatures,
        redirect_uri: &str,
        _timeout: Duration,
    ) -> BridgeResult<PopupOutcome> {
        self.popups.lock().unwrap().push(url.to_string());
        if let Some(outcome) = self.outcomes.lock().unwrap().pop_front() {
            return Ok(outcome);
        }
        if self.auto_complete.load(Ordering::SeqCst) {
            let state = self.last_popup_param("state").unwrap_or_default();
            return Ok(PopupOutcome::Completed(format!(
                "{}/?code=auth-code&state={}",
                redirect_uri.trim_end_matches('/'),
                state
            )));
        }
        Ok(PopupOutcome::Blocked)
    }

    fn navigate(&self, url: &str) -> BridgeResult<()> {
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn replace_url(&self, url: &str) -> BridgeResult<()> {
        self.replaced.lock().unwrap().push(url.to_string());
        *self.current_url.lock().unwrap() = url.to_string();
        Ok(())
    }

    fn reload(&self) -> BridgeResult<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn open_new_window(&self, url: &str) -> BridgeResult<()> {
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Unsigned JWT whose claims derive from `username` (`oid-<local>`, `tid-<domain>`).
pub(crate) fn id_token(name: &str, username: &str, nonce: &str) -> String {
    let (local, domain) = username.split_once('@').unwrap_or((username, "tenant"));
    let domain = domain.split('.').next().unwrap_or(domain);
    let claims = serde_json::json!({
        "name": name,
        "preferred_username": username,
        "oid": format!("oid-{}", local),
        "tid": format!("tid-{}", domain),
        "nonce": nonce,
    });
    format!(
        "e30.{}.sig",
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap())
    )
}

pub(crate) fn token_body(id_token: &str) -> String {
    serde_json::json!({
        "access_token": "access-token",
        "refresh_token": "refresh-token",
        "id_token": id_token,
        "expires_in": 3600,
        "token_type": "Bearer"
    })
    .to_string()
}

/// HTTP client answering from a queue; can also answer code exchanges with
/// an ID token bound to the last popup's nonce.
#[derive(Default)]
pub(crate) struct ScriptedHttp {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<String>>,
    code_exchange: Mutex<Option<(Arc<RecordingWindow>, String, String)>>,
}

impl ScriptedHttp {
    pub(crate) fn push(&self, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::new(status, body.into()));
    }

    pub(crate) fn answer_code_exchange(
        &self,
        window: Arc<RecordingWindow>,
        name: &str,
        username: &str,
    ) {
        *self.code_exchange.lock().unwrap() =
            Some((window, name.to_string(), username.to_string()));
    }

    /// `"<METHOD> <url>\n<body>"` for every request seen.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let body = request
            .body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();
        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}\n{}", request.method.as_str(), request.url, body));

        if body.contains("grant_type=authorization_code") {
            if let Some((window, name, username)) = self.code_exchange.lock().unwrap().clone() {
                let nonce = window.last_popup_param("nonce").unwrap_or_default();
                return Ok(HttpResponse::new(
                    200,
                    token_body(&id_token(&name, &username, &nonce)),
                ));
            }
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BridgeError::OperationFailed("no scripted response".to_string()))
    }
}

#[derive(Default)]
pub(crate) struct EventLog {
    events: Mutex<Vec<ClientEvent>>,
}

impl EventLog {
    pub(crate) fn kinds(&self) -> Vec<ClientEventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

impl ClientEventObserver for EventLog {
    fn on_event(&self, event: &ClientEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub(crate) fn identity(username: &str) -> Identity {
    let local = username.split('@').next().unwrap_or(username);
    Identity {
        home_account_id: format!("{}.tenant", local),
        local_account_id: local.to_string(),
        tenant_id: "tenant".to_string(),
        username: username.to_string(),
        display_name: Some(local.to_string()),
        environment: "login.microsoftonline.com".to_string(),
    }
}

pub(crate) fn auth_result(account: Identity) -> AuthenticationResult {
    AuthenticationResult {
        account,
        access_token: "access-token".to_string(),
        expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        scopes: vec!["User.Read".to_string()],
        from_cache: false,
    }
}

pub(crate) fn test_config() -> ClientConfig {
    ClientConfig::from_settings(
        &AuthSettings {
            client_id: "cid".into(),
            ..AuthSettings::default()
        },
        &TimingSettings::default(),
        "https://app.example",
    )
}

/// Client whose every answer is scripted. An unscripted popup never resolves.
pub(crate) struct ScriptedClient {
    config: ClientConfig,
    pub(crate) accounts: Mutex<Vec<Identity>>,
    pub(crate) active: Mutex<Option<Identity>>,
    pub(crate) redirect_result: Mutex<Option<ProviderResult<Option<AuthenticationResult>>>>,
    pub(crate) popup_results: Mutex<VecDeque<ProviderResult<AuthenticationResult>>>,
    pub(crate) redirect_launch: Mutex<VecDeque<ProviderResult<()>>>,
    pub(crate) silent_results: Mutex<VecDeque<ProviderResult<AuthenticationResult>>>,
    pub(crate) token_popup_results: Mutex<VecDeque<ProviderResult<AuthenticationResult>>>,
    pub(crate) logout_result: Mutex<Option<ProviderError>>,
    pub(crate) status: Mutex<Option<InteractionStatus>>,
    pub(crate) init_error: Mutex<Option<ProviderError>>,
    pub(crate) init_delay: Mutex<Option<Duration>>,
    pub(crate) popup_delay: Mutex<Option<Duration>>,
    pub(crate) calls: Mutex<Vec<String>>,
    observers: ObserverRegistry,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self {
            config: test_config(),
            accounts: Mutex::new(Vec::new()),
            active: Mutex::new(None),
            redirect_result: Mutex::new(None),
            popup_results: Mutex::new(VecDeque::new()),
            redirect_launch: Mutex::new(VecDeque::new()),
            silent_results: Mutex::new(VecDeque::new()),
            token_popup_results: Mutex::new(VecDeque::new()),
            logout_result: Mutex::new(None),
            status: Mutex::new(None),
            init_error: Mutex::new(None),
            init_delay: Mutex::new(None),
            popup_delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            observers: ObserverRegistry::new(),
        }
    }

    pub(crate) fn with_account(self, account: Identity) -> Self {
        self.accounts.lock().unwrap().push(account);
        self
    }

    pub(crate) fn popup(&self, result: ProviderResult<AuthenticationResult>) {
        self.popup_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn set_status(&self, status: Option<InteractionStatus>) {
        *self.status.lock().unwrap() = status;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        self.observers.notify(&event);
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait::async_trait]
impl AuthClient for ScriptedClient {
    fn configuration(&self) -> &ClientConfig {
        &self.config
    }

    async fn initialize(&self) -> ProviderResult<()> {
        self.record("initialize");
        let delay = *self.init_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.init_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn handle_redirect_promise(&self) -> ProviderResult<Option<AuthenticationResult>> {
        self.record("handle_redirect_promise");
        let result = self.redirect_result.lock().unwrap().take();
        match result {
            Some(Ok(Some(result))) => {
                self.accounts.lock().unwrap().push(result.account.clone());
                *self.active.lock().unwrap() = Some(result.account.clone());
                Ok(Some(result))
            }
            Some(other) => other,
            None => Ok(None),
        }
    }

    fn all_accounts(&self) -> Vec<Identity> {
        self.accounts.lock().unwrap().clone()
    }

    fn active_account(&self) -> Option<Identity> {
        self.active.lock().unwrap().clone()
    }

    fn set_active_account(&self, account: Option<&Identity>) {
        *self.active.lock().unwrap() = account.cloned();
    }

    async fn login_popup(&self, _request: &LoginRequest) -> ProviderResult<AuthenticationResult> {
        self.record("login_popup");
        let delay = *self.popup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.popup_results.lock().unwrap().pop_front();
        match next {
            Some(Ok(result)) => {
                self.accounts.lock().unwrap().push(result.account.clone());
                *self.active.lock().unwrap() = Some(result.account.clone());
                Ok(result)
            }
            Some(Err(err)) => Err(err),
            None => futures::future::pending().await,
        }
    }

    async fn login_redirect(&self, _request: &LoginRequest) -> ProviderResult<()> {
        self.record("login_redirect");
        self.redirect_launch
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn logout_popup(&self, _account: Option<&Identity>) -> ProviderResult<()> {
        self.record("logout_popup");
        self.accounts.lock().unwrap().clear();
        *self.active.lock().unwrap() = None;
        match self.logout_result.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn logout_redirect(&self, _account: Option<&Identity>) -> ProviderResult<()> {
        self.record("logout_redirect");
        self.accounts.lock().unwrap().clear();
        *self.active.lock().unwrap() = None;
        match self.logout_result.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn acquire_token_silent(
        &self,
        _request: &TokenRequest,
    ) -> ProviderResult<AuthenticationResult> {
        self.record("acquire_token_silent");
        self.silent_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::interaction_required("nothing cached")))
    }

    async fn acquire_token_popup(
        &self,
        _request: &TokenRequest,
    ) -> ProviderResult<AuthenticationResult> {
        self.record("acquire_token_popup");
        self.token_popup_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::new(
                    crate::error::codes::POPUP_WINDOW_CLOSED,
                    "closed",
                ))
            })
    }

    fn interaction_status(&self) -> Option<InteractionStatus> {
        *self.status.lock().unwrap()
    }

    fn add_event_observer(&self, observer: Arc<dyn ClientEventObserver>) -> ObserverId {
        self.observers.add(observer)
    }

    fn remove_event_observer(&self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }
}

/// Factory handing out prepared clients in order, then fresh default ones.
#[derive(Default)]
pub(crate) struct ScriptedFactory {
    prepared: Mutex<VecDeque<Arc<ScriptedClient>>>,
    created: Mutex<Vec<Arc<ScriptedClient>>>,
    configs: Mutex<Vec<ClientConfig>>,
    pub(crate) fail_with: Mutex<Option<ProviderError>>,
    pub(crate) init_delay: Mutex<Option<Duration>>,
}

impl ScriptedFactory {
    pub(crate) fn prepare(&self, client: ScriptedClient) -> Arc<ScriptedClient> {
        let client = Arc::new(client);
        self.prepared.lock().unwrap().push_back(client.clone());
        client
    }

    pub(crate) fn created(&self) -> Vec<Arc<ScriptedClient>> {
        self.created.lock().unwrap().clone()
    }

    pub(crate) fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub(crate) fn last(&self) -> Arc<ScriptedClient> {
        self.created
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no client created yet")
    }

    pub(crate) fn configs(&self) -> Vec<ClientConfig> {
        self.configs.lock().unwrap().clone()
    }
}

impl ClientFactory for ScriptedFactory {
    fn create(&self, config: ClientConfig) -> ProviderResult<Arc<dyn AuthClient>> {
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        self.configs.lock().unwrap().push(config);
        let client = self
            .prepared
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Arc::new(ScriptedClient::new()));
        if let Some(delay) = *self.init_delay.lock().unwrap() {
            *client.init_delay.lock().unwrap() = Some(delay);
        }
        self.created.lock().unwrap().push(client.clone());
        Ok(client)
    }
}
