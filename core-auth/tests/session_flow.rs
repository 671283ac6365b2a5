//! End-to-end sign-in flows: coordinator, lifecycle and the PKCE client over
//! in-memory bridges, with a scripted identity provider behind the window and
//! HTTP seams.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_desktop::{HeadlessEnvironment, MemoryCookieJar, MemoryWebStorage};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::WebStorage;
use bridge_traits::window::{PopupFeatures, PopupOutcome, WindowHost};
use core_auth::{
    AccessTokenSource, ClientLifecycle, PkceClientFactory, ProviderStorage, SessionCoordinator,
    SessionPhase, SessionTokenSource,
};
use core_runtime::config::AppConfig;
use core_runtime::events::EventBus;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ORIGIN: &str = "https://app.example";

/// Identity provider reachable through both the window (authorize page) and
/// HTTP (token endpoint).
struct FakeIdentityProvider {
    current_url: Mutex<String>,
    authorize_urls: Mutex<Vec<String>>,
    navigations: Mutex<Vec<String>>,
    token_requests: AtomicUsize,
    reloads: AtomicUsize,
    close_popups: AtomicBool,
}

impl FakeIdentityProvider {
    fn new() -> Self {
        Self {
            current_url: Mutex::new(format!("{}/", ORIGIN)),
            authorize_urls: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
            token_requests: AtomicUsize::new(0),
            reloads: AtomicUsize::new(0),
            close_popups: AtomicBool::new(false),
        }
    }

    fn last_authorize_param(&self, name: &str) -> String {
        let urls = self.authorize_urls.lock().unwrap();
        let url = url::Url::parse(urls.last().expect("no authorize request")).unwrap();
        let value = url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        value
    }

    /// Land the page on the redirect URI as the provider would after sign-in.
    fn return_from_redirect(&self) {
        let state = self.last_authorize_param("state");
        *self.current_url.lock().unwrap() =
            format!("{}/?code=redirect-code&state={}", ORIGIN, state);
    }

    fn id_token(&self) -> String {
        let claims = serde_json::json!({
            "name": "Ada Lovelace",
            "preferred_username": "ada@contoso.com",
            "oid": "oid-ada",
            "tid": "tid-contoso",
            "nonce": self.last_authorize_param("nonce"),
        });
        format!(
            "e30.{}.sig",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap())
        )
    }
}

#[async_trait]
impl WindowHost for FakeIdentityProvider {
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
        self.authorize_urls.lock().unwrap().push(url.to_string());
        if self.close_popups.load(Ordering::SeqCst) {
            return Ok(PopupOutcome::Closed);
        }
        let state = self.last_authorize_param("state");
        Ok(PopupOutcome::Completed(format!(
            "{}/?code=popup-code&state={}",
            redirect_uri, state
        )))
    }

    fn navigate(&self, url: &str) -> BridgeResult<()> {
        if url.contains("/oauth2/v2.0/authorize") {
            self.authorize_urls.lock().unwrap().push(url.to_string());
        }
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn replace_url(&self, url: &str) -> BridgeResult<()> {
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

#[async_trait]
impl HttpClient for FakeIdentityProvider {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let body = request
            .body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();
        if !request.url.ends_with("/oauth2/v2.0/token")
            || !body.contains("grant_type=authorization_code")
        {
            return Err(BridgeError::OperationFailed(format!(
                "unexpected request to {}",
                request.url
            )));
        }

        let n = self.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
        let token = serde_json::json!({
            "access_token": format!("at-{}", n),
            "refresh_token": "rt",
            "id_token": self.id_token(),
            "expires_in": 3600,
            "token_type": "Bearer",
        });
        Ok(HttpResponse::new(200, token.to_string()))
    }
}

struct Page {
    coordinator: SessionCoordinator,
    tokens: SessionTokenSource,
}

struct Browser {
    idp: Arc<FakeIdentityProvider>,
    session: Arc<MemoryWebStorage>,
    storage: ProviderStorage,
    environment: Arc<HeadlessEnvironment>,
    config: AppConfig,
}

impl Browser {
    fn new(environment: HeadlessEnvironment) -> Self {
        let session = Arc::new(MemoryWebStorage::session());
        let storage = ProviderStorage::new(
            session.clone(),
            Arc::new(MemoryWebStorage::local()),
            Arc::new(MemoryCookieJar::new()),
        );
        Self {
            idp: Arc::new(FakeIdentityProvider::new()),
            session,
            storage,
            environment: Arc::new(environment),
            config: AppConfig::builder()
                .client_id("cid")
                .tenant_id("contoso")
                .build()
                .unwrap(),
        }
    }

    /// A fresh page load over the same storage.
    fn load_page(&self) -> Page {
        let factory = Arc::new(PkceClientFactory::new(
            self.idp.clone(),
            self.storage.clone(),
            self.idp.clone(),
        ));
        let lifecycle = ClientLifecycle::new(
            factory,
            self.storage.clone(),
            self.environment.clone(),
            &self.config,
            EventBus::new(64),
        );
        Page {
            tokens: SessionTokenSource::new(lifecycle.clone(), self.config.auth.scopes.clone()),
            coordinator: SessionCoordinator::new(lifecycle, self.idp.clone(), &self.config),
        }
    }

    fn provider_keys(&self) -> Vec<String> {
        self.session
            .keys()
            .unwrap()
            .into_iter()
            .filter(|k| k.starts_with("msal."))
            .collect()
    }
}

#[tokio::test]
async fn embedded_page_signs_in_with_popup() {
    let browser = Browser::new(HeadlessEnvironment::with_origin(ORIGIN).embedded(true));
    let page = browser.load_page();

    page.coordinator.initialize().await;
    assert_eq!(page.coordinator.phase(), SessionPhase::Unauthenticated);

    page.coordinator.sign_in().await;

    assert_eq!(page.coordinator.phase(), SessionPhase::Authenticated);
    let identity = page.coordinator.identity().unwrap();
    assert_eq!(identity.username, "ada@contoso.com");
    assert_eq!(identity.home_account_id, "oid-ada.tid-contoso");

    // Cached token, no second exchange
    assert_eq!(page.tokens.access_token().await.unwrap(), "at-1");
    assert_eq!(browser.idp.token_requests.load(Ordering::SeqCst), 1);

    // A reload finds the cached account
    let reloaded = browser.load_page();
    reloaded.coordinator.initialize().await;
    assert_eq!(reloaded.coordinator.phase(), SessionPhase::Authenticated);
}

#[tokio::test]
async fn top_level_page_signs_in_with_redirect() {
    let browser = Browser::new(HeadlessEnvironment::with_origin(ORIGIN).popups(true));
    let page = browser.load_page();

    page.coordinator.initialize().await;
    page.coordinator.sign_in().await;

    assert_eq!(page.coordinator.phase(), SessionPhase::Authenticating);
    let navigations = browser.idp.navigations.lock().unwrap().clone();
    assert_eq!(navigations.len(), 1);
    assert!(navigations[0].contains("response_mode=query"));

    browser.idp.return_from_redirect();
    let returned = browser.load_page();
    returned.coordinator.initialize().await;

    assert_eq!(returned.coordinator.phase(), SessionPhase::Authenticated);
    assert_eq!(
        returned.coordinator.identity().unwrap().display_name.as_deref(),
        Some("Ada Lovelace")
    );
    assert_eq!(browser.idp.current_url().unwrap(), ORIGIN);
}

#[tokio::test]
async fn closed_popup_leaves_user_signed_out() {
    let browser = Browser::new(HeadlessEnvironment::with_origin(ORIGIN).embedded(true));
    browser.idp.close_popups.store(true, Ordering::SeqCst);
    let page = browser.load_page();

    page.coordinator.initialize().await;
    page.coordinator.sign_in().await;

    assert_eq!(page.coordinator.phase(), SessionPhase::PopupClosedByUser);
    assert!(page.coordinator.identity().is_none());
    assert!(!browser
        .provider_keys()
        .iter()
        .any(|k| k.contains("interaction.status")));
}

#[tokio::test(start_paused = true)]
async fn reset_purges_provider_storage() {
    let browser = Browser::new(HeadlessEnvironment::with_origin(ORIGIN).embedded(true));
    let page = browser.load_page();
    page.coordinator.initialize().await;
    page.coordinator.sign_in().await;
    assert!(!browser.provider_keys().is_empty());

    page.coordinator.reset().await;

    assert!(browser.provider_keys().is_empty());
    assert_eq!(browser.idp.reloads.load(Ordering::SeqCst), 1);
    assert_eq!(page.coordinator.phase(), SessionPhase::Unauthenticated);
    assert!(page.tokens.access_token().await.is_err());
}
