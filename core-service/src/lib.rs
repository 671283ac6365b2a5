//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, web storage,
//! cookies, environment, window) into the session, Graph and chat cores.
//! Native hosts and tests typically enable the `desktop-shims` feature (which
//! depends on `bridge-desktop`), whereas WebAssembly builds enable the `wasm`
//! feature and rely on the adapters from `bridge-wasm`.

pub mod error;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{
    environment::BrowserEnvironment,
    http::HttpClient,
    storage::{CookieJar, WebStorage},
    window::WindowHost,
};
use bytes::Bytes;
use core_auth::{
    AuthDiagnostics, ClientLifecycle, Identity, PkceClientFactory, ProviderStorage,
    SessionCoordinator, SessionTokenSource,
};
use core_chat::{Conversation, OpenAiTextGenerator, QueryReply, QueryService};
use core_runtime::config::AppConfig;
use core_runtime::events::EventBus;
use provider_graph::GraphClient;
use tracing::{info, instrument};

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
use bridge_wasm::WasmBridgeSet;

/// Name used in prompts when the identity has no display name.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

const EVENT_CAPACITY: usize = 256;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub session_storage: Arc<dyn WebStorage>,
    pub local_storage: Arc<dyn WebStorage>,
    pub cookies: Arc<dyn CookieJar>,
    pub environment: Arc<dyn BrowserEnvironment>,
    pub window: Arc<dyn WindowHost>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        session_storage: Arc<dyn WebStorage>,
        local_storage: Arc<dyn WebStorage>,
        cookies: Arc<dyn CookieJar>,
        environment: Arc<dyn BrowserEnvironment>,
        window: Arc<dyn WindowHost>,
    ) -> Self {
        Self {
            http_client,
            session_storage,
            local_storage,
            cookies,
            environment,
            window,
        }
    }

    /// Native bridges with no browser page: sign-in stays unavailable, the
    /// rest of the stack is fully wired.
    #[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
    pub fn headless() -> Self {
        use bridge_desktop::{
            HeadlessEnvironment, HeadlessWindowHost, MemoryCookieJar, MemoryWebStorage,
            ReqwestHttpClient,
        };

        Self::new(
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(MemoryWebStorage::session()),
            Arc::new(MemoryWebStorage::local()),
            Arc::new(MemoryCookieJar::new()),
            Arc::new(HeadlessEnvironment::new()),
            Arc::new(HeadlessWindowHost::new("about:blank")),
        )
    }
}

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
impl From<WasmBridgeSet> for CoreDependencies {
    fn from(set: WasmBridgeSet) -> Self {
        Self {
            http_client: set.http_client,
            session_storage: set.session_storage,
            local_storage: set.local_storage,
            cookies: set.cookies,
            environment: set.environment,
            window: set.window,
        }
    }
}

struct ServiceInner {
    config: AppConfig,
    events: EventBus,
    coordinator: SessionCoordinator,
    graph: GraphClient,
    queries: Arc<QueryService>,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

impl CoreService {
    /// Wire the session, Graph and chat cores over `deps` and run the
    /// session's startup sequence.
    #[instrument(skip_all)]
    pub async fn bootstrap(config: AppConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(EVENT_CAPACITY);
        let storage = ProviderStorage::new(deps.session_storage, deps.local_storage, deps.cookies);
        let factory = Arc::new(PkceClientFactory::new(
            deps.http_client.clone(),
            storage.clone(),
            deps.window.clone(),
        ));
        let lifecycle = ClientLifecycle::new(
            factory,
            storage,
            deps.environment,
            &config,
            events.clone(),
        );
        let coordinator = SessionCoordinator::new(lifecycle.clone(), deps.window, &config);

        let tokens = Arc::new(SessionTokenSource::new(lifecycle, config.auth.scopes.clone()));
        let graph = GraphClient::new(deps.http_client.clone(), tokens, &config.graph);
        let generator = Arc::new(OpenAiTextGenerator::new(deps.http_client, &config.model));
        let queries = Arc::new(QueryService::new(
            Arc::new(graph.clone()),
            generator,
            events.clone(),
        ));

        coordinator.initialize().await;
        info!(phase = ?coordinator.phase(), "Core service ready");

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                events,
                coordinator,
                graph,
                queries,
            }),
        })
    }

    pub fn session(&self) -> &SessionCoordinator {
        &self.inner.coordinator
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Name the assistant addresses the user by.
    pub fn display_name(&self) -> String {
        display_name_for(self.inner.coordinator.identity().as_ref())
    }

    /// Answer `query` from SharePoint content for the signed-in user.
    pub async fn ask(&self, query: &str) -> QueryReply {
        self.inner
            .queries
            .process_query(query, &self.display_name())
            .await
    }

    /// A fresh transcript bound to this service's query pipeline.
    pub fn conversation(&self) -> Conversation {
        Conversation::new(self.inner.queries.clone())
    }

    /// Profile photo of the signed-in user, `None` if they have none.
    pub async fn user_photo(&self) -> Result<Option<Bytes>> {
        Ok(self.inner.graph.user_photo().await?)
    }

    pub async fn diagnostics(&self) -> AuthDiagnostics {
        AuthDiagnostics::collect(&self.inner.coordinator).await
    }
}

fn display_name_for(identity: Option<&Identity>) -> String {
    identity
        .and_then(|identity| identity.display_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME)
        .to_string()
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use core_auth::SessionPhase;
    use core_chat::ReplyKind;

    fn identity(display_name: Option<&str>) -> Identity {
        Identity {
            home_account_id: "oid.tid".to_string(),
            local_account_id: "oid".to_string(),
            tenant_id: "tid".to_string(),
            username: "ada@contoso.com".to_string(),
            display_name: display_name.map(str::to_string),
            environment: "login.microsoftonline.com".to_string(),
        }
    }

    fn config() -> AppConfig {
        AppConfig::builder()
            .client_id("cid")
            .tenant_id("contoso")
            .build()
            .unwrap()
    }

    #[test]
    fn display_name_falls_back_to_user() {
        assert_eq!(display_name_for(None), "User");
        assert_eq!(display_name_for(Some(&identity(None))), "User");
        assert_eq!(display_name_for(Some(&identity(Some("  ")))), "User");
        assert_eq!(
            display_name_for(Some(&identity(Some("Ada Lovelace")))),
            "Ada Lovelace"
        );
    }

    #[tokio::test]
    async fn headless_bootstrap_is_signed_out() {
        let core = CoreService::bootstrap(config(), CoreDependencies::headless())
            .await
            .unwrap();

        assert_eq!(core.session().phase(), SessionPhase::Unauthenticated);
        assert_eq!(core.display_name(), "User");

        let report = core.diagnostics().await;
        assert!(report.client.is_none());
        assert!(!report.environment.is_browser);
    }

    #[tokio::test]
    async fn questions_without_a_session_report_access_problem() {
        let core = CoreService::bootstrap(config(), CoreDependencies::headless())
            .await
            .unwrap();

        let reply = core.ask("Where is the travel policy?").await;
        assert_eq!(reply.kind, ReplyKind::AccessProblem);

        let mut conversation = core.conversation();
        conversation.send("hello", &core.display_name()).await.unwrap();
        assert_eq!(conversation.messages().len(), 3);
    }

    #[tokio::test]
    async fn photo_needs_a_session() {
        let core = CoreService::bootstrap(config(), CoreDependencies::headless())
            .await
            .unwrap();

        assert!(matches!(
            core.user_photo().await,
            Err(CoreError::Graph(provider_graph::GraphError::Auth(_)))
        ));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = config();
        config.graph.endpoint = "http://graph.example".to_string();

        assert!(matches!(
            CoreService::bootstrap(config, CoreDependencies::headless()).await,
            Err(CoreError::Config(_))
        ));
    }
}
