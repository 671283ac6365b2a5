//! Access tokens for resource API calls.

use bridge_traits::platform::PlatformSendSync;
use core_runtime::events::{AuthEvent, CoreEvent};
use tracing::{debug, info, instrument, warn};

use crate::config::TokenRequest;
use crate::error::{AuthError, Result};
use crate::lifecycle::{ClientHandle, ClientLifecycle};
use crate::types::Identity;

/// Extra account lookups made when no account is active.
const ACCOUNT_LOOKUP_RETRIES: usize = 2;

/// Source of bearer tokens for the signed-in user.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AccessTokenSource: PlatformSendSync {
    async fn access_token(&self) -> Result<String>;
}

/// Tokens from the lifecycle's client: silent first, popup as a fallback.
#[derive(Clone)]
pub struct SessionTokenSource {
    lifecycle: ClientLifecycle,
    scopes: Vec<String>,
}

impl SessionTokenSource {
    pub fn new(lifecycle: ClientLifecycle, scopes: Vec<String>) -> Self {
        Self { lifecycle, scopes }
    }

    fn resolve_account(&self, client: &ClientHandle) -> Result<Identity> {
        if let Some(account) = client.active_account() {
            return Ok(account);
        }

        for attempt in 1..=ACCOUNT_LOOKUP_RETRIES {
            debug!(attempt, "No active account; checking cached accounts");
            if let Some(account) = client.all_accounts().into_iter().next() {
                client.set_active_account(Some(&account));
                if let Some(active) = client.active_account() {
                    return Ok(active);
                }
            }
        }

        Err(AuthError::NoActiveAccount)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl AccessTokenSource for SessionTokenSource {
    #[instrument(skip(self))]
    async fn access_token(&self) -> Result<String> {
        let client = self
            .lifecycle
            .get_instance()
            .await
            .ok_or(AuthError::Unavailable)?;
        let account = self.resolve_account(&client)?;
        let request = TokenRequest::new(self.scopes.clone(), account);

        let (result, silent) = match client.acquire_token_silent(&request).await {
            Ok(result) => (result, true),
            Err(silent_error) => {
                warn!(error = %silent_error, "Silent token acquisition failed; trying popup");
                let result = client
                    .acquire_token_popup(&request)
                    .await
                    .map_err(|e| AuthError::TokenAcquisition(e.to_string()))?;
                (result, false)
            }
        };

        info!(silent, from_cache = result.from_cache, "Access token acquired");
        self.lifecycle
            .events()
            .emit(CoreEvent::Auth(AuthEvent::TokenAcquired { silent }))
            .ok();
        Ok(result.access_token)
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::client::AuthClient;
    use crate::error::ProviderError;
    use crate::test_support::{
        auth_result, identity, FakeEnvironment, ScriptedClient, ScriptedFactory, StorageHarness,
    };
    use core_runtime::config::AppConfig;
    use core_runtime::events::EventBus;
    use std::sync::Arc;

    fn source(
        environment: FakeEnvironment,
        client: ScriptedClient,
    ) -> (SessionTokenSource, Arc<ScriptedClient>, EventBus) {
        let factory = Arc::new(ScriptedFactory::default());
        let client = factory.prepare(client);
        let events = EventBus::new(8);
        let lifecycle = ClientLifecycle::new(
            factory,
            StorageHarness::new().storage,
            Arc::new(environment),
            &AppConfig::default(),
            events.clone(),
        );
        (
            SessionTokenSource::new(lifecycle, vec!["User.Read".to_string()]),
            client,
            events,
        )
    }

    #[tokio::test]
    async fn silent_token_for_active_account() {
        let (source, client, events) =
            source(FakeEnvironment::new("app.example"), ScriptedClient::new());
        let mut rx = events.subscribe();
        client.set_active_account(Some(&identity("ada@contoso.com")));
        client
            .silent_results
            .lock()
            .unwrap()
            .push_back(Ok(auth_result(identity("ada@contoso.com"))));

        assert_eq!(source.access_token().await.unwrap(), "access-token");
        assert!(!client.calls().contains(&"acquire_token_popup".to_string()));
        assert_eq!(
            rx.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::TokenAcquired { silent: true })
        );
    }

    #[tokio::test]
    async fn first_cached_account_is_activated() {
        let (source, client, _) = source(
            FakeEnvironment::new("app.example"),
            ScriptedClient::new().with_account(identity("ada@contoso.com")),
        );
        client
            .silent_results
            .lock()
            .unwrap()
            .push_back(Ok(auth_result(identity("ada@contoso.com"))));

        source.access_token().await.unwrap();

        assert_eq!(
            client.active_account().unwrap().username,
            "ada@contoso.com"
        );
    }

    #[tokio::test]
    async fn popup_fallback_after_silent_failure() {
        let (source, client, events) = source(
            FakeEnvironment::new("app.example"),
            ScriptedClient::new().with_account(identity("ada@contoso.com")),
        );
        let mut rx = events.subscribe();
        client
            .token_popup_results
            .lock()
            .unwrap()
            .push_back(Ok(auth_result(identity("ada@contoso.com"))));

        assert_eq!(source.access_token().await.unwrap(), "access-token");
        assert_eq!(
            client.calls()[1..],
            ["acquire_token_silent".to_string(), "acquire_token_popup".to_string()]
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::TokenAcquired { silent: false })
        );
    }

    #[tokio::test]
    async fn failures_are_token_failures() {
        let (source, client, _) = source(
            FakeEnvironment::new("app.example"),
            ScriptedClient::new().with_account(identity("ada@contoso.com")),
        );
        client
            .token_popup_results
            .lock()
            .unwrap()
            .push_back(Err(ProviderError::new("user_cancelled", "closed")));

        let err = source.access_token().await.unwrap_err();
        assert!(err.is_token_failure());
    }

    #[tokio::test]
    async fn no_account_is_reported() {
        let (source, _, _) = source(FakeEnvironment::new("app.example"), ScriptedClient::new());
        assert!(matches!(
            source.access_token().await,
            Err(AuthError::NoActiveAccount)
        ));
    }

    #[tokio::test]
    async fn no_browser_means_unavailable() {
        let (source, _, _) = source(
            FakeEnvironment::new("app.example").headless(),
            ScriptedClient::new(),
        );
        assert!(matches!(
            source.access_token().await,
            Err(AuthError::Unavailable)
        ));
    }
}
