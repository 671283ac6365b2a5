//! Authentication client contract.
//!
//! [`AuthClient`] is the provider library seen from the session core: sign-in
//! and sign-out flows, the account cache, token acquisition and an observer
//! hook. Every failure crossing this boundary is a [`ProviderError`].

use bridge_traits::platform::PlatformSendSync;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::config::{ClientConfig, LoginRequest, TokenRequest};
use crate::error::ProviderError;
use crate::types::{AuthenticationResult, Identity, InteractionFlow, InteractionStatus};

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Handle returned by [`AuthClient::add_event_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEventKind {
    LoginStart,
    LoginSuccess,
    LoginFailure,
    AcquireTokenStart,
    AcquireTokenSuccess,
    AcquireTokenFailure,
    LogoutStart,
    LogoutEnd,
    HandleRedirectStart,
    HandleRedirectEnd,
}

impl ClientEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientEventKind::LoginStart => "LoginStart",
            ClientEventKind::LoginSuccess => "LoginSuccess",
            ClientEventKind::LoginFailure => "LoginFailure",
            ClientEventKind::AcquireTokenStart => "AcquireTokenStart",
            ClientEventKind::AcquireTokenSuccess => "AcquireTokenSuccess",
            ClientEventKind::AcquireTokenFailure => "AcquireTokenFailure",
            ClientEventKind::LogoutStart => "LogoutStart",
            ClientEventKind::LogoutEnd => "LogoutEnd",
            ClientEventKind::HandleRedirectStart => "HandleRedirectStart",
            ClientEventKind::HandleRedirectEnd => "HandleRedirectEnd",
        }
    }
}

/// Activity reported by a client to its observers.
#[derive(Debug, Clone)]
pub struct ClientEvent {
    pub kind: ClientEventKind,
    pub flow: Option<InteractionFlow>,
    pub error: Option<ProviderError>,
    pub account: Option<Identity>,
}

impl ClientEvent {
    pub fn new(kind: ClientEventKind) -> Self {
        Self {
            kind,
            flow: None,
            error: None,
            account: None,
        }
    }

    pub fn with_flow(mut self, flow: InteractionFlow) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn with_error(mut self, error: ProviderError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_account(mut self, account: Identity) -> Self {
        self.account = Some(account);
        self
    }
}

pub trait ClientEventObserver: PlatformSendSync {
    fn on_event(&self, event: &ClientEvent);
}

/// The authentication provider client.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AuthClient: PlatformSendSync {
    fn configuration(&self) -> &ClientConfig;

    /// Must complete before any other call.
    async fn initialize(&self) -> ProviderResult<()>;

    /// Process an authorization response in the current URL, if any.
    async fn handle_redirect_promise(&self) -> ProviderResult<Option<AuthenticationResult>>;

    fn all_accounts(&self) -> Vec<Identity>;

    fn active_account(&self) -> Option<Identity>;

    fn set_active_account(&self, account: Option<&Identity>);

    async fn login_popup(&self, request: &LoginRequest) -> ProviderResult<AuthenticationResult>;

    /// Navigates the page away; returning `Ok` only means navigation started.
    async fn login_redirect(&self, request: &LoginRequest) -> ProviderResult<()>;

    async fn logout_popup(&self, account: Option<&Identity>) -> ProviderResult<()>;

    async fn logout_redirect(&self, account: Option<&Identity>) -> ProviderResult<()>;

    async fn acquire_token_silent(
        &self,
        request: &TokenRequest,
    ) -> ProviderResult<AuthenticationResult>;

    async fn acquire_token_popup(
        &self,
        request: &TokenRequest,
    ) -> ProviderResult<AuthenticationResult>;

    /// Authoritative interaction status, when the client tracks one.
    fn interaction_status(&self) -> Option<InteractionStatus> {
        None
    }

    fn add_event_observer(&self, observer: Arc<dyn ClientEventObserver>) -> ObserverId;

    fn remove_event_observer(&self, id: ObserverId) -> bool;
}

/// Builds client instances for the lifecycle manager.
pub trait ClientFactory: PlatformSendSync {
    fn create(&self, config: ClientConfig) -> ProviderResult<Arc<dyn AuthClient>>;
}

/// Observer bookkeeping shared by client implementations.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: AtomicU64,
    observers: Mutex<Vec<(ObserverId, Arc<dyn ClientEventObserver>)>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, observer: Arc<dyn ClientEventObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        match self.observers.lock() {
            Ok(mut observers) => observers.push((id, observer)),
            Err(poisoned) => poisoned.into_inner().push((id, observer)),
        }
        id
    }

    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = match self.observers.lock() {
            Ok(observers) => observers,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every observer registered at call time.
    pub fn notify(&self, event: &ClientEvent) {
        let snapshot: Vec<Arc<dyn ClientEventObserver>> = match self.observers.lock() {
            Ok(observers) => observers.iter().map(|(_, o)| o.clone()).collect(),
            Err(_) => {
                warn!("Observer registry poisoned; dropping event");
                return;
            }
        };
        for observer in snapshot {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter(Mutex<Vec<ClientEventKind>>);

    impl ClientEventObserver for Counter {
        fn on_event(&self, event: &ClientEvent) {
            self.0.lock().unwrap().push(event.kind);
        }
    }

    #[test]
    fn removed_observers_stop_receiving() {
        let registry = ObserverRegistry::new();
        let first = Arc::new(Counter::default());
        let second = Arc::new(Counter::default());

        let first_id = registry.add(first.clone());
        registry.add(second.clone());
        registry.notify(&ClientEvent::new(ClientEventKind::LoginStart));

        assert!(registry.remove(first_id));
        assert!(!registry.remove(first_id));
        registry.notify(&ClientEvent::new(ClientEventKind::LoginSuccess));

        assert_eq!(*first.0.lock().unwrap(), vec![ClientEventKind::LoginStart]);
        assert_eq!(
            *second.0.lock().unwrap(),
            vec![ClientEventKind::LoginStart, ClientEventKind::LoginSuccess]
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn observer_ids_are_unique() {
        let registry = ObserverRegistry::new();
        let a = registry.add(Arc::new(Counter::default()));
        let b = registry.add(Arc::new(Counter::default()));
        assert_ne!(a, b);
    }
}
