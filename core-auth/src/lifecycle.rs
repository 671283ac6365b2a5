//! # Client Lifecycle
//!
//! Owns the one authentication client instance of the process.
//!
//! ## Overview
//!
//! The instance is built lazily behind a single shared initialization future,
//! so every concurrent caller observes the same instance and only one build
//! ever runs at a time. [`ClientLifecycle::reset`] purges provider storage and
//! replaces the instance wholesale; it never mutates it in place.
//!
//! Each instance carries a generation number. Asynchronous flows capture it
//! when they start and check [`ClientLifecycle::is_current`] before trusting
//! their result.
//!
//! ## Usage
//!
//! ```ignore
//! let lifecycle = ClientLifecycle::new(factory, storage, environment, &config, events);
//!
//! if let Some(client) = lifecycle.get_instance().await {
//!     let accounts = client.all_accounts();
//!     if !lifecycle.is_current(client.generation()) {
//!         return; // superseded by a reset
//!     }
//! }
//! ```

use bridge_traits::environment::BrowserEnvironment;
use core_async::future::{boxed, PlatformBoxFuture};
use core_runtime::config::{AppConfig, AuthSettings, TimingSettings};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use futures::future::{FutureExt, Shared};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

use crate::client::{AuthClient, ClientEvent, ClientEventObserver, ClientFactory, ObserverId};
use crate::config::ClientConfig;
use crate::error::ProviderError;
use crate::storage::ProviderStorage;

type InitFuture = Shared<PlatformBoxFuture<'static, Result<ClientHandle, ProviderError>>>;

/// Reference-counted handle to a client instance, tagged with its generation.
#[derive(Clone)]
pub struct ClientHandle {
    client: Arc<dyn AuthClient>,
    generation: u64,
}

impl ClientHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn client(&self) -> &Arc<dyn AuthClient> {
        &self.client
    }
}

impl Deref for ClientHandle {
    type Target = dyn AuthClient;

    fn deref(&self) -> &Self::Target {
        self.client.as_ref()
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("generation", &self.generation)
            .field("client_id", &self.client.configuration().client_id)
            .finish()
    }
}

/// Forwards provider client activity to the runtime event bus.
struct EventForwarder {
    events: EventBus,
    generation: u64,
}

impl ClientEventObserver for EventForwarder {
    fn on_event(&self, event: &ClientEvent) {
        let error_code = event.error.as_ref().map(|e| e.code.clone());
        debug!(
            generation = self.generation,
            kind = event.kind.as_str(),
            error_code = error_code.as_deref().unwrap_or(""),
            "Provider client event"
        );
        self.events
            .emit(CoreEvent::Auth(AuthEvent::ProviderNotice {
                kind: event.kind.as_str().to_string(),
                error_code,
            }))
            .ok();
    }
}

#[derive(Default)]
struct LifecycleState {
    init: Option<InitFuture>,
    current: Option<ClientHandle>,
    observer: Option<(ClientHandle, ObserverId)>,
}

struct Inner {
    factory: Arc<dyn ClientFactory>,
    storage: ProviderStorage,
    environment: Arc<dyn BrowserEnvironment>,
    auth: AuthSettings,
    timing: TimingSettings,
    events: EventBus,
    state: Mutex<LifecycleState>,
    generation: AtomicU64,
    reset_lock: core_async::sync::Mutex<()>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn build(self: Arc<Self>, generation: u64) -> Result<ClientHandle, ProviderError> {
        // Markers left by an abandoned page would block every interaction.
        self.storage.clear_interaction_markers();

        let origin = self
            .environment
            .origin()
            .unwrap_or_else(|| self.auth.fallback_origin.clone());
        let config = ClientConfig::from_settings(&self.auth, &self.timing, &origin);
        debug!(
            generation,
            redirect_uri = %config.redirect_uri,
            "Constructing authentication client"
        );

        let client = self.factory.create(config).map_err(|e| {
            warn!(generation, error = %e, "Client construction failed");
            e
        })?;
        client.initialize().await.map_err(|e| {
            warn!(generation, error = %e, "Client initialization failed");
            e
        })?;

        let handle = ClientHandle { client, generation };
        let observer_id = handle.add_event_observer(Arc::new(EventForwarder {
            events: self.events.clone(),
            generation,
        }));

        let published = {
            let mut state = self.state();
            if self.generation.load(Ordering::SeqCst) == generation {
                state.current = Some(handle.clone());
                state.observer = Some((handle.clone(), observer_id));
                true
            } else {
                false
            }
        };
        if !published {
            handle.remove_event_observer(observer_id);
            debug!(generation, "Superseded client not published");
            return Ok(handle);
        }

        info!(generation, "Authentication client ready");
        Ok(handle)
    }
}

/// Owner of the authentication client instance.
#[derive(Clone)]
pub struct ClientLifecycle {
    inner: Arc<Inner>,
}

impl ClientLifecycle {
    pub fn new(
        factory: Arc<dyn ClientFactory>,
        storage: ProviderStorage,
        environment: Arc<dyn BrowserEnvironment>,
        config: &AppConfig,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                factory,
                storage,
                environment,
                auth: config.auth.clone(),
                timing: config.timing.clone(),
                events,
                state: Mutex::new(LifecycleState::default()),
                generation: AtomicU64::new(0),
                reset_lock: core_async::sync::Mutex::new(()),
            }),
        }
    }

    /// Returns the shared instance, building it on first use.
    ///
    /// A failed build is not retried: later calls see the same error until
    /// [`reset`](Self::reset) is called.
    pub async fn initialize(&self) -> Result<ClientHandle, ProviderError> {
        let future = {
            let mut state = self.inner.state();
            match &state.init {
                Some(existing) => existing.clone(),
                None => {
                    let future = self.start_build();
                    state.init = Some(future.clone());
                    future
                }
            }
        };
        future.await
    }

    /// Like [`initialize`](Self::initialize), but `None` outside a browser
    /// or when initialization failed.
    pub async fn get_instance(&self) -> Option<ClientHandle> {
        if !self.inner.environment.is_browser() {
            debug!("No browser context; authentication client unavailable");
            return None;
        }

        match self.initialize().await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Authentication client unavailable");
                None
            }
        }
    }

    /// Instance that finished initializing, without waiting.
    pub fn current(&self) -> Option<ClientHandle> {
        self.inner.state().current.clone()
    }

    /// Purge provider storage and replace the instance.
    ///
    /// Waits for an in-flight build, never for a pending interaction; the
    /// discarded instance is left to settle on its own.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<ClientHandle, ProviderError> {
        let _guard = self.inner.reset_lock.lock().await;

        let pending = self.inner.state().init.clone();
        if let Some(pending) = pending {
            if let Err(e) = pending.await {
                debug!(error = %e, "Discarding failed initialization");
            }
        }

        self.inner.storage.clear_all();

        let (future, previous) = {
            let mut state = self.inner.state();
            let future = self.start_build();
            state.init = Some(future.clone());
            state.current = None;
            (future, state.observer.take())
        };
        if let Some((handle, id)) = previous {
            handle.remove_event_observer(id);
            debug!(generation = handle.generation(), "Detached observer from previous client");
        }

        let handle = future.await?;

        info!(generation = handle.generation(), "Authentication client reset");
        self.inner
            .events
            .emit(CoreEvent::Auth(AuthEvent::ClientReset {
                generation: handle.generation(),
            }))
            .ok();
        Ok(handle)
    }

    /// Unsubscribe the event forwarder from the current instance.
    pub fn detach_observer(&self) {
        let previous = self.inner.state().observer.take();
        if let Some((handle, id)) = previous {
            handle.remove_event_observer(id);
        }
    }

    /// Generation of the newest instance, built or under construction.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    pub fn storage(&self) -> &ProviderStorage {
        &self.inner.storage
    }

    pub fn environment(&self) -> &Arc<dyn BrowserEnvironment> {
        &self.inner.environment
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    fn start_build(&self) -> InitFuture {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = self.inner.clone();
        boxed(inner.build(generation)).shared()
    }
}
