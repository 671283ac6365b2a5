//! # Session Coordinator
//!
//! The authentication state machine behind the sign-in screen.
//!
//! ## Overview
//!
//! The coordinator owns the [`SessionPhase`] and the active [`Identity`]. It
//! is the only component that turns provider failures into user-visible
//! phases:
//!
//! - configuration signatures (`AADSTS50011`, SPA registration) become
//!   [`SessionPhase::ConfigurationError`] and are never retried;
//! - a conflicting interaction triggers one forced login, then an error;
//! - a closed popup or a cancellation is informational, not an error;
//! - anything else becomes [`SessionPhase::Error`] with the provider message.
//!
//! ## Flow selection
//!
//! Popup when the page is framed by a foreign origin, or when running in the
//! preview host with popups available. Full-page redirect otherwise. See
//! [`select_flow`].
//!
//! ## Timers
//!
//! - A popup that produced no outcome after the popup timeout (60 s) is
//!   presumed closed.
//! - A detected interaction conflict arms the watchdog (30 s), which clears
//!   provider storage if the interaction is still stuck.
//!
//! Neither timer cancels the provider call. Every asynchronous result is
//! checked against the lifecycle generation it started with and dropped when
//! a reset superseded it.

use bridge_traits::window::WindowHost;
use core_async::task::spawn_detached;
use core_async::time::sleep;
use core_runtime::config::{AppConfig, AuthSettings, TimingSettings};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

use crate::config::LoginRequest;
use crate::error::ProviderError;
use crate::interaction::InteractionTracker;
use crate::lifecycle::{ClientHandle, ClientLifecycle};
use crate::signature::{self, ErrorSignature};
use crate::types::{Identity, InteractionFlow, SessionPhase};

pub const NOT_INITIALIZED_MESSAGE: &str =
    "Authentication system not initialized yet. Please try again.";
pub const NOT_AVAILABLE_MESSAGE: &str = "Authentication system not available. Please try again.";
pub const ALREADY_IN_PROGRESS_MESSAGE: &str =
    "Authentication is already in progress. Please reset the authentication state and try again.";
pub const FORCE_LOGIN_FAILED_MESSAGE: &str =
    "Failed to force login. Please try resetting the authentication state.";
pub const REDIRECT_FAILED_MESSAGE: &str =
    "Failed to start redirect authentication. Please try again.";
pub const FALLBACK_ERROR_MESSAGE: &str = "Authentication failed";

/// Pick the interactive flow for the current page.
///
/// Framed pages always use a popup. Outside a frame, only the preview host
/// with working popups does; everything else redirects.
pub fn select_flow(embedded: bool, preview: bool, popups_supported: bool) -> InteractionFlow {
    if embedded || (preview && popups_supported) {
        InteractionFlow::Popup
    } else {
        InteractionFlow::Redirect
    }
}

/// Phase for a failed interactive flow.
///
/// `generic` replaces the provider message for failures that match no known
/// signature.
pub fn phase_for_error(
    err: &ProviderError,
    flow: InteractionFlow,
    generic: Option<&str>,
) -> SessionPhase {
    let signature = signature::classify(err);
    if let Some(kind) = signature.configuration_kind() {
        return SessionPhase::ConfigurationError(kind);
    }

    match signature {
        ErrorSignature::InteractionInProgress => SessionPhase::InteractionInProgress,
        ErrorSignature::PopupClosed if flow == InteractionFlow::Popup => {
            SessionPhase::PopupClosedByUser
        }
        ErrorSignature::UserCancelled => SessionPhase::UserCancelled,
        _ => {
            let message = match generic {
                Some(generic) => generic.to_string(),
                None if err.message.trim().is_empty() => FALLBACK_ERROR_MESSAGE.to_string(),
                None => err.message.clone(),
            };
            SessionPhase::Error { message }
        }
    }
}

/// Point-in-time view of the session, for the UI and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub identity: Option<Identity>,
    pub interaction_in_progress: bool,
    pub force_login_attempted: bool,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    phase: SessionPhase,
    identity: Option<Identity>,
    initialized: bool,
    resetting: bool,
    interaction_in_progress: bool,
    force_login_attempted: bool,
    popup_attempts: u64,
    open_popup: Option<u64>,
}

struct Inner {
    lifecycle: ClientLifecycle,
    tracker: InteractionTracker,
    window: Arc<dyn WindowHost>,
    auth: AuthSettings,
    timing: TimingSettings,
    state: Mutex<CoordinatorState>,
}

/// Authentication state machine.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

impl SessionCoordinator {
    pub fn new(
        lifecycle: ClientLifecycle,
        window: Arc<dyn WindowHost>,
        config: &AppConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                tracker: InteractionTracker::new(lifecycle.clone()),
                lifecycle,
                window,
                auth: config.auth.clone(),
                timing: config.timing.clone(),
                state: Mutex::new(CoordinatorState::default()),
            }),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().phase.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().phase.is_authenticated()
    }

    pub fn interaction_in_progress(&self) -> bool {
        self.state().interaction_in_progress
    }

    pub fn force_login_attempted(&self) -> bool {
        self.state().force_login_attempted
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            phase: state.phase.clone(),
            identity: state.identity.clone(),
            interaction_in_progress: state.interaction_in_progress,
            force_login_attempted: state.force_login_attempted,
            generation: self.inner.lifecycle.generation(),
        }
    }

    pub fn lifecycle(&self) -> &ClientLifecycle {
        &self.inner.lifecycle
    }

    /// Whether the page runs inside the preview host.
    pub fn is_preview(&self) -> bool {
        let marker = self.inner.auth.preview_host_marker.as_str();
        !marker.is_empty()
            && self
                .inner
                .lifecycle
                .environment()
                .hostname()
                .map(|host| host.contains(marker))
                .unwrap_or(false)
    }

    /// Resolve the startup phase.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        self.set_phase(SessionPhase::Loading);
        let environment = self.inner.lifecycle.environment().clone();

        if !environment.is_browser() {
            debug!("No browser context; staying signed out");
            self.state().initialized = true;
            self.set_phase(SessionPhase::Unauthenticated);
            return;
        }

        let handle = match self.inner.lifecycle.initialize().await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Authentication initialization failed");
                self.state().initialized = true;
                self.fail(&e, InteractionFlow::Redirect, None);
                return;
            }
        };
        let generation = handle.generation();

        if !environment.is_embedded() {
            match handle.handle_redirect_promise().await {
                Ok(Some(result)) => {
                    if self.is_stale(generation, "redirect completion") {
                        return;
                    }
                    self.state().initialized = true;
                    self.authenticate(result.account);
                    return;
                }
                Ok(None) => {}
                Err(e) => {
                    if self.is_stale(generation, "redirect completion") {
                        return;
                    }
                    warn!(error = %e, "Redirect completion failed");
                    self.state().initialized = true;
                    self.fail(&e, InteractionFlow::Redirect, None);
                    return;
                }
            }
        }

        let in_progress = self.inner.tracker.is_in_progress().await;
        if self.is_stale(generation, "initialization") {
            return;
        }
        if in_progress {
            info!(generation, "Interaction reported in progress at startup");
            self.state().interaction_in_progress = true;
            self.arm_watchdog();
        }

        let account = handle
            .active_account()
            .or_else(|| handle.all_accounts().into_iter().next());

        self.state().initialized = true;
        match account {
            Some(account) => {
                handle.set_active_account(Some(&account));
                self.authenticate(account);
            }
            None => self.set_phase(SessionPhase::Unauthenticated),
        }
    }

    /// User-initiated sign-in.
    #[instrument(skip(self))]
    pub async fn sign_in(&self) {
        {
            let mut state = self.state();
            if state.phase == SessionPhase::Authenticating || state.resetting {
                debug!(phase = %state.phase, resetting = state.resetting, "Sign-in ignored");
                return;
            }
            if !state.initialized {
                drop(state);
                self.set_error(NOT_INITIALIZED_MESSAGE);
                return;
            }
            state.phase = SessionPhase::Authenticating;
        }
        self.announce(&SessionPhase::Authenticating);

        let Some(handle) = self.inner.lifecycle.get_instance().await else {
            self.set_error(NOT_AVAILABLE_MESSAGE);
            return;
        };

        if let Some(account) = handle.active_account() {
            debug!(username = %account.username, "Account already active");
            self.authenticate(account);
            return;
        }

        if self.inner.tracker.is_in_progress().await {
            let attempted = {
                let mut state = self.state();
                state.interaction_in_progress = true;
                std::mem::replace(&mut state.force_login_attempted, true)
            };
            if attempted {
                warn!("Interaction still in progress after a forced login");
                self.set_error(ALREADY_IN_PROGRESS_MESSAGE);
            } else {
                info!("Interaction in progress; forcing a fresh login");
                self.forced_login().await;
            }
            return;
        }

        self.launch(handle, None).await;
    }

    /// Reset the client, then sign in with the usual flow.
    #[instrument(skip(self))]
    pub async fn force_login(&self) {
        self.state().force_login_attempted = true;
        self.forced_login().await;
    }

    /// Reset the client, then sign in with a full-page redirect.
    #[instrument(skip(self))]
    pub async fn try_redirect(&self) {
        self.set_phase(SessionPhase::Authenticating);

        let handle = match self.inner.lifecycle.reset().await {
            Ok(handle) => handle,
            Err(e) => {
                self.fail(&e, InteractionFlow::Redirect, Some(REDIRECT_FAILED_MESSAGE));
                return;
            }
        };
        self.state().interaction_in_progress = false;

        sleep(self.inner.timing.reset_settle).await;
        self.redirect_login(handle, Some(REDIRECT_FAILED_MESSAGE)).await;
    }

    /// Discard all authentication state and start over.
    #[instrument(skip(self))]
    pub async fn reset(&self) {
        let changed = {
            let mut state = self.state();
            state.resetting = true;
            state.initialized = false;
            state.interaction_in_progress = false;
            state.force_login_attempted = false;
            state.open_popup = None;
            state.identity = None;
            let changed = state.phase != SessionPhase::Loading;
            state.phase = SessionPhase::Loading;
            changed
        };
        if changed {
            self.announce(&SessionPhase::Loading);
        }

        if let Err(e) = self.inner.lifecycle.reset().await {
            warn!(error = %e, "Client reset failed");
        }
        sleep(self.inner.timing.reset_settle).await;

        if let Err(e) = self.inner.window.reload() {
            warn!(error = %e, "Failed to reload the page");
        }

        self.state().resetting = false;
        self.initialize().await;
    }

    /// Sign the active identity out.
    ///
    /// Failures are logged; the local identity is cleared regardless.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        if let Some(handle) = self.inner.lifecycle.get_instance().await {
            let account = self.identity().or_else(|| handle.active_account());
            let result = if self.inner.lifecycle.environment().is_embedded() {
                handle.logout_popup(account.as_ref()).await
            } else {
                handle.logout_redirect(account.as_ref()).await
            };
            if let Err(e) = result {
                warn!(error = %e, "Logout failed");
            }
        }

        self.state().identity = None;
        self.set_phase(SessionPhase::Unauthenticated);
        self.emit(AuthEvent::SignedOut);
    }

    /// Detach from the client and disarm the popup timer.
    pub fn teardown(&self) {
        self.state().open_popup = None;
        self.inner.lifecycle.detach_observer();
        debug!("Session coordinator torn down");
    }

    async fn forced_login(&self) {
        self.set_phase(SessionPhase::Authenticating);

        let handle = match self.inner.lifecycle.reset().await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Forced login reset failed");
                self.fail(&e, InteractionFlow::Redirect, Some(FORCE_LOGIN_FAILED_MESSAGE));
                return;
            }
        };
        self.state().interaction_in_progress = false;

        self.launch(handle, Some(FORCE_LOGIN_FAILED_MESSAGE)).await;
    }

    async fn launch(&self, handle: ClientHandle, generic: Option<&'static str>) {
        let environment = self.inner.lifecycle.environment();
        let flow = select_flow(
            environment.is_embedded(),
            self.is_preview(),
            environment.popups_supported(),
        );
        info!(flow = %flow, generation = handle.generation(), "Launching interactive sign-in");

        match flow {
            InteractionFlow::Popup => self.popup_login(handle, generic).await,
            InteractionFlow::Redirect => self.redirect_login(handle, generic).await,
        }
    }

    async fn popup_login(&self, handle: ClientHandle, generic: Option<&'static str>) {
        let generation = handle.generation();
        let attempt = {
            let mut state = self.state();
            state.popup_attempts += 1;
            state.open_popup = Some(state.popup_attempts);
            state.popup_attempts
        };
        self.emit(AuthEvent::InteractionStarted {
            flow: InteractionFlow::Popup.as_str().to_string(),
        });
        self.arm_popup_timer(attempt, generation);

        let request = LoginRequest::from_settings(&self.inner.auth);
        let result = handle.login_popup(&request).await;

        let awaited = {
            let mut state = self.state();
            if state.open_popup == Some(attempt) {
                state.open_popup = None;
                true
            } else {
                false
            }
        };
        if self.is_stale(generation, "popup login") {
            return;
        }

        match result {
            Ok(result) => {
                handle.set_active_account(Some(&result.account));
                self.authenticate(result.account);
            }
            Err(e) if !awaited => {
                debug!(error = %e, "Popup outcome arrived after the popup was presumed closed");
            }
            Err(e) => {
                warn!(error = %e, "Popup sign-in failed");
                let phase = phase_for_error(&e, InteractionFlow::Popup, generic);
                let environment = self.inner.lifecycle.environment();
                if phase == SessionPhase::PopupClosedByUser
                    && self.is_preview()
                    && !environment.is_embedded()
                {
                    info!("Popup closed in preview host; falling back to redirect");
                    self.redirect_login(handle, generic).await;
                    return;
                }
                self.fail(&e, InteractionFlow::Popup, generic);
            }
        }
    }

    async fn redirect_login(&self, handle: ClientHandle, generic: Option<&'static str>) {
        let generation = handle.generation();
        self.emit(AuthEvent::InteractionStarted {
            flow: InteractionFlow::Redirect.as_str().to_string(),
        });

        let request = LoginRequest::from_settings(&self.inner.auth);
        match handle.login_redirect(&request).await {
            Ok(()) => debug!(generation, "Redirect sign-in started"),
            Err(e) => {
                if self.is_stale(generation, "redirect launch") {
                    return;
                }
                warn!(error = %e, "Redirect sign-in failed to start");
                self.fail(&e, InteractionFlow::Redirect, generic);
            }
        }
    }

    fn arm_popup_timer(&self, attempt: u64, generation: u64) {
        let coordinator = self.clone();
        let timeout = self.inner.timing.popup_timeout;
        spawn_detached(async move {
            sleep(timeout).await;
            let expired = {
                let mut state = coordinator.state();
                if state.open_popup == Some(attempt) {
                    state.open_popup = None;
                    true
                } else {
                    false
                }
            };
            if expired && coordinator.inner.lifecycle.is_current(generation) {
                warn!(attempt, "No popup outcome; presuming the popup was closed");
                coordinator.set_phase(SessionPhase::PopupClosedByUser);
            }
        });
    }

    fn arm_watchdog(&self) {
        let coordinator = self.clone();
        let generation = self.inner.lifecycle.generation();
        self.inner
            .tracker
            .arm_timeout(self.inner.timing.interaction_watchdog, move || {
                coordinator.state().interaction_in_progress = false;
                warn!(generation, "Stuck interaction cleared");
                coordinator.emit(AuthEvent::InteractionCleared { generation });
            });
    }

    fn fail(&self, err: &ProviderError, flow: InteractionFlow, generic: Option<&str>) {
        let phase = phase_for_error(err, flow, generic);
        match &phase {
            SessionPhase::InteractionInProgress => {
                self.state().interaction_in_progress = true;
                self.arm_watchdog();
            }
            SessionPhase::ConfigurationError(kind) => {
                self.emit(AuthEvent::Error {
                    message: kind.remediation().to_string(),
                    recoverable: false,
                });
            }
            SessionPhase::Error { message } => {
                self.emit(AuthEvent::Error {
                    message: message.clone(),
                    recoverable: true,
                });
            }
            _ => {}
        }
        self.set_phase(phase);
    }

    fn set_error(&self, message: &str) {
        self.emit(AuthEvent::Error {
            message: message.to_string(),
            recoverable: true,
        });
        self.set_phase(SessionPhase::Error {
            message: message.to_string(),
        });
    }

    fn authenticate(&self, account: Identity) {
        info!(username = %account.username, "Signed in");
        {
            let mut state = self.state();
            state.identity = Some(account.clone());
            state.interaction_in_progress = false;
        }
        self.set_phase(SessionPhase::Authenticated);
        self.emit(AuthEvent::SignedIn {
            username: account.username,
            display_name: account.display_name,
        });
    }

    fn set_phase(&self, phase: SessionPhase) {
        {
            let mut state = self.state();
            if state.phase == phase {
                return;
            }
            state.phase = phase.clone();
        }
        self.announce(&phase);
    }

    fn announce(&self, phase: &SessionPhase) {
        info!(phase = %phase, "Session phase changed");
        self.emit(AuthEvent::PhaseChanged {
            phase: phase.to_string(),
        });
    }

    fn is_stale(&self, generation: u64, what: &str) -> bool {
        let stale = !self.inner.lifecycle.is_current(generation);
        if stale {
            debug!(
                generation,
                current = self.inner.lifecycle.generation(),
                "Discarding stale {}",
                what
            );
        }
        stale
    }

    fn emit(&self, event: AuthEvent) {
        self.events().emit(CoreEvent::Auth(event)).ok();
    }

    fn events(&self) -> &EventBus {
        self.inner.lifecycle.events()
    }

    fn state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
