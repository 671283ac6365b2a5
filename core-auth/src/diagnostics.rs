//! Authentication diagnostics.
//!
//! A serializable snapshot of everything useful when sign-in misbehaves:
//! where the page runs, how the client is configured, which accounts it
//! knows, and what the provider left in storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinator::{SessionCoordinator, SessionSnapshot};
use crate::error::{AuthError, Result};
use crate::storage::StorageEntry;
use crate::types::{Identity, InteractionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub origin: Option<String>,
    pub hostname: Option<String>,
    pub is_browser: bool,
    pub embedded: bool,
    pub preview: bool,
    pub popups_supported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientReport {
    pub client_id: String,
    pub authority: String,
    pub redirect_uri: String,
    pub generation: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthDiagnostics {
    pub collected_at: DateTime<Utc>,
    pub environment: EnvironmentReport,
    /// `None` when no client instance is available.
    pub client: Option<ClientReport>,
    pub session: SessionSnapshot,
    pub accounts: Vec<Identity>,
    pub active_account: Option<Identity>,
    pub interaction_status: Option<InteractionStatus>,
    pub storage: Vec<StorageEntry>,
}

impl AuthDiagnostics {
    pub async fn collect(coordinator: &SessionCoordinator) -> Self {
        let lifecycle = coordinator.lifecycle();
        let environment = lifecycle.environment();

        let environment_report = EnvironmentReport {
            origin: environment.origin(),
            hostname: environment.hostname(),
            is_browser: environment.is_browser(),
            embedded: environment.is_embedded(),
            preview: coordinator.is_preview(),
            popups_supported: environment.popups_supported(),
        };

        let (client, accounts, active_account, interaction_status) =
            match lifecycle.get_instance().await {
                Some(handle) => {
                    let config = handle.configuration();
                    (
                        Some(ClientReport {
                            client_id: config.client_id.clone(),
                            authority: config.authority.clone(),
                            redirect_uri: config.redirect_uri.clone(),
                            generation: handle.generation(),
                        }),
                        handle.all_accounts(),
                        handle.active_account(),
                        handle.interaction_status(),
                    )
                }
                None => (None, Vec::new(), None, None),
            };

        Self {
            collected_at: Utc::now(),
            environment: environment_report,
            client,
            session: coordinator.snapshot(),
            accounts,
            active_account,
            interaction_status,
            storage: lifecycle.storage().provider_entries(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AuthError::Other(format!("Failed to serialize diagnostics: {}", e)))
    }
}
