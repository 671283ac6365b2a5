//! Interaction state tracking.
//!
//! Answers "is an interactive flow running?" from the client's own status
//! when it reports one, and from storage markers otherwise.

use bridge_traits::platform::PlatformSend;
use core_async::task::spawn_detached;
use core_async::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::lifecycle::ClientLifecycle;

#[derive(Clone)]
pub struct InteractionTracker {
    lifecycle: ClientLifecycle,
}

impl InteractionTracker {
    pub fn new(lifecycle: ClientLifecycle) -> Self {
        Self { lifecycle }
    }

    /// `false` when no client instance is available.
    pub async fn is_in_progress(&self) -> bool {
        let Some(client) = self.lifecycle.get_instance().await else {
            return false;
        };

        match client.interaction_status() {
            Some(status) => {
                debug!(status = status.as_str(), "Client interaction status");
                status.is_in_progress()
            }
            None => self.lifecycle.storage().has_interaction_marker(),
        }
    }

    /// Clear provider storage if an interaction is still reported.
    ///
    /// Returns whether anything was cleared.
    pub async fn check_and_clear(&self) -> bool {
        if !self.is_in_progress().await {
            return false;
        }
        warn!("Interaction still in progress; clearing provider storage");
        self.lifecycle.storage().clear_all();
        true
    }

    /// Run [`check_and_clear`](Self::check_and_clear) once after `duration`,
    /// calling `on_cleared` if it cleared anything.
    pub fn arm_timeout<F>(&self, duration: Duration, on_cleared: F)
    where
        F: FnOnce() + PlatformSend + 'static,
    {
        let tracker = self.clone();
        debug!(seconds = duration.as_secs(), "Interaction watchdog armed");
        spawn_detached(async move {
            sleep(duration).await;
            if tracker.check_and_clear().await {
                on_cleared();
            }
        });
    }
}
