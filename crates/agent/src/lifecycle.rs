//! Install and activation state machine.
//!
//! `Parsed -> Installing -> Waiting -> Activating -> Active`, with
//! `Installing -> Redundant` when the stores can't be opened. The state lock
//! is held for the whole of an install or an activation, so a force-activation
//! signal arriving mid-install only records its flag and the install finishes
//! the job.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ledcache_core::Error;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use crate::stores::{PopulationReport, PruneReport, StoreManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Parsed,
    Installing,
    /// Installed; an older instance may still control pages.
    Waiting,
    Activating,
    /// Controlling pages.
    Active,
    /// Install failed; this instance will never activate.
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Redundant => "redundant",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check if a state transition is valid.
pub fn is_valid_transition(from: LifecycleState, to: LifecycleState) -> bool {
    use LifecycleState::*;
    matches!(
        (from, to),
        (Parsed, Installing)
            | (Installing, Waiting)
            | (Installing, Redundant)
            | (Waiting, Activating)
            | (Activating, Active)
    )
}

fn transition(state: &mut MutexGuard<'_, LifecycleState>, to: LifecycleState) -> Result<(), Error> {
    let from = **state;
    if !is_valid_transition(from, to) {
        return Err(Error::InvalidTransition { from: from.to_string(), to: to.to_string() });
    }
    tracing::info!(%from, %to, "lifecycle transition");
    **state = to;
    Ok(())
}

pub struct LifecycleController {
    stores: Arc<StoreManager>,
    state: Mutex<LifecycleState>,
    /// Activate as soon as install finishes, without a message.
    skip_waiting_configured: bool,
    /// A `SKIP_WAITING` message has arrived.
    skip_waiting_received: AtomicBool,
    clients_claimed: AtomicBool,
}

impl LifecycleController {
    /// `skip_waiting_on_install` activates right after install without
    /// waiting for a message.
    pub fn new(stores: Arc<StoreManager>, skip_waiting_on_install: bool) -> Self {
        Self {
            stores,
            state: Mutex::new(LifecycleState::Parsed),
            skip_waiting_configured: skip_waiting_on_install,
            skip_waiting_received: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    pub fn skip_waiting_configured(&self) -> bool {
        self.skip_waiting_configured
    }

    pub fn skip_waiting_received(&self) -> bool {
        self.skip_waiting_received.load(Ordering::SeqCst)
    }

    /// Either source of force-activation.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting_configured || self.skip_waiting_received()
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    /// Open and populate the stores, then wait, or activate straight away if
    /// the skip-waiting flag is set by then.
    pub async fn install(&self) -> Result<PopulationReport, Error> {
        let report = {
            let mut state = self.state.lock().await;
            transition(&mut state, LifecycleState::Installing)?;

            match self.stores.ensure_stores().await {
                Ok(report) => {
                    transition(&mut state, LifecycleState::Waiting)?;
                    report
                }
                Err(e) => {
                    tracing::error!(error = %e, "install failed");
                    transition(&mut state, LifecycleState::Redundant)?;
                    return Err(e);
                }
            }
        };

        if self.skip_waiting_requested() {
            self.activate_if_waiting().await?;
        }
        Ok(report)
    }

    /// Prune stale stores and take control of pages.
    ///
    /// Errors unless the controller is Waiting.
    pub async fn activate(&self) -> Result<PruneReport, Error> {
        let mut state = self.state.lock().await;
        self.activate_locked(&mut state).await
    }

    /// Force activation. Takes effect now if Waiting; in any other state it
    /// only records the flag. Returns whether this call activated.
    pub async fn skip_waiting(&self) -> Result<bool, Error> {
        self.skip_waiting_received.store(true, Ordering::SeqCst);
        Ok(self.activate_if_waiting().await?.is_some())
    }

    /// Every page of the previous instance has closed. Returns whether this
    /// call activated.
    pub async fn clients_released(&self) -> Result<bool, Error> {
        Ok(self.activate_if_waiting().await?.is_some())
    }

    async fn activate_if_waiting(&self) -> Result<Option<PruneReport>, Error> {
        let mut state = self.state.lock().await;
        if *state != LifecycleState::Waiting {
            tracing::debug!(state = %*state, "not waiting, activation deferred");
            return Ok(None);
        }
        self.activate_locked(&mut state).await.map(Some)
    }

    async fn activate_locked(&self, state: &mut MutexGuard<'_, LifecycleState>) -> Result<PruneReport, Error> {
        transition(state, LifecycleState::Activating)?;

        let whitelist = self.stores.names().whitelist();
        let report = match self.stores.prune_stores(&whitelist).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "could not list stores, skipping cleanup");
                PruneReport::default()
            }
        };

        transition(state, LifecycleState::Active)?;
        self.clients_claimed.store(true, Ordering::SeqCst);
        tracing::info!(deleted = report.deleted.len(), "activated, clients claimed");
        Ok(report)
    }
}
