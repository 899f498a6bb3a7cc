//! Publishes progress snapshots to the local cache and the remote store, and
//! hydrates the engine from whichever holds the most trustworthy state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use tokio::task::JoinHandle;

use crate::challenges::{ProgressRecord, ProgressSnapshot};
use crate::errors::Result;
use crate::sync::{
    merge_snapshots, LocalProgressCache, RemoteProgressStore, PUBLISH_DEBOUNCE_WINDOW_MS,
};

/// UI-facing sync state. Observational only; never gates progression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub last_local_write_at: Option<DateTime<Utc>>,
    pub last_remote_write_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

struct PendingPublish {
    latest: Option<ProgressRecord>,
    timer: Option<JoinHandle<()>>,
}

/// State shared with the debounce timer task.
struct SyncShared {
    remote: Arc<dyn RemoteProgressStore>,
    user_id: String,
    pending: tokio::sync::Mutex<PendingPublish>,
    status: Mutex<SyncStatus>,
}

impl SyncShared {
    /// Send the pending record to the remote store, if any. On failure the
    /// record is put back (unless a newer one arrived meanwhile) so the next
    /// flush retries it.
    async fn flush_pending(self: &Arc<Self>) {
        let record = {
            let mut pending = self.pending.lock().await;
            pending.timer = None;
            pending.latest.take()
        };
        let Some(record) = record else {
            return;
        };

        match self.remote.write(&self.user_id, &record).await {
            Ok(()) => {
                debug!("Remote progress record written for user {}", self.user_id);
                let mut status = self.lock_status();
                status.last_remote_write_at = Some(Utc::now());
                status.last_error = None;
            }
            Err(err) => {
                warn!(
                    "Remote progress write failed for user {}; will retry on next publish: {}",
                    self.user_id, err
                );
                self.lock_status().last_error = Some(err.to_string());
                let mut pending = self.pending.lock().await;
                if pending.latest.is_none() {
                    pending.latest = Some(record);
                }
            }
        }
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, SyncStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Reconciles in-memory progress with the local cache and the remote store.
///
/// Local writes are immediate and never fail the caller's flow; remote writes
/// are debounced so a burst of GPS callbacks produces a single outgoing
/// write carrying the latest snapshot.
pub struct SyncCoordinator {
    cache: Arc<dyn LocalProgressCache>,
    cache_key: String,
    debounce_window: Duration,
    shared: Arc<SyncShared>,
}

impl SyncCoordinator {
    pub fn new(
        cache: Arc<dyn LocalProgressCache>,
        remote: Arc<dyn RemoteProgressStore>,
        user_id: impl Into<String>,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            cache,
            cache_key: format!("progress::{}", user_id),
            debounce_window: Duration::from_millis(PUBLISH_DEBOUNCE_WINDOW_MS),
            shared: Arc::new(SyncShared {
                remote,
                user_id,
                pending: tokio::sync::Mutex::new(PendingPublish {
                    latest: None,
                    timer: None,
                }),
                status: Mutex::new(SyncStatus::default()),
            }),
        }
    }

    /// Override the debounce window (tests, aggressive-battery profiles).
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Load the starting snapshot: the remote record is the cross-device
    /// source of truth, the local cache the offline fallback. When both
    /// exist they are merged so a restart mid-sync cannot regress progress.
    /// Store failures are logged and treated as absence; hydrate never fails.
    pub async fn hydrate(&self) -> ProgressSnapshot {
        let local = match self.cache.get(&self.cache_key) {
            Ok(record) => record,
            Err(err) => {
                warn!("Local cache read failed; ignoring cache: {}", err);
                None
            }
        };
        let remote = match self.shared.remote.read(&self.shared.user_id).await {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "Remote record unreachable for user {}; falling back to cache: {}",
                    self.shared.user_id, err
                );
                None
            }
        };

        match (remote, local) {
            (Some(remote), Some(local)) => {
                debug!("Hydrating from merged remote and local records");
                merge_snapshots(&remote.into_snapshot(), &local.into_snapshot())
            }
            (Some(remote), None) => remote.into_snapshot(),
            (None, Some(local)) => local.into_snapshot(),
            (None, None) => {
                debug!("No prior session found; starting fresh");
                ProgressSnapshot::default_session()
            }
        }
    }

    /// Persist an accepted transition. The local cache is written
    /// immediately; the remote write is scheduled after the debounce window,
    /// and a newer publish inside the window replaces the pending record and
    /// resets the timer (last write wins within the window).
    pub async fn publish(&self, snapshot: &ProgressSnapshot) {
        let record = ProgressRecord::from(snapshot);

        match self.cache.set(&self.cache_key, &record) {
            Ok(()) => {
                self.shared.lock_status().last_local_write_at = Some(Utc::now());
            }
            Err(err) => {
                // Session continues purely in memory; remote publish still runs.
                error!("Local cache write failed: {}", err);
                self.shared.lock_status().last_error = Some(err.to_string());
            }
        }

        let mut pending = self.shared.pending.lock().await;
        pending.latest = Some(record);
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
        let shared = Arc::clone(&self.shared);
        let window = self.debounce_window;
        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            shared.flush_pending().await;
        }));
    }

    /// Cancel the debounce timer and push any pending record now. Teardown
    /// path: no in-memory progress may be lost to the window.
    pub async fn flush(&self) {
        let timer = {
            let mut pending = self.shared.pending.lock().await;
            pending.timer.take()
        };
        if let Some(timer) = timer {
            timer.abort();
        }
        self.shared.flush_pending().await;
    }

    /// Wipe the local cache. Clears every cached record, not just this
    /// user's key.
    pub fn clear_local(&self) -> Result<()> {
        self.cache.clear()
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.lock_status().clone()
    }
}
