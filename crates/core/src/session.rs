//! Wires the engine to its collaborators for the lifetime of one session:
//! hydrate, subscribe to the sensor, pump samples, publish transitions, and
//! tear everything down without losing in-memory progress.

use std::sync::{Arc, Mutex};

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::challenges::{ProgressSnapshot, ProgressionEngine, StepSource};
use crate::errors::Result;
use crate::events::ProgressEventSink;
use crate::location::{GpsStepTracker, LocationSample, LocationSampleSource, LocationSubscription};
use crate::sync::SyncCoordinator;

/// One user's live play session.
///
/// The sensor callback only forwards samples into a channel; all counter
/// mutation happens on the pump task through the engine's critical section,
/// so sensor, user input, and network callbacks never interleave a
/// read-modify-write.
pub struct ProgressSession {
    engine: Arc<ProgressionEngine>,
    coordinator: Arc<SyncCoordinator>,
    subscription: Mutex<Option<Box<dyn LocationSubscription>>>,
    pump: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ProgressSession {
    /// Hydrate from the stores, build the engine, and start consuming the
    /// location stream.
    pub async fn begin(
        coordinator: Arc<SyncCoordinator>,
        source: &dyn LocationSampleSource,
        event_sink: Arc<dyn ProgressEventSink>,
    ) -> Result<Self> {
        let snapshot = coordinator.hydrate().await;
        debug!(
            "Session hydrated at level {} with {} gems",
            snapshot.active_level, snapshot.cumulative_gems
        );
        let engine = Arc::new(ProgressionEngine::from_snapshot(snapshot).with_event_sink(event_sink));

        let (tx, mut rx) = mpsc::unbounded_channel::<LocationSample>();
        let subscription = source.subscribe(Box::new(move |sample| {
            let _ = tx.send(sample);
        }))?;

        let pump_engine = Arc::clone(&engine);
        let pump_coordinator = Arc::clone(&coordinator);
        let pump = tokio::spawn(async move {
            let tracker = GpsStepTracker::new();
            while let Some(sample) = rx.recv().await {
                Self::ingest_sample(&tracker, &pump_engine, &pump_coordinator, &sample).await;
            }
        });

        Ok(Self {
            engine,
            coordinator,
            subscription: Mutex::new(Some(subscription)),
            pump: tokio::sync::Mutex::new(Some(pump)),
        })
    }

    async fn ingest_sample(
        tracker: &GpsStepTracker,
        engine: &ProgressionEngine,
        coordinator: &SyncCoordinator,
        sample: &LocationSample,
    ) {
        let steps = tracker.steps_from_sample_lossy(sample);
        if steps == 0 {
            return;
        }
        let level = engine.active_level();
        match engine.record_step_delta(level, StepSource::Gps, steps) {
            Ok(Some(snapshot)) => coordinator.publish(&snapshot).await,
            Ok(None) => {}
            Err(err) => warn!("GPS delta of {} rejected for level {}: {}", steps, level, err),
        }
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.engine.snapshot()
    }

    /// Add user-entered steps to the active challenge and publish.
    pub async fn record_manual_steps(&self, steps: i64) -> Result<ProgressSnapshot> {
        let level = self.engine.active_level();
        match self
            .engine
            .record_step_delta(level, StepSource::Manual, steps)?
        {
            Some(snapshot) => {
                self.coordinator.publish(&snapshot).await;
                Ok(snapshot)
            }
            // Rejected without side effects; nothing new to persist.
            None => Ok(self.engine.snapshot()),
        }
    }

    /// Claim a challenge's reward and publish the transition.
    pub async fn complete_challenge(&self, level: u32) -> Result<ProgressSnapshot> {
        let snapshot = self.engine.complete_challenge(level)?;
        self.coordinator.publish(&snapshot).await;
        Ok(snapshot)
    }

    /// End the session: release the sensor subscription, stop the pump, and
    /// flush the pending debounced publish so no progress stays in memory.
    pub async fn shutdown(&self) {
        if let Some(mut subscription) = self
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            subscription.unsubscribe();
        }
        if let Some(pump) = self.pump.lock().await.take() {
            pump.abort();
        }
        self.coordinator.flush().await;
        debug!("Session shut down");
    }
}
