//! DecayService: shared tracker + autonomous periodic sweep
//!
//! The sweep is a cancellable tokio task owned by the service lifecycle:
//! started by initialize, stopped by stop_decay_updates or drop. Changing
//! the sweep interval always cancels the running task before starting the
//! replacement, so two sweeps never run concurrently.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::decay::{DecayTracker, TrackerConfig, TrackerConfigPatch};
use crate::types::{Pulse, PulseMetrics};

/// Decay tracker wrapped for concurrent access, with the autonomous sweep
#[derive(Debug)]
pub struct DecayService {
    tracker: Arc<Mutex<DecayTracker>>,
    sweep: Option<JoinHandle<()>>,
}

impl Default for DecayService {
    fn default() -> Self {
        Self::new()
    }
}

impl DecayService {
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(DecayTracker::with_config(config))),
            sweep: None,
        }
    }

    /// Start the autonomous sweep at the configured interval
    pub async fn initialize(&mut self) {
        self.start_sweep().await;
    }

    async fn start_sweep(&mut self) {
        // Cancel-then-restart; never two sweeps
        self.stop_decay_updates();

        let secs = self.tracker.lock().await.config().update_interval_secs;
        let tracker = Arc::clone(&self.tracker);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(secs.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately; swallow the first tick so the
            // first sweep happens one full period after start
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tracker.lock().await.sweep_at(Utc::now());
            }
        });
        self.sweep = Some(handle);
    }

    /// Cancel the autonomous sweep. Safe to call when not running.
    pub fn stop_decay_updates(&mut self) {
        if let Some(handle) = self.sweep.take() {
            handle.abort();
        }
    }

    /// Whether a sweep task is currently running
    pub fn is_sweeping(&self) -> bool {
        self.sweep.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Merge a partial configuration. If the sweep interval changed while a
    /// sweep is running, the task is cancelled and restarted with the new
    /// period.
    pub async fn set_config(&mut self, patch: TrackerConfigPatch) {
        let interval_changed = {
            let mut tracker = self.tracker.lock().await;
            let old = tracker.config().update_interval_secs;
            tracker.set_config(patch);
            tracker.config().update_interval_secs != old
        };
        if interval_changed && self.is_sweeping() {
            self.start_sweep().await;
        }
    }

    pub async fn config(&self) -> TrackerConfig {
        self.tracker.lock().await.config().clone()
    }

    // Tracker operations, delegated under the lock

    pub async fn track(&self, pulse: &Pulse) -> PulseMetrics {
        self.tracker.lock().await.track(pulse)
    }

    pub async fn update(&self, id: &str) -> Option<PulseMetrics> {
        self.tracker.lock().await.update(id)
    }

    pub async fn metrics(&self, id: &str) -> Option<PulseMetrics> {
        self.tracker.lock().await.metrics(id)
    }

    pub async fn all_metrics(&self) -> Vec<PulseMetrics> {
        self.tracker.lock().await.all_metrics()
    }

    pub async fn active_pulses(&self) -> Vec<PulseMetrics> {
        self.tracker.lock().await.active_pulses()
    }

    pub async fn decayed_pulses(&self) -> Vec<PulseMetrics> {
        self.tracker.lock().await.decayed_pulses()
    }

    pub async fn terminate(&self, id: &str) {
        self.tracker.lock().await.terminate(id)
    }

    pub async fn archive_old_pulses(&self, max_age_hours: f64) -> usize {
        self.tracker.lock().await.archive_old_pulses(max_age_hours)
    }

    pub async fn clear(&self) {
        self.tracker.lock().await.clear()
    }

    /// Shared handle to the underlying tracker, for callers that wire the
    /// tracker into their own plumbing (e.g., the pulse bus)
    pub fn tracker(&self) -> Arc<Mutex<DecayTracker>> {
        Arc::clone(&self.tracker)
    }
}

impl Drop for DecayService {
    fn drop(&mut self) {
        self.stop_decay_updates();
    }
}

// =============================================================================
// TESTS
// =============================================================================
