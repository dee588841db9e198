//! Decay tracker: continuous coherence decay + lifecycle state machine
//!
//! State transitions:
//! - ACTIVE → DECAYED: recomputed coherence drops below the decay threshold
//! - ACTIVE/DECAYED → TERMINATED: explicit, caller-driven, idempotent
//!
//! DECAYED is one-way; a pulse is never re-promoted to ACTIVE. Decay is
//! always recomputed from initial coherence and absolute age, never stepped,
//! so repeated updates at a fixed instant are idempotent.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Pulse, PulseMetrics, PulseStatus};
use crate::{ARCHIVE_MAX_AGE_HOURS, DECAY_THRESHOLD, DEFAULT_HALF_LIFE_HOURS, UPDATE_INTERVAL_SECS};

/// Tracker configuration, read at construction and mutable via set_config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Coherence below this moves an active pulse to DECAYED
    pub decay_threshold: f64,
    /// Half-life for unknown or absent intents (hours)
    pub default_half_life_hours: f64,
    /// Autonomous sweep period (seconds)
    pub update_interval_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            decay_threshold: DECAY_THRESHOLD,
            default_half_life_hours: DEFAULT_HALF_LIFE_HOURS,
            update_interval_secs: UPDATE_INTERVAL_SECS,
        }
    }
}

/// Partial configuration. Present fields overwrite, absent fields keep.
/// Values are merged as given; range checking is the caller's business.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfigPatch {
    pub decay_threshold: Option<f64>,
    pub default_half_life_hours: Option<f64>,
    pub update_interval_secs: Option<u64>,
}

/// Decayed coherence from absolute age: initial * e^(-λ * age_hours)
pub fn decayed_coherence(initial: f64, decay_factor: f64, age_hours: f64) -> f64 {
    initial * (-decay_factor * age_hours).exp()
}

/// Temporal decay tracker. Sole owner of the metrics records; reads return
/// snapshots, all mutation goes through update/terminate/archive.
#[derive(Debug)]
pub struct DecayTracker {
    records: HashMap<String, PulseMetrics>,
    config: TrackerConfig,
}

impl Default for DecayTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DecayTracker {
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            records: HashMap::new(),
            config,
        }
    }

    /// Register a pulse for decay tracking.
    ///
    /// λ is fixed here from the intent's half-life (default half-life for
    /// unknown or absent intents) and never changes afterwards. Tracking an
    /// id twice overwrites the earlier record; last write wins.
    pub fn track(&mut self, pulse: &Pulse) -> PulseMetrics {
        self.track_at(pulse, Utc::now())
    }

    /// track with an explicit clock, for deterministic callers
    pub fn track_at(&mut self, pulse: &Pulse, now: DateTime<Utc>) -> PulseMetrics {
        let half_life = pulse
            .parsed_intent()
            .map(|i| i.half_life_hours())
            .unwrap_or(self.config.default_half_life_hours);
        let decay_factor = std::f64::consts::LN_2 / half_life;
        let initial = pulse.coherence.unwrap_or(1.0);

        let metrics = PulseMetrics {
            pulse_id: pulse.id.clone(),
            created_at: pulse.timestamp,
            last_update: now,
            age_seconds: age_seconds(pulse.timestamp, now),
            decay_factor,
            initial_coherence: initial,
            current_coherence: initial,
            half_life_hours: half_life,
            status: PulseStatus::Active,
        };
        self.records.insert(pulse.id.clone(), metrics.clone());
        metrics
    }

    /// Recompute decay for one pulse. None if the id is unknown.
    pub fn update(&mut self, id: &str) -> Option<PulseMetrics> {
        self.update_at(id, Utc::now())
    }

    /// update with an explicit clock, for deterministic callers
    pub fn update_at(&mut self, id: &str, now: DateTime<Utc>) -> Option<PulseMetrics> {
        let threshold = self.config.decay_threshold;
        let record = self.records.get_mut(id)?;

        record.age_seconds = age_seconds(record.created_at, now);
        record.current_coherence = decayed_coherence(
            record.initial_coherence,
            record.decay_factor,
            record.age_seconds / 3600.0,
        );
        record.last_update = now;

        // One-way transition; DECAYED and TERMINATED pulses are left alone
        if record.status == PulseStatus::Active && record.current_coherence < threshold {
            record.status = PulseStatus::Decayed;
        }

        Some(record.clone())
    }

    /// Snapshot of one pulse's metrics
    pub fn metrics(&self, id: &str) -> Option<PulseMetrics> {
        self.records.get(id).cloned()
    }

    /// Snapshots of all tracked pulses
    pub fn all_metrics(&self) -> Vec<PulseMetrics> {
        self.records.values().cloned().collect()
    }

    /// Tracked pulses still ACTIVE
    pub fn active_pulses(&self) -> Vec<PulseMetrics> {
        self.by_status(PulseStatus::Active)
    }

    /// Tracked pulses that have DECAYED
    pub fn decayed_pulses(&self) -> Vec<PulseMetrics> {
        self.by_status(PulseStatus::Decayed)
    }

    fn by_status(&self, status: PulseStatus) -> Vec<PulseMetrics> {
        self.records
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    /// Force TERMINATED. Idempotent; unknown ids are a no-op.
    pub fn terminate(&mut self, id: &str) {
        self.terminate_at(id, Utc::now())
    }

    /// terminate with an explicit clock
    pub fn terminate_at(&mut self, id: &str, now: DateTime<Utc>) {
        if let Some(record) = self.records.get_mut(id) {
            record.status = PulseStatus::Terminated;
            record.last_update = now;
        }
    }

    /// Physically remove every record older than max_age_hours, regardless
    /// of status. Returns the number removed.
    pub fn archive_old_pulses(&mut self, max_age_hours: f64) -> usize {
        self.archive_old_pulses_at(max_age_hours, Utc::now())
    }

    /// archive with an explicit clock
    pub fn archive_old_pulses_at(&mut self, max_age_hours: f64, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, r| age_seconds(r.created_at, now) / 3600.0 <= max_age_hours);
        before - self.records.len()
    }

    /// One sweep pass: recompute every tracked pulse, then evict records
    /// past the archive horizon. Returns the number archived.
    pub fn sweep_at(&mut self, now: DateTime<Utc>) -> usize {
        let ids: Vec<String> = self.records.keys().cloned().collect();
        for id in &ids {
            self.update_at(id, now);
        }
        self.archive_old_pulses_at(ARCHIVE_MAX_AGE_HOURS, now)
    }

    /// Merge a partial configuration
    pub fn set_config(&mut self, patch: TrackerConfigPatch) {
        if let Some(v) = patch.decay_threshold {
            self.config.decay_threshold = v;
        }
        if let Some(v) = patch.default_half_life_hours {
            self.config.default_half_life_hours = v;
        }
        if let Some(v) = patch.update_interval_secs {
            self.config.update_interval_secs = v;
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Drop all records
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn age_seconds(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - created_at).num_milliseconds() as f64 / 1000.0
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Intent;
    use chrono::Duration;

    fn pulse(id: &str, intent: Intent, coherence: f64) -> Pulse {
        Pulse::new(id, "mirror", "core", intent).with_coherence(coherence)
    }

    fn hours(h: f64) -> Duration {
        Duration::milliseconds((h * 3_600_000.0) as i64)
    }

    #[test]
    fn test_track_captures_initial_state() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Query, 0.8);
        let m = tracker.track_at(&p, p.timestamp);

        assert_eq!(m.initial_coherence, 0.8);
        assert_eq!(m.current_coherence, 0.8);
        assert_eq!(m.half_life_hours, 12.0);
        assert_eq!(m.status, PulseStatus::Active);
    }

    #[test]
    fn test_decay_factor_from_intent() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Reflect, 1.0);
        let m = tracker.track_at(&p, p.timestamp);
        assert!((m.decay_factor - std::f64::consts::LN_2 / 168.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_intent_uses_default_half_life() {
        let mut tracker = DecayTracker::new();
        let mut p = pulse("p1", Intent::Query, 1.0);
        p.intent = Some("transmit".to_string());
        let m = tracker.track_at(&p, p.timestamp);
        assert_eq!(m.half_life_hours, 24.0);

        p.intent = None;
        let m = tracker.track_at(&p, p.timestamp);
        assert_eq!(m.half_life_hours, 24.0);
    }

    #[test]
    fn test_missing_coherence_defaults_to_full() {
        let mut tracker = DecayTracker::new();
        let mut p = pulse("p1", Intent::Update, 0.5);
        p.coherence = None;
        let m = tracker.track_at(&p, p.timestamp);
        assert_eq!(m.initial_coherence, 1.0);
    }

    #[test]
    fn test_coherence_exact_at_age_zero() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Update, 0.7);
        tracker.track_at(&p, p.timestamp);
        let m = tracker.update_at("p1", p.timestamp).unwrap();
        assert_eq!(m.current_coherence, 0.7);
        assert_eq!(m.age_seconds, 0.0);
    }

    #[test]
    fn test_half_life_halves_coherence_for_every_intent() {
        for intent in Intent::ALL {
            let mut tracker = DecayTracker::new();
            let p = pulse("p1", intent, 1.0);
            tracker.track_at(&p, p.timestamp);

            let at_half_life = p.timestamp + hours(intent.half_life_hours());
            let m = tracker.update_at("p1", at_half_life).unwrap();
            assert!(
                (m.current_coherence - 0.5).abs() < 1e-6,
                "{} at t½ gave {}",
                intent,
                m.current_coherence
            );
        }
    }

    #[test]
    fn test_decay_monotonically_non_increasing() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Create, 0.9);
        tracker.track_at(&p, p.timestamp);

        let mut previous = 0.9;
        for h in 1..=200 {
            let m = tracker.update_at("p1", p.timestamp + hours(h as f64)).unwrap();
            assert!(m.current_coherence <= previous);
            previous = m.current_coherence;
        }
    }

    #[test]
    fn test_repeated_update_at_fixed_now_is_idempotent() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Update, 1.0);
        tracker.track_at(&p, p.timestamp);

        let now = p.timestamp + hours(10.0);
        let first = tracker.update_at("p1", now).unwrap();
        let second = tracker.update_at("p1", now).unwrap();
        assert_eq!(first.current_coherence, second.current_coherence);
        assert_eq!(first.age_seconds, second.age_seconds);
    }

    #[test]
    fn test_active_transitions_to_decayed_below_threshold() {
        let mut tracker = DecayTracker::new();
        // Query half-life 12h; 1.0 * e^(-λ*24) = 0.25 < 0.3
        let p = pulse("p1", Intent::Query, 1.0);
        tracker.track_at(&p, p.timestamp);

        let m = tracker.update_at("p1", p.timestamp + hours(12.0)).unwrap();
        assert_eq!(m.status, PulseStatus::Active);

        let m = tracker.update_at("p1", p.timestamp + hours(24.0)).unwrap();
        assert_eq!(m.status, PulseStatus::Decayed);

        // Never re-promoted
        let m = tracker.update_at("p1", p.timestamp + hours(25.0)).unwrap();
        assert_eq!(m.status, PulseStatus::Decayed);
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Update, 1.0);
        tracker.track_at(&p, p.timestamp);

        let t1 = p.timestamp + hours(1.0);
        let t2 = p.timestamp + hours(2.0);
        tracker.terminate_at("p1", t1);
        let m = tracker.metrics("p1").unwrap();
        assert_eq!(m.status, PulseStatus::Terminated);
        assert_eq!(m.last_update, t1);

        tracker.terminate_at("p1", t2);
        let m = tracker.metrics("p1").unwrap();
        assert_eq!(m.status, PulseStatus::Terminated);
        assert_eq!(m.last_update, t2);
    }

    #[test]
    fn test_terminate_unknown_id_is_noop() {
        let mut tracker = DecayTracker::new();
        tracker.terminate("ghost");
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_update_unknown_id_returns_none() {
        let mut tracker = DecayTracker::new();
        assert!(tracker.update("ghost").is_none());
    }

    #[test]
    fn test_archive_removes_only_old_records() {
        let mut tracker = DecayTracker::new();
        let old = pulse("old", Intent::Update, 1.0);
        tracker.track_at(&old, old.timestamp);

        let mut young = pulse("young", Intent::Update, 1.0);
        young.timestamp = old.timestamp + hours(150.0);
        tracker.track_at(&young, young.timestamp);

        let now = old.timestamp + hours(169.0);
        let removed = tracker.archive_old_pulses_at(168.0, now);
        assert_eq!(removed, 1);
        assert!(tracker.metrics("old").is_none());
        assert!(tracker.metrics("young").is_some());
    }

    #[test]
    fn test_archive_evicts_regardless_of_status() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Reflect, 1.0);
        tracker.track_at(&p, p.timestamp);
        // Still ACTIVE (reflect half-life is 168h), old enough to archive
        let now = p.timestamp + hours(169.0);
        assert_eq!(tracker.archive_old_pulses_at(168.0, now), 1);
    }

    #[test]
    fn test_archive_with_infinite_horizon_removes_nothing() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Update, 1.0);
        tracker.track_at(&p, p.timestamp);
        let now = p.timestamp + hours(10_000.0);
        assert_eq!(tracker.archive_old_pulses_at(f64::INFINITY, now), 0);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_sweep_updates_then_archives() {
        let mut tracker = DecayTracker::new();
        let fresh = pulse("fresh", Intent::Query, 1.0);
        tracker.track_at(&fresh, fresh.timestamp);

        let mut stale = pulse("stale", Intent::Update, 1.0);
        stale.timestamp = fresh.timestamp - hours(200.0);
        tracker.track_at(&stale, stale.timestamp);

        let now = fresh.timestamp + hours(24.0);
        let archived = tracker.sweep_at(now);
        assert_eq!(archived, 1);
        // The survivor was recomputed during the sweep
        let m = tracker.metrics("fresh").unwrap();
        assert_eq!(m.status, PulseStatus::Decayed);
        assert_eq!(m.last_update, now);
    }

    #[test]
    fn test_double_track_overwrites() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Update, 0.4);
        tracker.track_at(&p, p.timestamp);
        let p2 = pulse("p1", Intent::Query, 0.9);
        tracker.track_at(&p2, p2.timestamp);

        let m = tracker.metrics("p1").unwrap();
        assert_eq!(m.initial_coherence, 0.9);
        assert_eq!(m.half_life_hours, 12.0);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_set_config_merges_partial() {
        let mut tracker = DecayTracker::new();
        tracker.set_config(TrackerConfigPatch {
            decay_threshold: Some(0.5),
            ..Default::default()
        });
        assert_eq!(tracker.config().decay_threshold, 0.5);
        assert_eq!(tracker.config().default_half_life_hours, 24.0);
        assert_eq!(tracker.config().update_interval_secs, 60);
    }

    #[test]
    fn test_reads_return_snapshots() {
        let mut tracker = DecayTracker::new();
        let p = pulse("p1", Intent::Update, 1.0);
        tracker.track_at(&p, p.timestamp);

        let mut snapshot = tracker.metrics("p1").unwrap();
        snapshot.status = PulseStatus::Terminated;
        snapshot.current_coherence = 0.0;

        // Internal record unaffected by mutating the snapshot
        let fresh = tracker.metrics("p1").unwrap();
        assert_eq!(fresh.status, PulseStatus::Active);
        assert_eq!(fresh.current_coherence, 1.0);
    }

    #[test]
    fn test_active_and_decayed_partitions() {
        let mut tracker = DecayTracker::new();
        let a = pulse("a", Intent::Query, 1.0);
        let b = pulse("b", Intent::Reflect, 1.0);
        tracker.track_at(&a, a.timestamp);
        tracker.track_at(&b, a.timestamp);

        // 48h kills the query pulse, reflect barely moves
        let now = a.timestamp + hours(48.0);
        tracker.update_at("a", now);
        tracker.update_at("b", now);

        assert_eq!(tracker.active_pulses().len(), 1);
        assert_eq!(tracker.decayed_pulses().len(), 1);
        assert_eq!(tracker.active_pulses()[0].pulse_id, "b");
    }
}
