//! Temporal metrics for tracked pulses
//!
//! Metrics are value snapshots. The tracker hands out clones only; a
//! caller-held record never aliases the tracker's internal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::PulseStatus;

/// Snapshot of one pulse's temporal state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseMetrics {
    /// Id of the tracked pulse
    pub pulse_id: String,
    /// Creation instant (from the pulse itself)
    pub created_at: DateTime<Utc>,
    /// Last recompute or terminate
    pub last_update: DateTime<Utc>,
    /// Age at last_update, in seconds
    pub age_seconds: f64,
    /// Exponential decay rate λ = ln(2) / half_life, fixed at track time
    pub decay_factor: f64,
    /// Coherence captured at track time, immutable
    pub initial_coherence: f64,
    /// initial_coherence * e^(-λ * age_hours), recomputed on every update
    pub current_coherence: f64,
    /// Informational: hours until coherence halves
    pub half_life_hours: f64,
    /// Lifecycle state as tracked, independent of the caller's copy
    pub status: PulseStatus,
}

impl PulseMetrics {
    /// Age in hours (the unit of the decay exponent)
    pub fn age_hours(&self) -> f64 {
        self.age_seconds / 3600.0
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.status.color_code();
        let reset = PulseStatus::color_reset();
        let emoji = self.status.emoji();

        format!(
            "{}{} {} coherence={:.3} | status={} | age={:.1}h | t½={:.0}h{}",
            color,
            emoji,
            self.pulse_id,
            self.current_coherence,
            self.status,
            self.age_hours(),
            self.half_life_hours,
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "pulse={} | coherence={:.3} | status={} | age={:.1}h | half_life={:.0}h",
            self.pulse_id,
            self.current_coherence,
            self.status,
            self.age_hours(),
            self.half_life_hours
        )
    }
}
