//! PulseMesh: lifecycle core for Pulse events
//!
//! Two engines around a shared Pulse shape:
//! - DecayTracker: continuous coherence decay + lifecycle state machine
//! - GovernanceGate: structural validation + rule matching + audit trail

pub mod core;
pub mod types;

// =============================================================================
// DECAY PARAMETERS
// =============================================================================

/// Coherence below this threshold moves an active pulse to DECAYED
pub const DECAY_THRESHOLD: f64 = 0.3;

/// Half-life for pulses with an unknown or absent intent (hours)
pub const DEFAULT_HALF_LIFE_HOURS: f64 = 24.0;

/// Autonomous sweep period (seconds)
pub const UPDATE_INTERVAL_SECS: u64 = 60;

/// Pulses older than this are physically evicted by the sweep (hours)
pub const ARCHIVE_MAX_AGE_HOURS: f64 = 168.0;

// =============================================================================
// INTENT HALF-LIVES (hours) - fixed at track time, immutable thereafter
// =============================================================================

pub const HALF_LIFE_QUERY_HOURS: f64 = 12.0;
pub const HALF_LIFE_UPDATE_HOURS: f64 = 24.0;
pub const HALF_LIFE_CREATE_HOURS: f64 = 48.0;
pub const HALF_LIFE_GOVERN_HOURS: f64 = 72.0;
pub const HALF_LIFE_REFLECT_HOURS: f64 = 168.0;

// =============================================================================
// GOVERNANCE BOUNDS
// =============================================================================

/// Audit log keeps the most recent N entries, oldest evicted first
pub const MAX_AUDIT_ENTRIES: usize = 1000;

/// Serialized payloads above this size draw a warning (soft check)
pub const MAX_PAYLOAD_BYTES: usize = 4096;

/// Bus keeps the most recent N emit records
pub const MAX_BUS_HISTORY: usize = 100;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.1.0";
