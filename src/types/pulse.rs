//! Pulse: the short-lived, typed event object exchanged between actors
//!
//! A Pulse is caller-owned. Fields arrive as the caller built them, so
//! origin/target/intent may be absent or unrecognized until the governance
//! gate has ruled on the pulse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    HALF_LIFE_CREATE_HOURS, HALF_LIFE_GOVERN_HOURS, HALF_LIFE_QUERY_HOURS,
    HALF_LIFE_REFLECT_HOURS, HALF_LIFE_UPDATE_HOURS,
};

// Actor vocabulary recognized by the rule set
pub const ACTOR_MIRROR: &str = "mirror";
pub const ACTOR_CORE: &str = "core";
pub const ACTOR_SYSTEM: &str = "system";
pub const ACTOR_SAGE: &str = "sage";

/// The closed set of pulse intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Query,
    Update,
    Create,
    Govern,
    Reflect,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::Query,
        Intent::Update,
        Intent::Create,
        Intent::Govern,
        Intent::Reflect,
    ];

    /// Parse a raw intent string; anything outside the closed set is None
    pub fn parse(s: &str) -> Option<Intent> {
        match s {
            "query" => Some(Intent::Query),
            "update" => Some(Intent::Update),
            "create" => Some(Intent::Create),
            "govern" => Some(Intent::Govern),
            "reflect" => Some(Intent::Reflect),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Query => "query",
            Intent::Update => "update",
            Intent::Create => "create",
            Intent::Govern => "govern",
            Intent::Reflect => "reflect",
        }
    }

    /// Fixed half-life table: how many hours until coherence halves
    pub fn half_life_hours(&self) -> f64 {
        match self {
            Intent::Query => HALF_LIFE_QUERY_HOURS,
            Intent::Update => HALF_LIFE_UPDATE_HOURS,
            Intent::Create => HALF_LIFE_CREATE_HOURS,
            Intent::Govern => HALF_LIFE_GOVERN_HOURS,
            Intent::Reflect => HALF_LIFE_REFLECT_HOURS,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle states of a pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PulseStatus {
    /// Live, coherence above the decay threshold
    Active,
    /// Coherence dropped below threshold; never re-promoted
    Decayed,
    /// Explicitly ended by the caller
    Terminated,
}

impl Default for PulseStatus {
    fn default() -> Self {
        PulseStatus::Active
    }
}

impl PulseStatus {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            PulseStatus::Active => "\x1b[32m",     // Green
            PulseStatus::Decayed => "\x1b[33m",    // Orange/Yellow
            PulseStatus::Terminated => "\x1b[90m", // Gray
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for status
    pub fn emoji(&self) -> &'static str {
        match self {
            PulseStatus::Active => "🟢",
            PulseStatus::Decayed => "🟡",
            PulseStatus::Terminated => "⚫",
        }
    }
}

impl std::fmt::Display for PulseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PulseStatus::Active => "ACTIVE",
            PulseStatus::Decayed => "DECAYED",
            PulseStatus::Terminated => "TERMINATED",
        };
        write!(f, "{}", name)
    }
}

/// A pulse as constructed by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pulse {
    /// Opaque unique identifier
    pub id: String,
    /// Originating actor (e.g., "mirror", "core")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Receiving actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Raw intent string, parsed against the closed Intent set at validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Arbitrary structured data
    #[serde(default)]
    pub payload: Value,
    /// Coherence in [0,1] at creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coherence: Option<f64>,
    /// Creation instant
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Lifecycle state as the caller last saw it
    #[serde(default)]
    pub status: PulseStatus,
}

impl Pulse {
    /// Create a pulse with full coherence and an empty payload
    pub fn new(
        id: impl Into<String>,
        origin: impl Into<String>,
        target: impl Into<String>,
        intent: Intent,
    ) -> Self {
        Self {
            id: id.into(),
            origin: Some(origin.into()),
            target: Some(target.into()),
            intent: Some(intent.as_str().to_string()),
            payload: Value::Null,
            coherence: Some(1.0),
            timestamp: Utc::now(),
            status: PulseStatus::Active,
        }
    }

    pub fn with_coherence(mut self, coherence: f64) -> Self {
        self.coherence = Some(coherence);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// The intent as a member of the closed set, if it parses
    pub fn parsed_intent(&self) -> Option<Intent> {
        self.intent.as_deref().and_then(Intent::parse)
    }
}

// =============================================================================
// TESTS
// =============================================================================
