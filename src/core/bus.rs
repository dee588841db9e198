//! PulseBus: in-process topic pub/sub for pulses
//!
//! The bus is the caller that sits between the two engines: every emit is
//! validated by the governance gate, and approved pulses are registered
//! with the decay tracker before delivery. The engines never call each
//! other; the bus invokes both around the same transmission event.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};

use crate::core::decay::DecayTracker;
use crate::core::governance::GovernanceGate;
use crate::types::{Pulse, Verdict};
use crate::MAX_BUS_HISTORY;

/// Per-topic channel capacity; slow subscribers lag, they never block emit
const TOPIC_CAPACITY: usize = 100;

/// What happened to one emitted pulse
#[derive(Debug, Clone)]
pub struct EmitOutcome {
    pub verdict: Verdict,
    /// Subscribers the pulse was delivered to (0 when denied or unheard)
    pub delivered: usize,
}

/// One line of the bounded emit history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    pub pulse_id: String,
    pub approved: bool,
    pub rule_id: String,
}

/// Topic-based pulse bus
#[derive(Debug)]
pub struct PulseBus {
    gate: Arc<Mutex<GovernanceGate>>,
    tracker: Arc<Mutex<DecayTracker>>,
    topics: HashMap<String, broadcast::Sender<Pulse>>,
    history: VecDeque<BusEvent>,
}

impl PulseBus {
    pub fn new(gate: Arc<Mutex<GovernanceGate>>, tracker: Arc<Mutex<DecayTracker>>) -> Self {
        Self {
            gate,
            tracker,
            topics: HashMap::new(),
            history: VecDeque::new(),
        }
    }

    /// Subscribe to a topic, creating it on first use
    pub fn subscribe(&mut self, topic: &str) -> broadcast::Receiver<Pulse> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Validate, register, and deliver a pulse on a topic.
    ///
    /// Denied pulses are recorded in history but neither tracked nor
    /// delivered.
    pub async fn emit(&mut self, topic: &str, pulse: Pulse) -> EmitOutcome {
        let verdict = self.gate.lock().await.validate(&pulse);

        let mut delivered = 0;
        if verdict.approved {
            self.tracker.lock().await.track(&pulse);
            if let Some(tx) = self.topics.get(topic) {
                delivered = tx.send(pulse.clone()).unwrap_or(0);
            }
        }

        self.history.push_back(BusEvent {
            timestamp: verdict.timestamp,
            topic: topic.to_string(),
            pulse_id: pulse.id.clone(),
            approved: verdict.approved,
            rule_id: verdict.rule_id.clone(),
        });
        while self.history.len() > MAX_BUS_HISTORY {
            self.history.pop_front();
        }

        EmitOutcome { verdict, delivered }
    }

    /// Emit history, optionally filtered by topic, most recent last
    pub fn history(&self, topic: Option<&str>, limit: usize) -> Vec<BusEvent> {
        let events: Vec<BusEvent> = self
            .history
            .iter()
            .filter(|e| topic.map(|t| e.topic == t).unwrap_or(true))
            .cloned()
            .collect();
        let skip = events.len().saturating_sub(limit);
        events.into_iter().skip(skip).collect()
    }

    /// All topics with at least one subscription so far
    pub fn topics(&self) -> Vec<String> {
        self.topics.keys().cloned().collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
