//! Governance gate: structural validation + rule matching + audit trail
//!
//! Hard checks run in a fixed order and the first failure wins; structural
//! rejections return before the audit stage. Rule selection is an explicit
//! precedence chain over the closed matcher set, first match wins, and every
//! rule decision is appended to a bounded audit log.

use std::collections::VecDeque;

use chrono::Utc;

use crate::types::{
    default_rules, AuditEntry, GovernanceRule, Intent, Pulse, RuleAction, RuleMatcher, Verdict,
    VALIDATION_ERROR_RULE_ID,
};
use crate::{MAX_AUDIT_ENTRIES, MAX_PAYLOAD_BYTES};

/// Fixed rule precedence for validation. AuthenticatedUser is deliberately
/// absent: that rule is reachable only via administrative lookup.
const PRECEDENCE: [RuleMatcher; 4] = [
    RuleMatcher::MirrorToCore,
    RuleMatcher::CoreToMirror,
    RuleMatcher::SystemGovernance,
    RuleMatcher::Default,
];

/// Governance middleware. Owns the rule table and the audit log; stateless
/// per validate call except for the log append.
#[derive(Debug)]
pub struct GovernanceGate {
    rules: Vec<GovernanceRule>,
    log: VecDeque<AuditEntry>,
}

impl Default for GovernanceGate {
    fn default() -> Self {
        Self::new()
    }
}

impl GovernanceGate {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            log: VecDeque::new(),
        }
    }

    /// Validate a candidate pulse. Never fails as an operation: rejections
    /// are normal verdict values carrying the reason.
    pub fn validate(&mut self, pulse: &Pulse) -> Verdict {
        match self.evaluate(pulse) {
            // Only verdicts that survived the hard checks reach the log
            Ok(verdict) => {
                self.record(pulse, &verdict);
                verdict
            }
            Err(verdict) => verdict,
        }
    }

    /// Err is a hard-check rejection (returned immediately, unaudited);
    /// Ok is a rule decision.
    fn evaluate(&self, pulse: &Pulse) -> Result<Verdict, Verdict> {
        // Hard checks, first failure wins
        let Some(origin) = present(&pulse.origin) else {
            return Err(Verdict::denied(VALIDATION_ERROR_RULE_ID, "origin is required"));
        };
        let Some(target) = present(&pulse.target) else {
            return Err(Verdict::denied(VALIDATION_ERROR_RULE_ID, "target is required"));
        };
        let Some(raw_intent) = present(&pulse.intent) else {
            return Err(Verdict::denied(VALIDATION_ERROR_RULE_ID, "intent is required"));
        };
        let Some(intent) = Intent::parse(raw_intent) else {
            return Err(Verdict::denied(
                VALIDATION_ERROR_RULE_ID,
                format!("invalid intent: {}", raw_intent),
            ));
        };
        if let Some(coherence) = pulse.coherence {
            if !(0.0..=1.0).contains(&coherence) {
                return Err(Verdict::denied(
                    VALIDATION_ERROR_RULE_ID,
                    "coherence must be between 0 and 1",
                ));
            }
        }

        // Soft check: oversized payloads warn but pass
        let mut warnings = Vec::new();
        if payload_size(pulse) > MAX_PAYLOAD_BYTES {
            warnings.push("payload exceeds recommended size".to_string());
        }

        Ok(match self.select_rule(origin, target, intent) {
            Some(rule) => {
                let approved = rule.action == RuleAction::Allow;
                let message = if approved {
                    format!("Approved by {}", rule.name)
                } else {
                    format!("Denied by {}", rule.name)
                };
                Verdict {
                    timestamp: Utc::now(),
                    approved,
                    rule_id: rule.rule_id.clone(),
                    message,
                    warnings,
                }
            }
            // Only possible if administration replaced the default rule's
            // matcher; past the hard checks, so it is audited
            None => {
                let mut verdict =
                    Verdict::denied(VALIDATION_ERROR_RULE_ID, "no matching rule registered");
                verdict.warnings = warnings;
                verdict
            }
        })
    }

    fn select_rule(&self, origin: &str, target: &str, intent: Intent) -> Option<&GovernanceRule> {
        PRECEDENCE
            .iter()
            .find(|m| m.matches(origin, target, intent))
            .and_then(|m| self.rules.iter().find(|r| r.matcher == *m))
    }

    fn record(&mut self, pulse: &Pulse, verdict: &Verdict) {
        self.log.push_back(AuditEntry {
            timestamp: verdict.timestamp,
            pulse_id: pulse.id.clone(),
            approved: verdict.approved,
            rule_id: verdict.rule_id.clone(),
            message: verdict.message.clone(),
        });
        while self.log.len() > MAX_AUDIT_ENTRIES {
            self.log.pop_front();
        }
    }

    /// Look up one rule by id (administrative; also the only path to
    /// "Authenticated User Access")
    pub fn rule(&self, rule_id: &str) -> Option<GovernanceRule> {
        self.rules.iter().find(|r| r.rule_id == rule_id).cloned()
    }

    /// All registered rules
    pub fn all_rules(&self) -> Vec<GovernanceRule> {
        self.rules.clone()
    }

    /// Insert or overwrite a rule by id. No well-formedness validation;
    /// effective immediately for subsequent validate calls.
    pub fn set_rule(&mut self, rule: GovernanceRule) {
        match self.rules.iter_mut().find(|r| r.rule_id == rule.rule_id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Copy of the audit log, oldest first
    pub fn validation_log(&self) -> Vec<AuditEntry> {
        self.log.iter().cloned().collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn payload_size(pulse: &Pulse) -> usize {
    serde_json::to_vec(&pulse.payload).map(|v| v.len()).unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================
