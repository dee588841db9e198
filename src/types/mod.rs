//! Core types for PulseMesh

mod metrics;
mod pulse;
mod rule;
mod verdict;

pub use metrics::PulseMetrics;
pub use pulse::{Intent, Pulse, PulseStatus, ACTOR_CORE, ACTOR_MIRROR, ACTOR_SAGE, ACTOR_SYSTEM};
pub use rule::{default_rules, GovernanceRule, RuleAction, RuleMatcher, VALIDATION_ERROR_RULE_ID};
pub use verdict::{AuditEntry, Verdict};
