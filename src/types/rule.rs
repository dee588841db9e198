//! Governance rules: documentary data plus a closed matcher set
//!
//! A rule's `condition` and `constraints` strings describe intent for
//! display and audit. Matching is done by fixed code over the RuleMatcher
//! variants, never by interpreting the stored strings.

use serde::{Deserialize, Serialize};

use crate::types::{Intent, ACTOR_CORE, ACTOR_MIRROR, ACTOR_SAGE, ACTOR_SYSTEM};

/// Sentinel rule id for structural rejections (distinct from rule denials)
pub const VALIDATION_ERROR_RULE_ID: &str = "sage:validation_error";

/// What a matched rule does to the pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
    Warn,
}

/// The closed set of structural patterns a rule can match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMatcher {
    /// origin == mirror AND target == core
    MirrorToCore,
    /// origin == core AND target == mirror
    CoreToMirror,
    /// origin in {system, sage} AND intent in {govern, reflect}
    SystemGovernance,
    /// Never selected by validation precedence; administrative lookup only
    AuthenticatedUser,
    /// Matches everything
    Default,
}

impl RuleMatcher {
    /// Structural match over pulse fields. Called only after the hard checks,
    /// so origin/target/intent are known present and well-formed.
    pub fn matches(&self, origin: &str, target: &str, intent: Intent) -> bool {
        match self {
            RuleMatcher::MirrorToCore => origin == ACTOR_MIRROR && target == ACTOR_CORE,
            RuleMatcher::CoreToMirror => origin == ACTOR_CORE && target == ACTOR_MIRROR,
            RuleMatcher::SystemGovernance => {
                (origin == ACTOR_SYSTEM || origin == ACTOR_SAGE)
                    && matches!(intent, Intent::Govern | Intent::Reflect)
            }
            RuleMatcher::AuthenticatedUser => false,
            RuleMatcher::Default => true,
        }
    }
}

/// A governance rule, immutable once registered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceRule {
    pub rule_id: String,
    pub name: String,
    pub description: String,
    /// Human-readable predicate, documentation only
    pub condition: String,
    pub action: RuleAction,
    /// Documentary sub-conditions, evaluated by the fixed validation steps
    pub constraints: Vec<String>,
    /// Which structural pattern selects this rule
    pub matcher: RuleMatcher,
}

/// The built-in rule table
pub fn default_rules() -> Vec<GovernanceRule> {
    vec![
        // Registered but never selected by validation precedence; kept for
        // administrative lookup, as in the source rule table.
        GovernanceRule {
            rule_id: "sage:rule_001".to_string(),
            name: "Authenticated User Access".to_string(),
            description: "Grants transmission rights to authenticated user sessions".to_string(),
            condition: "session.authenticated == true".to_string(),
            action: RuleAction::Allow,
            constraints: vec!["session must carry a verified identity".to_string()],
            matcher: RuleMatcher::AuthenticatedUser,
        },
        GovernanceRule {
            rule_id: "sage:rule_002".to_string(),
            name: "System Governance".to_string(),
            description: "System and sage actors may govern and reflect".to_string(),
            condition: "origin in (system, sage) and intent in (govern, reflect)".to_string(),
            action: RuleAction::Allow,
            constraints: vec!["intent must be govern or reflect".to_string()],
            matcher: RuleMatcher::SystemGovernance,
        },
        GovernanceRule {
            rule_id: "sage:rule_003".to_string(),
            name: "Mirror to Core Communication".to_string(),
            description: "Mirror may transmit to core".to_string(),
            condition: "origin == mirror and target == core".to_string(),
            action: RuleAction::Allow,
            constraints: vec![
                "payload within recommended size".to_string(),
                "coherence within [0, 1]".to_string(),
            ],
            matcher: RuleMatcher::MirrorToCore,
        },
        GovernanceRule {
            rule_id: "sage:rule_004".to_string(),
            name: "Core to Mirror Response".to_string(),
            description: "Core may respond to mirror".to_string(),
            condition: "origin == core and target == mirror".to_string(),
            action: RuleAction::Allow,
            constraints: vec!["coherence within [0, 1]".to_string()],
            matcher: RuleMatcher::CoreToMirror,
        },
        GovernanceRule {
            rule_id: "sage:rule_005".to_string(),
            name: "Default Transmission".to_string(),
            description: "Anything not matched by a more specific rule".to_string(),
            condition: "true".to_string(),
            action: RuleAction::Allow,
            constraints: vec![],
            matcher: RuleMatcher::Default,
        },
    ]
}

// =============================================================================
// TESTS
// =============================================================================
