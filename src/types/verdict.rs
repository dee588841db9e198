//! Validation verdicts and the audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of validating one candidate pulse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Timestamp of the decision
    pub timestamp: DateTime<Utc>,
    /// Whether the pulse may be transmitted
    pub approved: bool,
    /// Rule that decided, or the validation-error sentinel
    pub rule_id: String,
    /// Human-readable reason
    pub message: String,
    /// Soft-check warnings; never block transmission
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Verdict {
    /// Structural rejection (hard check failed before rule matching)
    pub fn denied(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            approved: false,
            rule_id: rule_id.into(),
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let (color, mark) = if self.approved {
            ("\x1b[32m", "✔")
        } else {
            ("\x1b[31m", "✘")
        };
        let mut line = format!(
            "{}{} {} | rule={}{}",
            color, mark, self.message, self.rule_id, "\x1b[0m"
        );
        for warning in &self.warnings {
            line.push_str(&format!("\n\x1b[33m⚠ {}\x1b[0m", warning));
        }
        line
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "approved={} | rule={} | message={}",
            self.approved, self.rule_id, self.message
        )
    }
}

/// One line of the bounded audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub pulse_id: String,
    pub approved: bool,
    pub rule_id: String,
    pub message: String,
}
