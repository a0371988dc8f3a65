//! Where escalated conversations are routed.

use serde::{Deserialize, Serialize};

use crate::domain::EscalationTarget;

const DEFAULT_HOTLINE: &str = "+91-9152987821";
const DEFAULT_COUNSELOR: &str = "counselor@college.edu";
const DEFAULT_EMERGENCY: &str = "112";

/// Contact points for each escalation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationContacts {
    /// 24/7 crisis hotline.
    pub hotline: String,
    /// Counseling service, office hours.
    pub counselor: String,
    /// Emergency services number.
    pub emergency: String,
}

impl Default for EscalationContacts {
    fn default() -> Self {
        Self {
            hotline: DEFAULT_HOTLINE.to_string(),
            counselor: DEFAULT_COUNSELOR.to_string(),
            emergency: DEFAULT_EMERGENCY.to_string(),
        }
    }
}

impl EscalationContacts {
    /// Defaults overridden by `TRIAGE_CRISIS_HOTLINE`, `TRIAGE_COUNSELOR_CONTACT`
    /// and `TRIAGE_EMERGENCY_CONTACT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            hotline: std::env::var("TRIAGE_CRISIS_HOTLINE").unwrap_or(defaults.hotline),
            counselor: std::env::var("TRIAGE_COUNSELOR_CONTACT").unwrap_or(defaults.counselor),
            emergency: std::env::var("TRIAGE_EMERGENCY_CONTACT").unwrap_or(defaults.emergency),
        }
    }

    /// Contact for an escalation target.
    pub fn for_target(&self, target: EscalationTarget) -> &str {
        match target {
            EscalationTarget::Counselor => &self.counselor,
            EscalationTarget::Hotline => &self.hotline,
        }
    }
}
