//! Risk tiers assigned to messages and conversations.

use serde::{Deserialize, Serialize};

use super::error::InvalidStateError;

/// Discrete risk severity of a message or conversation.
///
/// Totally ordered by rank; every comparison in the engine goes through
/// this ordering and nothing else.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Nothing matched.
    #[default]
    None,
    /// Distress language (stressed, anxious, sad).
    Medium,
    /// Concerning language (hopeless, worthless, trapped). Warrants a counselor.
    High,
    /// Explicit self-harm or suicide phrasing. Warrants the hotline.
    Critical,
}

impl RiskTier {
    /// All tiers from most to least severe.
    pub const DESCENDING: [RiskTier; 4] = [
        RiskTier::Critical,
        RiskTier::High,
        RiskTier::Medium,
        RiskTier::None,
    ];

    /// Integer rank (none=0 .. critical=3).
    pub fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }

    /// Score contribution of one matched phrase at this tier.
    pub fn weight(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Medium => 2,
            Self::High => 5,
            Self::Critical => 10,
        }
    }

    /// Whether a conversation at this tier may be escalated.
    pub fn is_escalation_worthy(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl TryFrom<u8> for RiskTier {
    type Error = InvalidStateError;

    fn try_from(rank: u8) -> std::result::Result<Self, Self::Error> {
        match rank {
            0 => Ok(Self::None),
            1 => Ok(Self::Medium),
            2 => Ok(Self::High),
            3 => Ok(Self::Critical),
            other => Err(InvalidStateError::UnknownTierRank(other)),
        }
    }
}

impl From<RiskTier> for u8 {
    fn from(tier: RiskTier) -> Self {
        tier.rank()
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}
