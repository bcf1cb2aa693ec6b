//! Support tiers for ticket escalation.
//!
//! Pinned ordering for deterministic tie-breaking: L1 < L2 < L3.
//! When votes tie, the lowest tier wins.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Support escalation level.
/// Order is pinned; `Ord` is the canonical tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Basic / hardware: peripherals, passwords, cables
    L1,
    /// Application / software: Office, Teams, VPN client, licenses
    L2,
    /// Infrastructure / security: servers, firewalls, databases, DNS
    L3,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::L1, Tier::L2, Tier::L3];

    /// Number of tiers
    pub const COUNT: usize = 3;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::L1 => 0,
            Self::L2 => 1,
            Self::L3 => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::L1 => "basic / hardware",
            Self::L2 => "application / software",
            Self::L3 => "infrastructure / security",
        }
    }

    /// Pick the tier with the most votes, lowest tier on ties
    pub fn majority(counts: &[usize; Tier::COUNT]) -> Tier {
        let mut best = Tier::L1;
        for tier in Tier::ALL {
            if counts[tier.index()] > counts[best.index()] {
                best = tier;
            }
        }
        best
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "L1" => Ok(Self::L1),
            "L2" => Ok(Self::L2),
            "L3" => Ok(Self::L3),
            other => Err(format!("Unknown tier: '{}'. Valid values: L1, L2, L3", other)),
        }
    }
}

/// Outcome of a classification request as seen by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierVerdict {
    Classified(Tier),
    /// No usable model; the ticket proceeds with a placeholder tier
    Unavailable,
}

impl TierVerdict {
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Self::Classified(tier) => Some(*tier),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Classified(_))
    }
}

impl std::fmt::Display for TierVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classified(tier) => write!(f, "{}", tier),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}
