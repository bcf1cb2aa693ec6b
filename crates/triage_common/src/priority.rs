//! Priority matrix.
//!
//! Urgency and impact are both 1 (high) to 3 (low). The 3×3 table below is
//! fixed. Pairs outside the table fall back to `Medium`.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Ticket priority label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "Urgent",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority for unmapped urgency/impact pairs
pub const FALLBACK_PRIORITY: Priority = Priority::Medium;

/// Level used when a form value cannot be parsed
pub const DEFAULT_LEVEL: u8 = 2;

/// (urgency, impact) → priority
const PRIORITY_MATRIX: [((u8, u8), Priority); 9] = [
    ((1, 1), Priority::Urgent),
    ((2, 1), Priority::High),
    ((3, 1), Priority::Medium),
    ((1, 2), Priority::High),
    ((2, 2), Priority::Medium),
    ((3, 2), Priority::Low),
    ((1, 3), Priority::Medium),
    ((2, 3), Priority::Low),
    ((3, 3), Priority::Low),
];

/// Table lookup, `None` outside {1,2,3}²
pub fn lookup(urgency: u8, impact: u8) -> Option<Priority> {
    PRIORITY_MATRIX
        .iter()
        .find(|(key, _)| *key == (urgency, impact))
        .map(|(_, p)| *p)
}

/// Priority for a ticket. Out-of-range input logs a warning and yields
/// `FALLBACK_PRIORITY`.
pub fn priority(urgency: u8, impact: u8) -> Priority {
    lookup(urgency, impact).unwrap_or_else(|| {
        warn!(
            "Priority: urgency {} / impact {} outside the matrix, using {}",
            urgency, impact, FALLBACK_PRIORITY
        );
        FALLBACK_PRIORITY
    })
}

/// Parse a 1-3 level from form input, `DEFAULT_LEVEL` when unparseable
pub fn parse_level(value: &str) -> u8 {
    value.trim().parse().unwrap_or(DEFAULT_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_matrix() {
        let expected = [
            [Priority::Urgent, Priority::High, Priority::Medium],
            [Priority::High, Priority::Medium, Priority::Low],
            [Priority::Medium, Priority::Low, Priority::Low],
        ];
        // expected[impact - 1][urgency - 1]
        for impact in 1..=3u8 {
            for urgency in 1..=3u8 {
                assert_eq!(
                    priority(urgency, impact),
                    expected[(impact - 1) as usize][(urgency - 1) as usize],
                    "urgency {} impact {}",
                    urgency,
                    impact
                );
            }
        }
    }

    #[test]
    fn test_spot_values() {
        assert_eq!(priority(1, 1).as_str(), "Urgent");
        assert_eq!(priority(3, 3).as_str(), "Low");
        assert_eq!(priority(2, 2).as_str(), "Medium");
    }

    #[test]
    fn test_out_of_range_falls_back() {
        assert_eq!(priority(0, 1), Priority::Medium);
        assert_eq!(priority(4, 4), Priority::Medium);
        assert_eq!(lookup(1, 9), None);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("1"), 1);
        assert_eq!(parse_level(" 3 "), 3);
        assert_eq!(parse_level(""), DEFAULT_LEVEL);
        assert_eq!(parse_level("high"), DEFAULT_LEVEL);
    }
}
