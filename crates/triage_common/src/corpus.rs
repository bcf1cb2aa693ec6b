//! Synthetic training corpus.
//!
//! Three fixed keyword vocabularies, one per tier. Each example is a base
//! phrase from its tier's list plus a random ticket ID suffix that adds
//! variation without changing the label.

use crate::tier::Tier;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// L1: hardware, basic auth, peripherals
pub const L1_KEYWORDS: [&str; 14] = [
    "mouse broken",
    "keyboard not typing",
    "monitor black screen",
    "printer paper jam",
    "forgot password",
    "reset password",
    "login failed",
    "wifi icon missing",
    "headset no sound",
    "docking station not working",
    "screen flickering",
    "cannot turn on pc",
    "battery not charging",
    "cable loose",
];

/// L2: software, Office 365, Teams, specific apps
pub const L2_KEYWORDS: [&str; 14] = [
    "excel crashing",
    "teams microphone not working",
    "outlook not indexing",
    "vpn connection drop",
    "adobe reader error",
    "blue screen of death",
    "computer running slow",
    "install python",
    "license expired",
    "sharepoint access denied",
    "onedrive sync issue",
    "zoom update required",
    "sap login error",
    "browser cache issue",
];

/// L3: infrastructure, servers, network security
pub const L3_KEYWORDS: [&str; 14] = [
    "server 500 error",
    "firewall blocking port",
    "database connection refused",
    "active directory sync failure",
    "potential security breach",
    "switch port dead",
    "router config error",
    "api gateway timeout",
    "sql injection alert",
    "ssl certificate expired",
    "dns resolution failure",
    "subnet masking error",
    "virtual machine unresponsive",
    "aws instance down",
];

/// Inclusive range of the synthetic ticket ID suffix
pub const TICKET_ID_MIN: u32 = 1000;
pub const TICKET_ID_MAX: u32 = 9999;

/// Keyword list for a tier
pub fn keywords(tier: Tier) -> &'static [&'static str] {
    match tier {
        Tier::L1 => &L1_KEYWORDS,
        Tier::L2 => &L2_KEYWORDS,
        Tier::L3 => &L3_KEYWORDS,
    }
}

/// One labeled training example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub description: String,
    pub tier: Tier,
}

/// Seeded corpus generator
pub struct CorpusSynthesizer {
    rng: StdRng,
}

impl CorpusSynthesizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw one example: uniform tier, uniform phrase, random ticket ID
    pub fn next_example(&mut self) -> LabeledExample {
        let tier = Tier::ALL[self.rng.gen_range(0..Tier::COUNT)];
        let phrases = keywords(tier);
        let base = phrases[self.rng.gen_range(0..phrases.len())];
        let ticket_id = self.rng.gen_range(TICKET_ID_MIN..=TICKET_ID_MAX);

        LabeledExample {
            description: format!("{} - ticket ID {}", base, ticket_id),
            tier,
        }
    }

    pub fn generate(&mut self, n: usize) -> Vec<LabeledExample> {
        (0..n).map(|_| self.next_example()).collect()
    }
}

/// Generate `n` examples from a fresh generator seeded with `seed`
pub fn generate(n: usize, seed: u64) -> Vec<LabeledExample> {
    CorpusSynthesizer::new(seed).generate(n)
}

/// Split examples into parallel description and label vectors
pub fn unzip(examples: &[LabeledExample]) -> (Vec<String>, Vec<Tier>) {
    examples
        .iter()
        .map(|e| (e.description.clone(), e.tier))
        .unzip()
}

/// Count examples per tier, indexed by `Tier::index`
pub fn tier_counts(examples: &[LabeledExample]) -> [usize; Tier::COUNT] {
    let mut counts = [0; Tier::COUNT];
    for example in examples {
        counts[example.tier.index()] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_count() {
        assert_eq!(generate(50, 1).len(), 50);
        assert!(generate(0, 1).is_empty());
    }

    #[test]
    fn test_label_matches_base_phrase() {
        for example in generate(300, 7) {
            let base = example
                .description
                .split(" - ticket ID ")
                .next()
                .unwrap();
            assert!(keywords(example.tier).contains(&base), "{}", example.description);
        }
    }

    #[test]
    fn test_ticket_id_suffix_in_range() {
        for example in generate(200, 3) {
            let id: u32 = example
                .description
                .rsplit(' ')
                .next()
                .unwrap()
                .parse()
                .unwrap();
            assert!((TICKET_ID_MIN..=TICKET_ID_MAX).contains(&id));
        }
    }

    #[test]
    fn test_same_seed_same_corpus() {
        assert_eq!(generate(100, 42), generate(100, 42));
        assert_ne!(generate(100, 42), generate(100, 43));
    }

    #[test]
    fn test_all_tiers_represented() {
        let counts = tier_counts(&generate(600, 11));
        assert!(counts.iter().all(|&c| c > 100));
    }

    #[test]
    fn test_keyword_tables_have_fourteen_entries() {
        for tier in Tier::ALL {
            assert_eq!(keywords(tier).len(), 14);
        }
    }
}
