//! Risk classifier: the single mapping from score to tier.
//!
//! RULE: Forecasting and community aggregation both call
//! `RiskTier::from_score`. Nothing else compares scores to the
//! tier boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest score that is still Trusted.
pub const TRUSTED_MIN: u8 = 70;
/// Lowest score that is still Cautious.
pub const CAUTIOUS_MIN: u8 = 40;

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Trusted,
    Cautious,
    HighRisk,
}

impl RiskTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= TRUSTED_MIN => Self::Trusted,
            s if s >= CAUTIOUS_MIN => Self::Cautious,
            _ => Self::HighRisk,
        }
    }

    /// True when `self` is as bad as `threshold` or worse.
    pub fn at_least(&self, threshold: RiskTier) -> bool {
        *self >= threshold
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Trusted => "Trusted",
            Self::Cautious => "Cautious",
            Self::HighRisk => "High-risk",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_have_no_gaps() {
        assert_eq!(RiskTier::from_score(100), RiskTier::Trusted);
        assert_eq!(RiskTier::from_score(70), RiskTier::Trusted);
        assert_eq!(RiskTier::from_score(69), RiskTier::Cautious);
        assert_eq!(RiskTier::from_score(40), RiskTier::Cautious);
        assert_eq!(RiskTier::from_score(39), RiskTier::HighRisk);
        assert_eq!(RiskTier::from_score(0), RiskTier::HighRisk);
    }

    #[test]
    fn every_score_maps_to_exactly_one_band() {
        for score in 0..=100u8 {
            let tier = RiskTier::from_score(score);
            let bands = [
                score >= TRUSTED_MIN,
                (CAUTIOUS_MIN..TRUSTED_MIN).contains(&score),
                score < CAUTIOUS_MIN,
            ];
            assert_eq!(bands.iter().filter(|b| **b).count(), 1, "score {score}");
            let expected = match bands.iter().position(|b| *b) {
                Some(0) => RiskTier::Trusted,
                Some(1) => RiskTier::Cautious,
                _ => RiskTier::HighRisk,
            };
            assert_eq!(tier, expected, "score {score}");
        }
    }

    #[test]
    fn severity_ordering() {
        assert!(RiskTier::HighRisk.at_least(RiskTier::Cautious));
        assert!(RiskTier::Cautious.at_least(RiskTier::Cautious));
        assert!(!RiskTier::Trusted.at_least(RiskTier::Cautious));
    }
}
