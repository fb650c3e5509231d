use crate::{
    error::{KhataError, KhataResult},
    insight::Language,
    risk::RiskTier,
    types::Days,
};
use serde::{Deserialize, Serialize};

// ── Scoring ────────────────────────────────────────────────────────

/// Weights behind the Aitbaar Score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreConfig {
    /// Score for a customer with no usable history.
    pub baseline_score: f64,
    /// Days a credit may stay open before it counts as overdue.
    pub repayment_window_days: Days,
    /// Behaviour this many days old carries half the weight of today's.
    pub decay_half_life_days: f64,
    /// Below this many credits the score is pulled toward the baseline.
    pub min_confident_transactions: usize,
    /// Points gained (or lost) for perfectly punctual (or hopeless) repayment.
    pub punctuality_weight: f64,
    /// Points lost when every rupee ever extended is overdue.
    pub severity_weight: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            baseline_score: 70.0,
            repayment_window_days: 30,
            decay_half_life_days: 90.0,
            min_confident_transactions: 3,
            punctuality_weight: 30.0,
            severity_weight: 40.0,
        }
    }
}

// ── Forecast ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastConfig {
    /// Shortage is flagged when at-risk credit exceeds this share of the total.
    pub shortage_ratio: f64,
    /// Cap on upcoming collections returned. `None` returns all of them.
    #[serde(default)]
    pub upcoming_limit: Option<usize>,
    /// Silence after which "no repayment in N days" becomes the risk reason.
    pub stale_repayment_days: Days,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            shortage_ratio: 0.30,
            upcoming_limit: None,
            stale_repayment_days: 60,
        }
    }
}

// ── Community ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommunityConfig {
    /// Distinct shops needed before a flag becomes community signal. Never below 2.
    pub min_reporting_shops: usize,
    /// A shop flags a customer whose tier is at least this severe.
    pub flag_tier: RiskTier,
    /// Calling code stripped when normalising phone numbers.
    pub default_country_code: String,
    /// Deployment secret mixed into phone fingerprints. With an empty key
    /// a fingerprint can be reversed by enumerating phone numbers.
    #[serde(default)]
    pub fingerprint_key: String,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            min_reporting_shops: 2,
            flag_tier: RiskTier::HighRisk,
            default_country_code: "92".into(),
            fingerprint_key: String::new(),
        }
    }
}

// ── Insight ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct InsightConfig {
    pub default_language: Language,
}

// ── Engine ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EngineConfig {
    pub score: ScoreConfig,
    pub forecast: ForecastConfig,
    pub community: CommunityConfig,
    #[serde(default)]
    pub insight: InsightConfig,
}

impl EngineConfig {
    /// Load from the data/ directory and validate.
    /// In tests, use EngineConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let score: ScoreConfig = read_json(&format!("{data_dir}/scoring/score_weights.json"))?;
        let forecast: ForecastConfig =
            read_json(&format!("{data_dir}/forecast/forecast_config.json"))?;
        let community: CommunityConfig =
            read_json(&format!("{data_dir}/community/community_config.json"))?;

        let insight_path = format!("{data_dir}/insight/insight_config.json");
        let insight = if std::path::Path::new(&insight_path).exists() {
            read_json(&insight_path)?
        } else {
            InsightConfig::default()
        };

        let config = Self {
            score,
            forecast,
            community,
            insight,
        };
        config.validate()?;
        log::debug!("Engine config loaded from {data_dir}");
        Ok(config)
    }

    /// Reject values the algorithms cannot work with.
    pub fn validate(&self) -> KhataResult<()> {
        let s = &self.score;
        if !(0.0..=100.0).contains(&s.baseline_score) {
            return Err(invalid("score.baseline_score", "must be within 0..=100"));
        }
        if s.repayment_window_days <= 0 {
            return Err(invalid("score.repayment_window_days", "must be positive"));
        }
        if !(s.decay_half_life_days.is_finite() && s.decay_half_life_days > 0.0) {
            return Err(invalid("score.decay_half_life_days", "must be positive"));
        }
        if s.min_confident_transactions == 0 {
            return Err(invalid("score.min_confident_transactions", "must be at least 1"));
        }
        for (field, weight) in [
            ("score.punctuality_weight", s.punctuality_weight),
            ("score.severity_weight", s.severity_weight),
        ] {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(invalid(field, "must be a non-negative number"));
            }
        }

        let f = &self.forecast;
        if !(f.shortage_ratio > 0.0 && f.shortage_ratio < 1.0) {
            return Err(invalid("forecast.shortage_ratio", "must be strictly between 0 and 1"));
        }
        if f.stale_repayment_days <= 0 {
            return Err(invalid("forecast.stale_repayment_days", "must be positive"));
        }

        let c = &self.community;
        if c.min_reporting_shops < 2 {
            return Err(invalid("community.min_reporting_shops", "must be at least 2"));
        }
        if c.default_country_code.is_empty()
            || !c.default_country_code.chars().all(|ch| ch.is_ascii_digit())
        {
            return Err(invalid("community.default_country_code", "must be digits only"));
        }
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
    Ok(value)
}

fn invalid(field: &'static str, reason: &str) -> KhataError {
    KhataError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}
