//! Aitbaar Score: a 0..=100 trust score from repayment behaviour.
//!
//! The score starts at the configured baseline and moves with two
//! factors computed over the customer's credits:
//!   1. Punctuality: each credit earns +1 for same-day repayment down
//!      to -1 for repayment (or lateness) of two full windows, weighted
//!      by exp(-λ·age) so recent behaviour dominates.
//!   2. Severity: the share of all credit ever extended that is
//!      currently overdue.
//! Customers with fewer than `min_confident_transactions` credits are
//! pulled toward the baseline in proportion to how little is known.

use crate::{
    config::ScoreConfig,
    ledger::{CreditHistory, CustomerLedger},
    risk::RiskTier,
    types::{Amount, CustomerId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    pub customer_id: CustomerId,
    pub score: u8,
    pub tier: RiskTier,
    pub factors: ScoreFactors,
}

/// What moved the score, for display and debugging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoreFactors {
    /// Recency-weighted punctuality in [-1, 1].
    pub punctuality: f64,
    /// Overdue share of credit extended, in [0, 1].
    pub severity: f64,
    /// How far the raw score was trusted, in [0, 1].
    pub confidence: f64,
    pub credits_considered: usize,
    pub settled_count: usize,
    pub open_count: usize,
    pub overdue_count: usize,
    pub overdue_amount: Amount,
    pub total_extended: Amount,
    pub skipped_records: usize,
    /// Set when the score rests on too little history. Internal only.
    #[serde(skip)]
    pub low_confidence: bool,
}

/// Score a customer from their full history. Never fails.
pub fn compute_score(ledger: &CustomerLedger, as_of: NaiveDate, config: &ScoreConfig) -> ScoreResult {
    score_history(&ledger.history(), as_of, config)
}

/// Score an already-derived history; lets callers reuse one history
/// for scoring and forecasting.
pub fn score_history(history: &CreditHistory, as_of: NaiveDate, config: &ScoreConfig) -> ScoreResult {
    let window = config.repayment_window_days.max(1);
    let baseline = config.baseline_score;

    let mut factors = ScoreFactors {
        credits_considered: history.lines.len(),
        total_extended: history.total_extended(),
        skipped_records: history.skipped,
        ..ScoreFactors::default()
    };

    if history.lines.is_empty() {
        factors.low_confidence = true;
        return finish(history.customer_id, baseline, factors);
    }

    let decay = std::f64::consts::LN_2 / config.decay_half_life_days.max(f64::EPSILON);
    let mut weighted_points = 0.0;
    let mut total_weight = 0.0;

    for line in &history.lines {
        let (points, event_date) = if line.is_open() {
            factors.open_count += 1;
            let days_open = line.days_open(as_of);
            if days_open > window {
                factors.overdue_count += 1;
                factors.overdue_amount += line.remaining;
                let late = (days_open - window) as f64 / window as f64;
                (-late.min(1.0), as_of)
            } else {
                // Not yet due: no evidence either way.
                (0.0, as_of)
            }
        } else {
            factors.settled_count += 1;
            match (line.repayment_delay(), line.settled_on) {
                (Some(delay), Some(settled)) => {
                    let points = 1.0 - delay as f64 / window as f64;
                    (points.clamp(-1.0, 1.0), settled)
                }
                // Repaid on an unknown date: counts toward volume only.
                _ => continue,
            }
        };

        let age = (as_of - event_date).num_days().max(0) as f64;
        let weight = (-decay * age).exp();
        weighted_points += weight * points;
        total_weight += weight;
    }

    factors.punctuality = if total_weight > 0.0 {
        weighted_points / total_weight
    } else {
        0.0
    };
    factors.severity = if factors.total_extended > 0.0 {
        (factors.overdue_amount / factors.total_extended).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let raw = baseline + config.punctuality_weight * factors.punctuality
        - config.severity_weight * factors.severity;

    let needed = config.min_confident_transactions.max(1);
    factors.confidence = (history.lines.len() as f64 / needed as f64).min(1.0);
    factors.low_confidence = history.lines.len() < needed;

    let damped = baseline + (raw - baseline) * factors.confidence;
    finish(history.customer_id, damped, factors)
}

fn finish(customer_id: CustomerId, value: f64, factors: ScoreFactors) -> ScoreResult {
    let score = if value.is_finite() {
        value.clamp(0.0, 100.0).round() as u8
    } else {
        0
    };
    ScoreResult {
        customer_id,
        score,
        tier: RiskTier::from_score(score),
        factors,
    }
}
