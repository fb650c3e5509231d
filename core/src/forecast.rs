//! Cash-flow forecast for one shop.
//!
//! This module:
//!   1. Totals unsettled credit across the shop
//!   2. Scores and tiers every customer
//!   3. Lists Cautious and High-risk customers who still owe money
//!   4. Raises a shortage warning when high-risk credit is too large a share
//!   5. Predicts a settlement date for every open credit
//!
//! Output is a pure function of (snapshot, as_of, config).

use crate::{
    config::EngineConfig,
    ledger::{CreditHistory, ShopSnapshot},
    risk::RiskTier,
    score::{score_history, ScoreResult},
    types::{Amount, CustomerId, Days, TransactionId},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastResult {
    pub total_outstanding: Amount,
    pub at_risk_amount: Amount,
    pub shortage_warning: bool,
    pub customers_at_risk: Vec<CustomerAtRisk>,
    pub upcoming_collections: Vec<UpcomingCollection>,
}

impl ForecastResult {
    pub fn empty() -> Self {
        Self {
            total_outstanding: 0.0,
            at_risk_amount: 0.0,
            shortage_warning: false,
            customers_at_risk: Vec::new(),
            upcoming_collections: Vec::new(),
        }
    }

    pub fn high_risk_count(&self) -> usize {
        self.customers_at_risk
            .iter()
            .filter(|c| c.tier == RiskTier::HighRisk)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerAtRisk {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub aitbaar_score: u8,
    pub tier: RiskTier,
    pub amount_due: Amount,
    pub risk_reason: String,
    pub overdue_by_days: Days,
    pub avg_repayment_days: Days,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Expected,
    Overdue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcomingCollection {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub transaction_id: TransactionId,
    pub amount_due: Amount,
    pub expected_date: NaiveDate,
    /// 0 once the expected date has arrived.
    pub expected_in_days: Days,
    pub status: CollectionStatus,
    pub overdue_by_days: Days,
}

/// Build the forecast for a shop snapshot.
pub fn build_forecast(snapshot: &ShopSnapshot, as_of: NaiveDate, config: &EngineConfig) -> ForecastResult {
    let window = config.score.repayment_window_days.max(1);
    let mut result = ForecastResult::empty();

    for ledger in &snapshot.customers {
        let history = ledger.history();
        let amount_due = history.amount_due();
        if amount_due <= 0.0 {
            continue;
        }

        let score = score_history(&history, as_of, &config.score);
        let avg_delay = history
            .average_repayment_delay()
            .unwrap_or(window as f64);
        let name = &ledger.customer.name;

        result.total_outstanding += amount_due;
        if score.tier == RiskTier::HighRisk {
            result.at_risk_amount += amount_due;
        }

        if score.tier.at_least(RiskTier::Cautious) {
            result.customers_at_risk.push(CustomerAtRisk {
                customer_id: ledger.customer.customer_id,
                customer_name: name.clone(),
                aitbaar_score: score.score,
                tier: score.tier,
                amount_due,
                risk_reason: risk_reason(&history, &score, as_of, config),
                overdue_by_days: overdue_by_days(&history, as_of, window),
                avg_repayment_days: avg_delay.round() as Days,
            });
        }

        let expected_delay = Duration::days(avg_delay.round() as i64);
        for line in history.open_lines() {
            let expected_date = line.date_given + expected_delay;
            let days_until = (expected_date - as_of).num_days();
            result.upcoming_collections.push(UpcomingCollection {
                customer_id: ledger.customer.customer_id,
                customer_name: name.clone(),
                transaction_id: line.transaction_id,
                amount_due: line.remaining,
                expected_date,
                expected_in_days: days_until.max(0),
                status: if days_until <= 0 {
                    CollectionStatus::Overdue
                } else {
                    CollectionStatus::Expected
                },
                overdue_by_days: (-days_until).max(0),
            });
        }
    }

    result.shortage_warning = shortage_warning(
        result.at_risk_amount,
        result.total_outstanding,
        config.forecast.shortage_ratio,
    );

    result.customers_at_risk.sort_by(|a, b| {
        cmp_amount_desc(a.amount_due, b.amount_due).then(a.customer_id.cmp(&b.customer_id))
    });
    result.upcoming_collections.sort_by(|a, b| {
        a.expected_date
            .cmp(&b.expected_date)
            .then(cmp_amount_desc(a.amount_due, b.amount_due))
            .then(a.customer_id.cmp(&b.customer_id))
            .then(a.transaction_id.cmp(&b.transaction_id))
    });
    if let Some(limit) = config.forecast.upcoming_limit {
        result.upcoming_collections.truncate(limit);
    }

    log::debug!(
        "Forecast for shop {}: outstanding {:.0}, at risk {:.0}, {} flagged",
        snapshot.shop.shop_id,
        result.total_outstanding,
        result.at_risk_amount,
        result.customers_at_risk.len()
    );
    result
}

/// True when at-risk credit exceeds `ratio` of the total. Never warns on
/// an empty book.
pub fn shortage_warning(at_risk_amount: Amount, total_outstanding: Amount, ratio: f64) -> bool {
    total_outstanding > 0.0 && at_risk_amount > ratio * total_outstanding
}

/// Days past the repayment window of the oldest open credit.
fn overdue_by_days(history: &CreditHistory, as_of: NaiveDate, window: Days) -> Days {
    history
        .oldest_open()
        .map(|line| (line.days_open(as_of) - window).max(0))
        .unwrap_or(0)
}

/// The single most telling cause, most concrete first.
fn risk_reason(history: &CreditHistory, score: &ScoreResult, as_of: NaiveDate, config: &EngineConfig) -> String {
    let overdue = score.factors.overdue_count;
    if overdue > 0 {
        let noun = if overdue == 1 { "payment" } else { "payments" };
        return format!("{overdue} overdue {noun}");
    }

    let silent_since = history
        .last_repayment
        .or_else(|| history.oldest_open().map(|l| l.date_given));
    if let Some(since) = silent_since {
        let days = (as_of - since).num_days();
        if days >= config.forecast.stale_repayment_days {
            return format!("no repayment in {days} days");
        }
    }

    match score.tier {
        RiskTier::HighRisk => "poor repayment history".into(),
        _ => "slow repayment history".into(),
    }
}

fn cmp_amount_desc(a: Amount, b: Amount) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortage_boundary_is_strict() {
        assert!(shortage_warning(4_000.0, 10_000.0, 0.30));
        assert!(!shortage_warning(2_500.0, 10_000.0, 0.30));
        assert!(!shortage_warning(0.0, 0.0, 0.30));
    }

    #[test]
    fn amounts_sort_largest_first() {
        let mut v = vec![10.0, 30.0, 20.0];
        v.sort_by(|a, b| cmp_amount_desc(*a, *b));
        assert_eq!(v, vec![30.0, 20.0, 10.0]);
    }
}
