//! Community risk: pooled, anonymised flags across shops.
//!
//! RULES:
//!   - Only customers in the requester's areas are considered.
//!   - The requester's own records never count toward community signal.
//!   - A customer appears only when at least `min_reporting_shops`
//!     distinct shops (never fewer than 2) flag them.
//!   - Output never names a reporting shop and never carries a raw phone.
//!   - Nothing is cached; every call starts from the flags it is given.

use crate::{
    config::{CommunityConfig, ScoreConfig},
    fingerprint::Fingerprint,
    ledger::ShopSnapshot,
    risk::RiskTier,
    score::score_history,
    types::{Amount, CustomerId, ShopId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// One shop's verdict on one of its customers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerFlag {
    pub shop_id: ShopId,
    pub customer_id: CustomerId,
    pub name: String,
    pub phone: String,
    pub area: Option<String>,
    pub aitbaar_score: u8,
    pub total_due: Amount,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommunityRiskLevel {
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommunityRiskRecord {
    pub fingerprint: Fingerprint,
    pub name: String,
    pub area: String,
    pub reported_by_shops: usize,
    pub average_aitbaar_score: u8,
    pub total_due_across_shops: Amount,
    pub risk_level: CommunityRiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommunityRiskReport {
    pub your_areas: Vec<String>,
    pub total_flagged: usize,
    pub community_risks: Vec<CommunityRiskRecord>,
}

impl CommunityRiskReport {
    pub fn empty(your_areas: &BTreeSet<String>) -> Self {
        Self {
            your_areas: your_areas.iter().cloned().collect(),
            total_flagged: 0,
            community_risks: Vec::new(),
        }
    }
}

/// Score every visible customer in other shops' snapshots.
pub fn flags_from_snapshots(
    snapshots: &[ShopSnapshot],
    as_of: NaiveDate,
    config: &ScoreConfig,
) -> Vec<CustomerFlag> {
    snapshots
        .iter()
        .flat_map(|snapshot| snapshot.customers.iter())
        .map(|ledger| {
            let history = ledger.history();
            let score = score_history(&history, as_of, config);
            CustomerFlag {
                shop_id: ledger.customer.shop_id,
                customer_id: ledger.customer.customer_id,
                name: ledger.customer.name.clone(),
                phone: ledger.customer.phone.clone(),
                area: ledger.customer.area.clone(),
                aitbaar_score: score.score,
                total_due: history.amount_due(),
            }
        })
        .collect()
}

/// What one shop reported about one fingerprint.
struct ShopReport<'a> {
    /// Worst score among the shop's records for this person.
    score: u8,
    total_due: Amount,
    first: &'a CustomerFlag,
}

/// Merge flags from many shops into community records for `requester`.
pub fn aggregate(
    requester: ShopId,
    your_areas: &BTreeSet<String>,
    flags: &[CustomerFlag],
    config: &CommunityConfig,
) -> CommunityRiskReport {
    if your_areas.is_empty() {
        return CommunityRiskReport::empty(your_areas);
    }
    let min_shops = config.min_reporting_shops.max(2);

    let mut groups: BTreeMap<Fingerprint, BTreeMap<ShopId, ShopReport<'_>>> = BTreeMap::new();
    for flag in flags {
        if flag.shop_id == requester {
            continue;
        }
        let Some(area) = flag.area.as_deref().map(str::trim) else {
            continue;
        };
        if !your_areas.contains(area) {
            continue;
        }
        if !RiskTier::from_score(flag.aitbaar_score).at_least(config.flag_tier) {
            continue;
        }
        let Some(fingerprint) =
            Fingerprint::keyed(&flag.phone, &config.default_country_code, &config.fingerprint_key)
        else {
            log::debug!(
                "Customer {} of shop {} has no usable phone; not pooled",
                flag.customer_id,
                flag.shop_id
            );
            continue;
        };

        let due = if flag.total_due.is_finite() {
            flag.total_due.max(0.0)
        } else {
            0.0
        };
        groups
            .entry(fingerprint)
            .or_default()
            .entry(flag.shop_id)
            .and_modify(|report| {
                report.score = report.score.min(flag.aitbaar_score);
                report.total_due += due;
                if flag.customer_id < report.first.customer_id {
                    report.first = flag;
                }
            })
            .or_insert(ShopReport {
                score: flag.aitbaar_score,
                total_due: due,
                first: flag,
            });
    }

    let mut records: Vec<CommunityRiskRecord> = groups
        .into_iter()
        .filter(|(_, shops)| shops.len() >= min_shops)
        .map(|(fingerprint, shops)| {
            let reported_by_shops = shops.len();
            let score_sum: f64 = shops.values().map(|r| r.score as f64).sum();
            let average = score_sum / reported_by_shops as f64;
            let total_due_across_shops = shops.values().map(|r| r.total_due).sum();
            // Lowest shop id gives a stable display name without revealing which shop it was.
            let representative = shops.values().next().map(|r| r.first);
            let average_aitbaar_score = average.round().clamp(0.0, 100.0) as u8;
            // The level follows the classifier on the reported average.
            let risk_level = match RiskTier::from_score(average_aitbaar_score) {
                RiskTier::HighRisk => CommunityRiskLevel::High,
                RiskTier::Cautious | RiskTier::Trusted => CommunityRiskLevel::Medium,
            };
            CommunityRiskRecord {
                fingerprint,
                name: representative.map(|f| f.name.clone()).unwrap_or_default(),
                area: representative
                    .and_then(|f| f.area.as_deref())
                    .map(|a| a.trim().to_string())
                    .unwrap_or_default(),
                reported_by_shops,
                average_aitbaar_score,
                total_due_across_shops,
                risk_level,
            }
        })
        .collect();

    records.sort_by(|a, b| {
        b.total_due_across_shops
            .partial_cmp(&a.total_due_across_shops)
            .unwrap_or(Ordering::Equal)
            .then(b.reported_by_shops.cmp(&a.reported_by_shops))
            .then(a.fingerprint.cmp(&b.fingerprint))
    });

    log::debug!(
        "Community risk for shop {requester}: {} records from {} flags",
        records.len(),
        flags.len()
    );

    CommunityRiskReport {
        your_areas: your_areas.iter().cloned().collect(),
        total_flagged: records.len(),
        community_risks: records,
    }
}
