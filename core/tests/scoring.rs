//! Aitbaar Score: range, tiers, and repayment scenarios.

use chrono::{Duration, NaiveDate};
use khata_core::{
    config::ScoreConfig,
    ledger::{Customer, CustomerLedger, Transaction, TransactionKind},
    risk::RiskTier,
    rng::LedgerRng,
    score::compute_score,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
}

fn customer(id: i64) -> Customer {
    Customer {
        customer_id: id,
        shop_id: 1,
        name: format!("Customer {id}"),
        phone: format!("0300{id:07}"),
        area: Some("Gulberg".into()),
    }
}

fn credit(id: i64, amount: f64, given: NaiveDate, repaid: Option<NaiveDate>) -> Transaction {
    Transaction {
        transaction_id: id,
        customer_id: 1,
        amount,
        kind: TransactionKind::Credit,
        date_given: given,
        date_repaid: repaid,
        is_repaid: repaid.is_some(),
    }
}

/// Random but reproducible histories, including malformed records.
fn random_ledger(rng: &mut LedgerRng, id: i64) -> CustomerLedger {
    let count = rng.between(0, 12);
    let transactions = (0..count)
        .map(|i| {
            let given = as_of() - Duration::days(rng.between(-5, 400));
            let amount = match rng.between(0, 20) {
                0 => 0.0,
                1 => -100.0,
                _ => rng.between(50, 5000) as f64,
            };
            let kind = if rng.chance(0.2) {
                TransactionKind::Payment
            } else {
                TransactionKind::Credit
            };
            let repaid = rng
                .chance(0.5)
                .then(|| given + Duration::days(rng.between(-3, 120)));
            Transaction {
                transaction_id: i,
                customer_id: id,
                amount,
                kind,
                date_given: given,
                date_repaid: repaid,
                is_repaid: repaid.is_some() || rng.chance(0.05),
            }
        })
        .collect();
    CustomerLedger::new(customer(id), transactions)
}

#[test]
fn score_always_within_bounds() {
    let config = ScoreConfig::default();
    let mut rng = LedgerRng::new(0xC0FFEE, 0);
    for id in 0..500 {
        let ledger = random_ledger(&mut rng, id);
        let result = compute_score(&ledger, as_of(), &config);
        assert!(result.score <= 100, "customer {id} scored {}", result.score);
        assert_eq!(result.tier, RiskTier::from_score(result.score));
        assert!((-1.0..=1.0).contains(&result.factors.punctuality));
        assert!((0.0..=1.0).contains(&result.factors.severity));
    }
}

#[test]
fn extreme_weights_are_still_clamped() {
    let config = ScoreConfig {
        punctuality_weight: 500.0,
        severity_weight: 500.0,
        ..ScoreConfig::default()
    };
    let mut rng = LedgerRng::new(99, 1);
    for id in 0..200 {
        let result = compute_score(&random_ledger(&mut rng, id), as_of(), &config);
        assert!(result.score <= 100);
    }
}

#[test]
fn no_history_gets_baseline() {
    let ledger = CustomerLedger::new(customer(1), vec![]);
    let result = compute_score(&ledger, as_of(), &ScoreConfig::default());
    assert_eq!(result.score, 70);
    assert_eq!(result.tier, RiskTier::Trusted);
}

#[test]
fn only_malformed_records_behaves_like_no_history() {
    let given = as_of() - Duration::days(40);
    let ledger = CustomerLedger::new(
        customer(1),
        vec![credit(1, 0.0, given, None), credit(2, -300.0, given, None)],
    );
    let result = compute_score(&ledger, as_of(), &ScoreConfig::default());
    assert_eq!(result.score, 70);
    assert_eq!(result.factors.skipped_records, 2);
}

/// One credit of 1000, repaid 5 days past the 30-day window, must beat
/// the same credit still unsettled 60 days after issue.
#[test]
fn late_repayment_beats_no_repayment() {
    let config = ScoreConfig::default();
    let given = as_of() - Duration::days(60);

    let repaid_late = CustomerLedger::new(
        customer(1),
        vec![credit(1, 1000.0, given, Some(given + Duration::days(35)))],
    );
    let unsettled = CustomerLedger::new(customer(2), vec![credit(1, 1000.0, given, None)]);

    let a = compute_score(&repaid_late, as_of(), &config);
    let b = compute_score(&unsettled, as_of(), &config);
    assert!(a.score > b.score, "repaid late {} vs unsettled {}", a.score, b.score);
}

#[test]
fn longer_repayment_window_forgives_more() {
    let given = as_of() - Duration::days(50);
    let ledger = CustomerLedger::new(
        customer(1),
        (1..=3).map(|i| credit(i, 1000.0, given, None)).collect(),
    );
    let strict = compute_score(&ledger, as_of(), &ScoreConfig::default());
    let lenient = compute_score(
        &ledger,
        as_of(),
        &ScoreConfig {
            repayment_window_days: 60,
            ..ScoreConfig::default()
        },
    );
    assert!(lenient.score > strict.score);
    assert_eq!(lenient.factors.overdue_count, 0);
}

#[test]
fn payments_count_as_repayment() {
    let config = ScoreConfig::default();
    let given = as_of() - Duration::days(60);
    let open: Vec<_> = (1..=3).map(|i| credit(i, 1000.0, given, None)).collect();

    let mut paid = open.clone();
    paid.push(Transaction {
        transaction_id: 10,
        customer_id: 1,
        amount: 3000.0,
        kind: TransactionKind::Payment,
        date_given: given + Duration::days(3),
        date_repaid: None,
        is_repaid: false,
    });

    let unpaid_score = compute_score(&CustomerLedger::new(customer(1), open), as_of(), &config);
    let paid_score = compute_score(&CustomerLedger::new(customer(1), paid), as_of(), &config);
    assert!(paid_score.score > unpaid_score.score);
    assert_eq!(paid_score.factors.open_count, 0);
}

#[test]
fn scoring_is_deterministic() {
    let config = ScoreConfig::default();
    let mut rng_a = LedgerRng::new(5, 5);
    let mut rng_b = LedgerRng::new(5, 5);
    for id in 0..50 {
        let a = compute_score(&random_ledger(&mut rng_a, id), as_of(), &config);
        let b = compute_score(&random_ledger(&mut rng_b, id), as_of(), &config);
        assert_eq!(a, b);
    }
}
