//! SQLite ledger store as a LedgerReader.

use chrono::NaiveDate;
use khata_core::{
    error::KhataError,
    ledger::{LedgerReader, TransactionKind},
    store::LedgerStore,
};
use std::collections::BTreeSet;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn build_store() -> LedgerStore {
    let store = LedgerStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

#[test]
fn migrate_is_repeatable() {
    let store = build_store();
    store.migrate().expect("second migration");
}

#[test]
fn shop_snapshot_round_trips_customers_and_transactions() {
    let store = build_store();
    let shop = store.insert_shop("Khan General Store", "Lahore").unwrap();
    let imran = store
        .insert_customer(shop, "Imran Butt", "03001234567", Some("Model Town"))
        .unwrap();
    let salman = store
        .insert_customer(shop, "Salman Raza", "03021234567", None)
        .unwrap();

    store
        .insert_transaction(imran, 1000.0, TransactionKind::Credit, date("2026-05-01"), None)
        .unwrap();
    store
        .insert_transaction(
            imran,
            500.0,
            TransactionKind::Credit,
            date("2026-04-01"),
            Some(date("2026-04-09")),
        )
        .unwrap();
    store
        .insert_transaction(salman, 300.0, TransactionKind::Payment, date("2026-05-03"), None)
        .unwrap();

    let snapshot = store.shop_snapshot(shop).unwrap();
    assert_eq!(snapshot.shop.shop_name, "Khan General Store");
    assert_eq!(snapshot.customers.len(), 2);

    let imran_ledger = snapshot.customer(imran).unwrap();
    assert_eq!(imran_ledger.transactions.len(), 2);
    assert_eq!(imran_ledger.amount_due(), 1000.0);
    let repaid = imran_ledger
        .transactions
        .iter()
        .find(|t| t.amount == 500.0)
        .unwrap();
    assert!(repaid.is_repaid);
    assert_eq!(repaid.date_repaid, Some(date("2026-04-09")));

    let salman_ledger = snapshot.customer(salman).unwrap();
    assert_eq!(salman_ledger.transactions[0].kind, TransactionKind::Payment);
    assert_eq!(salman_ledger.amount_due(), 0.0);

    let areas: Vec<_> = snapshot.areas().into_iter().collect();
    assert_eq!(areas, vec!["Model Town".to_string()]);
}

#[test]
fn shops_list_in_insertion_order() {
    let store = build_store();
    let a = store.insert_shop("Khan General Store", "Lahore").unwrap();
    let b = store.insert_shop("Naveed Brothers", "Karachi").unwrap();
    let shops = store.shops().unwrap();
    let ids: Vec<_> = shops.iter().map(|s| s.shop_id).collect();
    assert_eq!(ids, vec![a, b]);
    assert_eq!(shops[1].city, "Karachi");
}

#[test]
fn unknown_shop_is_an_error() {
    let store = build_store();
    let err = store.shop_snapshot(404).unwrap_err();
    assert!(matches!(err, KhataError::ShopNotFound { shop_id: 404 }));
}

#[test]
fn malformed_amounts_survive_storage_but_not_analysis() {
    let store = build_store();
    let shop = store.insert_shop("Siddiqui Kiryana", "Lahore").unwrap();
    let c = store
        .insert_customer(shop, "Zeeshan Malik", "03061234567", Some("Gulberg"))
        .unwrap();
    store
        .insert_transaction(c, -200.0, TransactionKind::Credit, date("2026-05-01"), None)
        .unwrap();
    store
        .insert_transaction(c, 750.0, TransactionKind::Credit, date("2026-05-01"), None)
        .unwrap();

    let snapshot = store.shop_snapshot(shop).unwrap();
    let ledger = snapshot.customer(c).unwrap();
    assert_eq!(ledger.transactions.len(), 2);
    assert_eq!(ledger.amount_due(), 750.0);
    assert_eq!(ledger.history().skipped, 1);
}

#[test]
fn community_snapshots_only_show_other_shops_in_your_areas() {
    let store = build_store();
    let me = store.insert_shop("Khan General Store", "Lahore").unwrap();
    let near = store.insert_shop("Siddiqui Kiryana", "Lahore").unwrap();
    let far = store.insert_shop("Naveed Brothers", "Lahore").unwrap();

    let mine = store
        .insert_customer(me, "Imran Butt", "03001234567", Some("Model Town"))
        .unwrap();
    let theirs = store
        .insert_customer(near, "Imran Butt", "03001234567", Some("Model Town"))
        .unwrap();
    store
        .insert_customer(near, "Zeeshan Malik", "03061234567", Some("Gulberg"))
        .unwrap();
    store
        .insert_customer(far, "Asif Javed", "03091234567", Some("DHA"))
        .unwrap();
    store
        .insert_transaction(theirs, 900.0, TransactionKind::Credit, date("2026-03-01"), None)
        .unwrap();
    store
        .insert_transaction(mine, 100.0, TransactionKind::Credit, date("2026-03-01"), None)
        .unwrap();

    let areas: BTreeSet<String> = ["Model Town".to_string()].into_iter().collect();
    let snapshots = store.community_snapshots(&areas, me).unwrap();

    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].shop.shop_id, near);
    assert_eq!(snapshots[0].customers.len(), 1);
    let visible = &snapshots[0].customers[0];
    assert_eq!(visible.customer.customer_id, theirs);
    assert_eq!(visible.transactions.len(), 1);
    assert_eq!(visible.amount_due(), 900.0);
}

#[test]
fn community_snapshots_for_no_areas_are_empty() {
    let store = build_store();
    let shop = store.insert_shop("Khan General Store", "Lahore").unwrap();
    store
        .insert_customer(shop, "Imran Butt", "03001234567", Some("Model Town"))
        .unwrap();
    let snapshots = store.community_snapshots(&BTreeSet::new(), 999).unwrap();
    assert!(snapshots.is_empty());
}
