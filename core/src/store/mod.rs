//! SQLite ledger store.
//!
//! RULE: Only the store talks to the database.
//! The engine reads through `LedgerReader` and never executes SQL.
//! Insert helpers exist for seeding and tests; the analytics path
//! is read-only.

use crate::{
    error::{KhataError, KhataResult},
    ledger::{CustomerLedger, LedgerReader, ShopSnapshot},
    types::ShopId,
};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};

mod customer;
mod shop;
mod transaction;

pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    pub fn open(path: &str) -> KhataResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> KhataResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> KhataResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_ledger.sql"))?;
        Ok(())
    }

    fn assemble(
        &self,
        shop: crate::ledger::Shop,
        customers: Vec<crate::ledger::Customer>,
    ) -> KhataResult<ShopSnapshot> {
        let ids: Vec<_> = customers.iter().map(|c| c.customer_id).collect();
        let mut by_customer = self.transactions_for_customers(&ids)?;
        let customers = customers
            .into_iter()
            .map(|c| {
                let txns = by_customer.remove(&c.customer_id).unwrap_or_default();
                CustomerLedger::new(c, txns)
            })
            .collect();
        Ok(ShopSnapshot { shop, customers })
    }
}

impl LedgerReader for LedgerStore {
    fn shop_snapshot(&self, shop_id: ShopId) -> KhataResult<ShopSnapshot> {
        let shop = self
            .shop(shop_id)?
            .ok_or(KhataError::ShopNotFound { shop_id })?;
        let customers = self.customers_for_shop(shop_id)?;
        self.assemble(shop, customers)
    }

    fn community_snapshots(
        &self,
        areas: &BTreeSet<String>,
        excluding: ShopId,
    ) -> KhataResult<Vec<ShopSnapshot>> {
        if areas.is_empty() {
            return Ok(Vec::new());
        }
        let mut by_shop: BTreeMap<ShopId, Vec<crate::ledger::Customer>> = BTreeMap::new();
        for customer in self.customers_in_areas(areas, excluding)? {
            by_shop.entry(customer.shop_id).or_default().push(customer);
        }

        let mut snapshots = Vec::with_capacity(by_shop.len());
        for (shop_id, customers) in by_shop {
            let Some(shop) = self.shop(shop_id)? else {
                log::warn!("Customers reference missing shop {shop_id}; skipping");
                continue;
            };
            snapshots.push(self.assemble(shop, customers)?);
        }
        Ok(snapshots)
    }
}
