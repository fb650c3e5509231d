use super::LedgerStore;
use crate::{
    error::KhataResult,
    ledger::Customer,
    types::{CustomerId, ShopId},
};
use rusqlite::{params, params_from_iter, Row};
use std::collections::BTreeSet;

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        customer_id: row.get(0)?,
        shop_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        area: row.get(4)?,
    })
}

impl LedgerStore {
    // ── Customer ──────────────────────────────────────────────────

    pub fn insert_customer(
        &self,
        shop_id: ShopId,
        name: &str,
        phone: &str,
        area: Option<&str>,
    ) -> KhataResult<CustomerId> {
        self.conn.execute(
            "INSERT INTO customer (shop_id, name, phone, area) VALUES (?1, ?2, ?3, ?4)",
            params![shop_id, name, phone, area],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn customers_for_shop(&self, shop_id: ShopId) -> KhataResult<Vec<Customer>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, shop_id, name, phone, area
             FROM customer WHERE shop_id = ?1
             ORDER BY customer_id ASC",
        )?;
        let rows = stmt.query_map(params![shop_id], customer_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Customers of every shop but `excluding` whose area is in `areas`.
    pub fn customers_in_areas(
        &self,
        areas: &BTreeSet<String>,
        excluding: ShopId,
    ) -> KhataResult<Vec<Customer>> {
        if areas.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; areas.len()].join(", ");
        let sql = format!(
            "SELECT customer_id, shop_id, name, phone, area
             FROM customer
             WHERE shop_id != ? AND TRIM(area) IN ({placeholders})
             ORDER BY shop_id ASC, customer_id ASC"
        );
        let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(areas.len() + 1);
        values.push(excluding.into());
        values.extend(areas.iter().map(|a| a.clone().into()));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), customer_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
