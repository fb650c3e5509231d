use super::LedgerStore;
use crate::{error::KhataResult, ledger::Shop, types::ShopId};
use rusqlite::{params, OptionalExtension};

impl LedgerStore {
    // ── Shop ──────────────────────────────────────────────────────

    pub fn insert_shop(&self, shop_name: &str, city: &str) -> KhataResult<ShopId> {
        self.conn.execute(
            "INSERT INTO shop (shop_name, city) VALUES (?1, ?2)",
            params![shop_name, city],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn shop(&self, shop_id: ShopId) -> KhataResult<Option<Shop>> {
        let shop = self
            .conn
            .query_row(
                "SELECT shop_id, shop_name, city FROM shop WHERE shop_id = ?1",
                params![shop_id],
                |row| {
                    Ok(Shop {
                        shop_id: row.get(0)?,
                        shop_name: row.get(1)?,
                        city: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(shop)
    }

    pub fn shops(&self) -> KhataResult<Vec<Shop>> {
        let mut stmt = self
            .conn
            .prepare("SELECT shop_id, shop_name, city FROM shop ORDER BY shop_id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Shop {
                shop_id: row.get(0)?,
                shop_name: row.get(1)?,
                city: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
