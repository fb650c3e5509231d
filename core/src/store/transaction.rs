use super::LedgerStore;
use crate::{
    error::KhataResult,
    ledger::{Transaction, TransactionKind},
    types::{Amount, CustomerId, TransactionId},
};
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter};
use std::collections::HashMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

struct RawTransaction {
    transaction_id: TransactionId,
    customer_id: CustomerId,
    amount: Amount,
    kind: String,
    date_given: Option<String>,
    date_repaid: Option<String>,
    is_repaid: bool,
}

impl RawTransaction {
    /// Rows the model cannot represent are dropped with a warning.
    fn into_transaction(self) -> Option<Transaction> {
        let Some(kind) = TransactionKind::parse(&self.kind) else {
            log::warn!("Skipping transaction {}: unknown kind '{}'", self.transaction_id, self.kind);
            return None;
        };
        let Some(date_given) = self.date_given.as_deref().and_then(parse_date) else {
            log::warn!("Skipping transaction {}: missing or invalid date_given", self.transaction_id);
            return None;
        };
        let date_repaid = match self.date_repaid.as_deref() {
            None => None,
            Some(raw) => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    log::warn!(
                        "Transaction {}: unreadable date_repaid '{raw}'; repayment left untimed",
                        self.transaction_id
                    );
                }
                parsed
            }
        };
        Some(Transaction {
            transaction_id: self.transaction_id,
            customer_id: self.customer_id,
            amount: self.amount,
            kind,
            date_given,
            date_repaid,
            is_repaid: self.is_repaid,
        })
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Accept full timestamps by keeping only the date part.
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

impl LedgerStore {
    // ── Transaction ───────────────────────────────────────────────

    /// Record a transaction. A `date_repaid` marks it repaid.
    pub fn insert_transaction(
        &self,
        customer_id: CustomerId,
        amount: Amount,
        kind: TransactionKind,
        date_given: NaiveDate,
        date_repaid: Option<NaiveDate>,
    ) -> KhataResult<TransactionId> {
        self.conn.execute(
            "INSERT INTO ledger_transaction
                (customer_id, amount, kind, date_given, date_repaid, is_repaid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                customer_id,
                amount,
                kind.as_str(),
                date_given.format(DATE_FORMAT).to_string(),
                date_repaid.map(|d| d.format(DATE_FORMAT).to_string()),
                if date_repaid.is_some() { 1 } else { 0 },
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All readable transactions of the given customers, grouped by customer.
    pub fn transactions_for_customers(
        &self,
        customer_ids: &[CustomerId],
    ) -> KhataResult<HashMap<CustomerId, Vec<Transaction>>> {
        let mut grouped: HashMap<CustomerId, Vec<Transaction>> = HashMap::new();
        if customer_ids.is_empty() {
            return Ok(grouped);
        }
        let placeholders = vec!["?"; customer_ids.len()].join(", ");
        let sql = format!(
            "SELECT transaction_id, customer_id, amount, kind, date_given, date_repaid, is_repaid
             FROM ledger_transaction
             WHERE customer_id IN ({placeholders})
             ORDER BY transaction_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(customer_ids.iter()), |row| {
                Ok(RawTransaction {
                    transaction_id: row.get(0)?,
                    customer_id: row.get(1)?,
                    amount: row.get(2)?,
                    kind: row.get(3)?,
                    date_given: row.get(4)?,
                    date_repaid: row.get(5)?,
                    is_repaid: row.get::<_, i64>(6)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for txn in rows.into_iter().filter_map(RawTransaction::into_transaction) {
            grouped.entry(txn.customer_id).or_default().push(txn);
        }
        Ok(grouped)
    }
}
