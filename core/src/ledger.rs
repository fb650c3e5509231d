//! Ledger snapshot model: the read-only input to every engine operation.
//!
//! RULE: The engine never mutates ledger data. Everything here is
//! either plain data handed over by a `LedgerReader`, or values
//! derived from it on demand.

use crate::{
    error::KhataResult,
    types::{Amount, CustomerId, Days, ShopId, TransactionId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Remaining balances below this are treated as settled.
const BALANCE_EPSILON: Amount = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shop {
    pub shop_id: ShopId,
    pub shop_name: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub shop_id: ShopId,
    pub name: String,
    pub phone: String,
    pub area: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Payment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Payment => "payment",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "credit" => Some(Self::Credit),
            "payment" => Some(Self::Payment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub customer_id: CustomerId,
    pub amount: Amount,
    pub kind: TransactionKind,
    pub date_given: NaiveDate,
    pub date_repaid: Option<NaiveDate>,
    pub is_repaid: bool,
}

impl Transaction {
    /// Reasons a record is excluded from every computation.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.amount.is_finite() {
            return Err("non-finite amount");
        }
        if self.amount <= 0.0 {
            return Err("non-positive amount");
        }
        Ok(())
    }
}

/// One customer and their complete transaction history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerLedger {
    pub customer: Customer,
    pub transactions: Vec<Transaction>,
}

impl CustomerLedger {
    pub fn new(customer: Customer, transactions: Vec<Transaction>) -> Self {
        Self {
            customer,
            transactions,
        }
    }

    /// Derived credit position. Cheap enough to recompute per request.
    pub fn history(&self) -> CreditHistory {
        CreditHistory::from_transactions(self.customer.customer_id, &self.transactions)
    }

    /// The customer's derived `total_due`.
    pub fn amount_due(&self) -> Amount {
        self.history().amount_due()
    }
}

/// Everything one shop knows at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShopSnapshot {
    pub shop: Shop,
    pub customers: Vec<CustomerLedger>,
}

impl ShopSnapshot {
    pub fn empty(shop: Shop) -> Self {
        Self {
            shop,
            customers: Vec::new(),
        }
    }

    /// The shop's "Your Areas": every non-blank area among its customers.
    pub fn areas(&self) -> BTreeSet<String> {
        self.customers
            .iter()
            .filter_map(|c| c.customer.area.as_deref())
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn customer(&self, customer_id: CustomerId) -> Option<&CustomerLedger> {
        self.customers
            .iter()
            .find(|c| c.customer.customer_id == customer_id)
    }
}

/// Source of ledger snapshots. Implemented by the store; the engine
/// only ever reads through this seam.
pub trait LedgerReader {
    fn shop_snapshot(&self, shop_id: ShopId) -> KhataResult<ShopSnapshot>;

    /// Snapshots of every other shop, restricted to customers living in
    /// `areas`. Shops with no such customers are omitted.
    fn community_snapshots(
        &self,
        areas: &BTreeSet<String>,
        excluding: ShopId,
    ) -> KhataResult<Vec<ShopSnapshot>>;
}

// ── Derived credit position ────────────────────────────────────────

/// A single credit and what is left of it after payments.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditLine {
    pub transaction_id: TransactionId,
    pub amount: Amount,
    pub date_given: NaiveDate,
    /// Date the line was closed, when known.
    pub settled_on: Option<NaiveDate>,
    pub remaining: Amount,
}

impl CreditLine {
    pub fn is_open(&self) -> bool {
        self.remaining > BALANCE_EPSILON
    }

    /// Days from issue to settlement, for lines settled on a known date.
    pub fn repayment_delay(&self) -> Option<Days> {
        if self.is_open() {
            return None;
        }
        self.settled_on
            .map(|settled| (settled - self.date_given).num_days().max(0))
    }

    /// Days the line has been open as of `as_of`. Future-dated credit counts as 0.
    pub fn days_open(&self, as_of: NaiveDate) -> Days {
        (as_of - self.date_given).num_days().max(0)
    }
}

/// A customer's credits with payments applied, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditHistory {
    pub customer_id: CustomerId,
    pub lines: Vec<CreditLine>,
    /// Most recent date money came back, from repaid credits or payments.
    pub last_repayment: Option<NaiveDate>,
    /// Records excluded as malformed.
    pub skipped: usize,
}

impl CreditHistory {
    /// Build from raw transactions.
    ///
    /// Credits flagged repaid are closed on `date_repaid`. Unsettled
    /// payments are applied oldest-first to the remaining open credits;
    /// any surplus is dropped so balances never go negative. Payments
    /// already flagged repaid were reconciled upstream and are ignored.
    pub fn from_transactions(customer_id: CustomerId, transactions: &[Transaction]) -> Self {
        let mut skipped = 0;
        let mut lines = Vec::new();
        let mut payments = Vec::new();
        let mut last_repayment: Option<NaiveDate> = None;

        for txn in transactions {
            if let Err(reason) = txn.validate() {
                log::warn!(
                    "Skipping transaction {} of customer {customer_id}: {reason}",
                    txn.transaction_id
                );
                skipped += 1;
                continue;
            }
            match txn.kind {
                TransactionKind::Credit => {
                    let settled_on = if txn.is_repaid {
                        txn.date_repaid.map(|d| {
                            if d < txn.date_given {
                                log::warn!(
                                    "Transaction {} repaid before it was given; treating as same-day",
                                    txn.transaction_id
                                );
                                txn.date_given
                            } else {
                                d
                            }
                        })
                    } else {
                        None
                    };
                    if let Some(d) = settled_on {
                        last_repayment = last_repayment.max(Some(d));
                    }
                    lines.push(CreditLine {
                        transaction_id: txn.transaction_id,
                        amount: txn.amount,
                        date_given: txn.date_given,
                        settled_on,
                        remaining: if txn.is_repaid { 0.0 } else { txn.amount },
                    });
                }
                TransactionKind::Payment => {
                    last_repayment = last_repayment.max(Some(txn.date_given));
                    if !txn.is_repaid {
                        payments.push((txn.date_given, txn.transaction_id, txn.amount));
                    }
                }
            }
        }

        lines.sort_by(|a, b| {
            a.date_given
                .cmp(&b.date_given)
                .then(a.transaction_id.cmp(&b.transaction_id))
        });
        payments.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        apply_payments(&mut lines, payments.into());

        Self {
            customer_id,
            lines,
            last_repayment,
            skipped,
        }
    }

    pub fn open_lines(&self) -> impl Iterator<Item = &CreditLine> {
        self.lines.iter().filter(|l| l.is_open())
    }

    /// Sum of unsettled credit.
    pub fn amount_due(&self) -> Amount {
        self.open_lines().map(|l| l.remaining).sum()
    }

    pub fn total_extended(&self) -> Amount {
        self.lines.iter().map(|l| l.amount).sum()
    }

    pub fn oldest_open(&self) -> Option<&CreditLine> {
        self.open_lines().next()
    }

    /// Open lines older than the repayment window.
    pub fn overdue_lines(&self, as_of: NaiveDate, window: Days) -> impl Iterator<Item = &CreditLine> {
        self.open_lines().filter(move |l| l.days_open(as_of) > window)
    }

    pub fn repayment_delays(&self) -> Vec<Days> {
        self.lines.iter().filter_map(CreditLine::repayment_delay).collect()
    }

    /// Mean days from issue to settlement; `None` without settled history.
    pub fn average_repayment_delay(&self) -> Option<f64> {
        let delays = self.repayment_delays();
        if delays.is_empty() {
            None
        } else {
            Some(delays.iter().sum::<Days>() as f64 / delays.len() as f64)
        }
    }
}

fn apply_payments(lines: &mut [CreditLine], mut payments: VecDeque<(NaiveDate, TransactionId, Amount)>) {
    for line in lines.iter_mut().filter(|l| l.is_open()) {
        while line.is_open() {
            let Some(front) = payments.front_mut() else {
                return;
            };
            let applied = front.2.min(line.remaining);
            line.remaining -= applied;
            front.2 -= applied;
            let paid_on = front.0;
            if front.2 <= BALANCE_EPSILON {
                payments.pop_front();
            }
            if !line.is_open() {
                line.remaining = 0.0;
                line.settled_on = Some(paid_on.max(line.date_given));
            }
        }
    }
}
