//! Demo ledger: three Lahore shops sharing a few defaulting customers.
//!
//! Deterministic for a given (seed, as_of). Used by the runner and by
//! end-to-end tests; never by the analytics path itself.

use crate::{
    error::KhataResult,
    ledger::TransactionKind,
    rng::LedgerRng,
    store::LedgerStore,
    types::ShopId,
};
use chrono::{Duration, NaiveDate};

const CREDITS_PER_CUSTOMER: usize = 8;
const AMOUNTS: [f64; 7] = [500.0, 800.0, 1000.0, 1500.0, 2000.0, 2500.0, 3000.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Excellent,
    Good,
    Average,
    Risky,
    Bad,
}

impl Behaviour {
    /// (typical repayment delay in days, chance a credit is never repaid)
    fn profile(&self) -> (i64, f64) {
        match self {
            Self::Excellent => (2, 0.0),
            Self::Good => (5, 0.1),
            Self::Average => (10, 0.2),
            Self::Risky => (20, 0.4),
            Self::Bad => (35, 0.7),
        }
    }
}

struct DemoCustomer {
    name: &'static str,
    phone: &'static str,
    area: &'static str,
    behaviour: Behaviour,
}

struct DemoShop {
    shop_name: &'static str,
    customers: &'static [DemoCustomer],
}

const fn c(name: &'static str, phone: &'static str, area: &'static str, behaviour: Behaviour) -> DemoCustomer {
    DemoCustomer {
        name,
        phone,
        area,
        behaviour,
    }
}

const SHOPS: &[DemoShop] = &[
    DemoShop {
        shop_name: "Khan General Store",
        customers: &[
            c("Imran Butt", "03001234567", "Model Town", Behaviour::Bad),
            c("Salman Raza", "03021234567", "Model Town", Behaviour::Good),
            c("Usman Ali", "03031234567", "Model Town", Behaviour::Average),
            c("Bilal Sheikh", "03041234567", "Gulberg", Behaviour::Excellent),
            c("Kamran Iqbal", "03051234567", "Model Town", Behaviour::Risky),
        ],
    },
    DemoShop {
        shop_name: "Siddiqui Kiryana",
        customers: &[
            c("Tariq Mehmood", "03011234567", "Gulberg", Behaviour::Bad),
            c("Imran Butt", "+92 300 1234567", "Model Town", Behaviour::Bad),
            c("Zeeshan Malik", "03061234567", "Gulberg", Behaviour::Average),
            c("Hassan Nawaz", "03081234567", "DHA", Behaviour::Good),
            c("Rizwan Ch", "03101234567", "Gulberg", Behaviour::Risky),
        ],
    },
    DemoShop {
        shop_name: "Naveed Brothers",
        customers: &[
            c("Asif Javed", "03091234567", "DHA", Behaviour::Bad),
            c("Imran Butt", "0300-1234567", "Model Town", Behaviour::Bad),
            c("Tariq Mehmood", "03011234567", "Gulberg", Behaviour::Bad),
            c("Waseem Akram", "03131234567", "DHA", Behaviour::Excellent),
            c("Junaid Khan", "03141234567", "DHA", Behaviour::Average),
        ],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSummary {
    pub shop_ids: Vec<ShopId>,
    pub customers: usize,
    pub transactions: usize,
}

/// Populate `store` with the demo ledger as it would look on `as_of`.
pub fn seed_demo_ledger(store: &LedgerStore, seed: u64, as_of: NaiveDate) -> KhataResult<DemoSummary> {
    let mut summary = DemoSummary {
        shop_ids: Vec::with_capacity(SHOPS.len()),
        customers: 0,
        transactions: 0,
    };

    for (index, demo) in SHOPS.iter().enumerate() {
        let mut rng = LedgerRng::new(seed, index as u64);
        let shop_id = store.insert_shop(demo.shop_name, "Lahore")?;
        summary.shop_ids.push(shop_id);

        for customer in demo.customers {
            let customer_id =
                store.insert_customer(shop_id, customer.name, customer.phone, Some(customer.area))?;
            summary.customers += 1;

            let (delay, default_chance) = customer.behaviour.profile();
            for _ in 0..CREDITS_PER_CUSTOMER {
                let given = as_of - Duration::days(rng.between(5, 90));
                let defaulted = rng.chance(default_chance);
                let repaid_on = given + Duration::days((delay + rng.between(-2, 5)).max(0));
                // A repayment that would land after as_of has not happened yet.
                let date_repaid = (!defaulted && repaid_on <= as_of).then_some(repaid_on);
                let amount = *rng.pick(&AMOUNTS);
                store.insert_transaction(customer_id, amount, TransactionKind::Credit, given, date_repaid)?;
                summary.transactions += 1;
            }
        }
        log::debug!("Seeded demo shop '{}' as {shop_id}", demo.shop_name);
    }

    log::info!(
        "Demo ledger seeded: {} shops, {} customers, {} transactions",
        summary.shop_ids.len(),
        summary.customers,
        summary.transactions
    );
    Ok(summary)
}
