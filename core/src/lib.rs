//! khata-core: analytics over a shopkeeper's credit ledger.
//!
//! Aitbaar scoring, cash-flow forecasting, community risk pooling and
//! the text built on top of them. Every operation reads an immutable
//! ledger snapshot and returns a fresh result; the analytics path never
//! writes to the ledger.

pub mod community;
pub mod config;
pub mod demo;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod forecast;
pub mod insight;
pub mod ledger;
pub mod reminder;
pub mod risk;
pub mod rng;
pub mod score;
pub mod store;
pub mod types;
