use crate::types::{CustomerId, ShopId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KhataError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Shop {shop_id} not found")]
    ShopNotFound { shop_id: ShopId },

    #[error("Customer {customer_id} not found")]
    CustomerNotFound { customer_id: CustomerId },

    #[error("Insight backend failed: {0}")]
    Insight(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type KhataResult<T> = Result<T, KhataError>;
