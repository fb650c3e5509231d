//! Payment reminder text for a single customer.

use crate::{
    insight::Language,
    types::{format_rupees, Amount, CustomerId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageRequest {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderMessage {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub amount_due: Amount,
    pub language: Language,
    pub message: String,
}

pub fn compose_reminder(customer_name: &str, amount_due: Amount, shop_name: &str, language: Language) -> String {
    let amount = format_rupees(amount_due);
    let settled = amount_due.round() <= 0.0;
    match (language, settled) {
        (Language::RomanUrdu, false) => format!(
            "Assalam o Alaikum {customer_name}, aap ki taraf se {amount} baaki hain. \
             Meherbani farma ke jald ada kar dein. Shukriya, {shop_name}"
        ),
        (Language::RomanUrdu, true) => format!(
            "Assalam o Alaikum {customer_name}, aap ka khata saaf hai. \
             Hamesha ki tarah tawun ka shukriya, {shop_name}"
        ),
        (Language::English, false) => format!(
            "Hello {customer_name}, this is a friendly reminder from {shop_name} that {amount} \
             is outstanding on your account. Kindly clear it at your earliest convenience. Thank you!"
        ),
        (Language::English, true) => format!(
            "Hello {customer_name}, your account with {shop_name} is fully settled. \
             Thank you for paying on time!"
        ),
    }
}
