//! Shared primitive types used across the engine.

/// Ledger row identifiers, as issued by the backing store.
pub type ShopId = i64;
pub type CustomerId = i64;
pub type TransactionId = i64;

/// A currency amount in the single local unit (rupees).
pub type Amount = f64;

/// Whole days between two dates.
pub type Days = i64;

/// Render an amount the way shopkeepers read it: `Rs. 12,500`.
/// Fractions are rounded to the nearest rupee.
pub fn format_rupees(amount: Amount) -> String {
    let whole = amount.max(0.0).round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("Rs. {grouped}")
}
