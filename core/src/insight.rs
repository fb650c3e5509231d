//! Insight text for a forecast.
//!
//! `InsightGenerator` is the narrow seam between the forecast and any
//! text producer. `TemplateInsight` is always available; a generative
//! backend may be plugged in, and when it fails the engine falls back
//! to the template rather than surfacing an error.

use crate::{
    error::KhataResult,
    forecast::ForecastResult,
    types::format_rupees,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    RomanUrdu,
    English,
}

/// Per-request facts the text may mention.
#[derive(Debug, Clone, Copy)]
pub struct InsightContext<'a> {
    pub shop_name: &'a str,
    pub language: Language,
}

pub trait InsightGenerator: Send + Sync {
    /// Stable name, used in logs.
    fn name(&self) -> &'static str;

    fn generate(&self, forecast: &ForecastResult, context: &InsightContext<'_>) -> KhataResult<String>;
}

/// At-risk share above which the wording turns urgent even without a shortage.
const NOTABLE_AT_RISK_SHARE: f64 = 0.15;

/// Which message a forecast calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Situation {
    Clear,
    Shortage,
    NotableRisk,
    MinorRisk,
    SlowPayers,
    Healthy,
}

fn situation(forecast: &ForecastResult) -> Situation {
    if forecast.total_outstanding <= 0.0 {
        return Situation::Clear;
    }
    if forecast.shortage_warning {
        return Situation::Shortage;
    }
    let share = forecast.at_risk_amount / forecast.total_outstanding;
    if share > NOTABLE_AT_RISK_SHARE {
        Situation::NotableRisk
    } else if forecast.at_risk_amount > 0.0 {
        Situation::MinorRisk
    } else if !forecast.customers_at_risk.is_empty() {
        Situation::SlowPayers
    } else {
        Situation::Healthy
    }
}

fn customers(count: usize) -> &'static str {
    if count == 1 {
        "customer"
    } else {
        "customers"
    }
}

pub struct TemplateInsight;

impl TemplateInsight {
    /// Infallible rendering, used directly as the fallback.
    pub fn render(forecast: &ForecastResult, context: &InsightContext<'_>) -> String {
        let total = format_rupees(forecast.total_outstanding);
        let at_risk = format_rupees(forecast.at_risk_amount);
        let flagged = forecast.customers_at_risk.len();
        let high = forecast.high_risk_count();
        let pct = if forecast.total_outstanding > 0.0 {
            (forecast.at_risk_amount / forecast.total_outstanding * 100.0).round() as u32
        } else {
            0
        };
        let high_noun = customers(high);
        let verb = if flagged == 1 { "is" } else { "are" };
        let flagged_noun = customers(flagged);
        let first = forecast
            .customers_at_risk
            .first()
            .map(|c| c.customer_name.as_str())
            .unwrap_or("");

        match (context.language, situation(forecast)) {
            (Language::English, Situation::Clear) => {
                "No credit is outstanding right now. Your khata is clear.".to_string()
            }
            (Language::English, Situation::Shortage) => format!(
                "Cash shortage warning: {at_risk} of your {total} outstanding ({pct}%) sits with \
                 {high} high-risk {high_noun}. Collect from {first} first and pause new credit \
                 for high-risk customers until dues come down."
            ),
            (Language::English, Situation::NotableRisk) => format!(
                "{at_risk} of your {total} outstanding ({pct}%) is with high-risk customers. \
                 Follow up with the {flagged} flagged {flagged_noun} this week, starting with {first}."
            ),
            (Language::English, Situation::MinorRisk) => format!(
                "Cash flow is stable. Only {at_risk} of {total} is with high-risk customers; \
                 a reminder to the {flagged} flagged {flagged_noun} should keep it that way."
            ),
            (Language::English, Situation::SlowPayers) => format!(
                "Cash flow is healthy, but {flagged} {flagged_noun} {verb} paying slowly. \
                 A friendly reminder will keep {total} on track."
            ),
            (Language::English, Situation::Healthy) => format!(
                "Cash flow is healthy. All {total} outstanding is with trusted customers."
            ),
            (Language::RomanUrdu, Situation::Clear) => {
                "Abhi koi udhaar baaki nahi. Aap ka khata saaf hai.".to_string()
            }
            (Language::RomanUrdu, Situation::Shortage) => format!(
                "Cash ki kami ka khatra: {total} mein se {at_risk} ({pct}%) {high} high-risk \
                 {high_noun} ke paas hai. Pehle {first} se wasooli karein aur in customers ko naya \
                 udhaar filhaal rok dein."
            ),
            (Language::RomanUrdu, Situation::NotableRisk) => format!(
                "{total} mein se {at_risk} ({pct}%) high-risk customers ke paas hai. Is hafte \
                 {flagged} flagged {flagged_noun} se raabta karein, {first} se shuru karein."
            ),
            (Language::RomanUrdu, Situation::MinorRisk) => format!(
                "Cash flow theek hai. {total} mein se sirf {at_risk} high-risk customers ke paas \
                 hai; {flagged} flagged {flagged_noun} ko yaad-dihani bhej dein."
            ),
            (Language::RomanUrdu, Situation::SlowPayers) => format!(
                "Cash flow theek hai, lekin {flagged} {flagged_noun} der se ada kar rahe hain. \
                 Ek narm yaad-dihani se {total} waqt par wasool ho jayega."
            ),
            (Language::RomanUrdu, Situation::Healthy) => format!(
                "Cash flow behtareen hai. Saara {total} bharosemand customers ke paas hai."
            ),
        }
    }
}

impl InsightGenerator for TemplateInsight {
    fn name(&self) -> &'static str {
        "template"
    }

    fn generate(&self, forecast: &ForecastResult, context: &InsightContext<'_>) -> KhataResult<String> {
        Ok(Self::render(forecast, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::CustomerAtRisk;
    use crate::risk::RiskTier;

    fn at_risk(name: &str, tier: RiskTier, due: f64) -> CustomerAtRisk {
        CustomerAtRisk {
            customer_id: 1,
            customer_name: name.into(),
            aitbaar_score: 20,
            tier,
            amount_due: due,
            risk_reason: "2 overdue payments".into(),
            overdue_by_days: 12,
            avg_repayment_days: 40,
        }
    }

    fn ctx(language: Language) -> InsightContext<'static> {
        InsightContext {
            shop_name: "Khan General Store",
            language,
        }
    }

    #[test]
    fn empty_book_is_clear() {
        let text = TemplateInsight::render(&ForecastResult::empty(), &ctx(Language::English));
        assert!(text.contains("clear"));
    }

    #[test]
    fn shortage_mentions_amounts_and_first_customer() {
        let forecast = ForecastResult {
            total_outstanding: 10_000.0,
            at_risk_amount: 4_000.0,
            shortage_warning: true,
            customers_at_risk: vec![at_risk("Imran Butt", RiskTier::HighRisk, 4_000.0)],
            upcoming_collections: vec![],
        };
        let en = TemplateInsight::render(&forecast, &ctx(Language::English));
        assert!(en.contains("Rs. 4,000"));
        assert!(en.contains("Rs. 10,000"));
        assert!(en.contains("40%"));
        assert!(en.contains("Imran Butt"));

        let ur = TemplateInsight::render(&forecast, &ctx(Language::RomanUrdu));
        assert!(ur.contains("Cash ki kami"));
        assert!(ur.contains("Imran Butt"));
    }

    #[test]
    fn cautious_only_book_reads_as_slow_payers() {
        let forecast = ForecastResult {
            total_outstanding: 5_000.0,
            at_risk_amount: 0.0,
            shortage_warning: false,
            customers_at_risk: vec![at_risk("Usman Ali", RiskTier::Cautious, 1_500.0)],
            upcoming_collections: vec![],
        };
        let text = TemplateInsight::render(&forecast, &ctx(Language::English));
        assert!(text.contains("1 customer is paying slowly"));
    }

    #[test]
    fn counts_agree_with_their_nouns() {
        let one = ForecastResult {
            total_outstanding: 10_000.0,
            at_risk_amount: 4_000.0,
            shortage_warning: true,
            customers_at_risk: vec![at_risk("Imran Butt", RiskTier::HighRisk, 4_000.0)],
            upcoming_collections: vec![],
        };
        let en = TemplateInsight::render(&one, &ctx(Language::English));
        assert!(en.contains("1 high-risk customer."), "{en}");
        let ur = TemplateInsight::render(&one, &ctx(Language::RomanUrdu));
        assert!(ur.contains("1 high-risk customer ke paas"), "{ur}");

        let two = ForecastResult {
            total_outstanding: 20_000.0,
            at_risk_amount: 4_000.0,
            shortage_warning: false,
            customers_at_risk: vec![
                at_risk("Imran Butt", RiskTier::HighRisk, 3_000.0),
                at_risk("Tariq Mehmood", RiskTier::HighRisk, 1_000.0),
            ],
            upcoming_collections: vec![],
        };
        let en = TemplateInsight::render(&two, &ctx(Language::English));
        assert!(en.contains("the 2 flagged customers this week"), "{en}");

        let slow = ForecastResult {
            total_outstanding: 5_000.0,
            at_risk_amount: 0.0,
            shortage_warning: false,
            customers_at_risk: vec![
                at_risk("Usman Ali", RiskTier::Cautious, 1_500.0),
                at_risk("Zeeshan Malik", RiskTier::Cautious, 500.0),
            ],
            upcoming_collections: vec![],
        };
        let en = TemplateInsight::render(&slow, &ctx(Language::English));
        assert!(en.contains("2 customers are paying slowly"), "{en}");
        assert!(!en.contains("1 customers"));
    }
}
