//! The analytics engine: the request/response surface of khata-core.
//!
//! DATA FLOW (fixed, documented):
//!   1. Ledger snapshot      (supplied by the caller or a LedgerReader)
//!   2. Score engine         (per customer)
//!   3. Forecast / Community (consume scores; tiers via RiskTier only)
//!   4. Insight              (formats the forecast)
//!
//! RULES:
//!   - Every operation is a pure function of its inputs and the config.
//!   - The engine holds no mutable state; one instance may serve
//!     concurrent requests from many shops.
//!   - Per-request identity travels in `RequestContext`, never in globals.
//!   - A request that reaches outside the caller's own shop gets an
//!     empty answer, or `CustomerNotFound` when it names a customer,
//!     never another shop's data.

use crate::{
    community::{aggregate, flags_from_snapshots, CommunityRiskReport, CustomerFlag},
    config::EngineConfig,
    error::{KhataError, KhataResult},
    forecast::{build_forecast, ForecastResult},
    insight::{InsightContext, InsightGenerator, Language, TemplateInsight},
    ledger::{CustomerLedger, LedgerReader, ShopSnapshot},
    reminder::{compose_reminder, MessageRequest, ReminderMessage},
    risk::RiskTier,
    score::{compute_score, score_history, ScoreResult},
    types::{Amount, CustomerId, ShopId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Who is asking, and as of when. Passed explicitly on every call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestContext {
    pub shop_id: ShopId,
    pub shop_name: String,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastResponse {
    #[serde(flatten)]
    pub forecast: ForecastResult,
    pub ai_insight: String,
}

/// One row of a shop's customer list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSummary {
    pub customer_id: CustomerId,
    pub name: String,
    pub phone: String,
    pub area: Option<String>,
    pub aitbaar_score: u8,
    pub tier: RiskTier,
    pub total_due: Amount,
    pub total_transactions: usize,
}

pub struct KhataEngine {
    config: EngineConfig,
    insight_backend: Option<Box<dyn InsightGenerator>>,
}

impl KhataEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            insight_backend: None,
        }
    }

    /// Route insight text through `backend`, keeping the template as fallback.
    pub fn with_insight_backend(mut self, backend: Box<dyn InsightGenerator>) -> Self {
        self.insight_backend = Some(backend);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── GET score ──────────────────────────────────────────────

    pub fn score(&self, ctx: &RequestContext, ledger: &CustomerLedger) -> KhataResult<ScoreResult> {
        if ledger.customer.shop_id != ctx.shop_id {
            log::warn!(
                "Shop {} asked to score customer {} of shop {}",
                ctx.shop_id,
                ledger.customer.customer_id,
                ledger.customer.shop_id
            );
            return Err(KhataError::CustomerNotFound {
                customer_id: ledger.customer.customer_id,
            });
        }
        Ok(compute_score(ledger, ctx.as_of, &self.config.score))
    }

    /// The shop's customers with score and balance, largest due first.
    pub fn customer_summaries(&self, ctx: &RequestContext, snapshot: &ShopSnapshot) -> Vec<CustomerSummary> {
        if !owns(ctx, snapshot) {
            return Vec::new();
        }
        let mut rows: Vec<CustomerSummary> = snapshot
            .customers
            .iter()
            .map(|ledger| {
                let history = ledger.history();
                let score = score_history(&history, ctx.as_of, &self.config.score);
                CustomerSummary {
                    customer_id: ledger.customer.customer_id,
                    name: ledger.customer.name.clone(),
                    phone: ledger.customer.phone.clone(),
                    area: ledger.customer.area.clone(),
                    aitbaar_score: score.score,
                    tier: score.tier,
                    total_due: history.amount_due(),
                    total_transactions: ledger.transactions.len(),
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_due
                .partial_cmp(&a.total_due)
                .unwrap_or(Ordering::Equal)
                .then(a.customer_id.cmp(&b.customer_id))
        });
        rows
    }

    // ── GET forecast ───────────────────────────────────────────

    pub fn forecast(&self, ctx: &RequestContext, snapshot: &ShopSnapshot) -> ForecastResponse {
        let forecast = if owns(ctx, snapshot) {
            build_forecast(snapshot, ctx.as_of, &self.config)
        } else {
            ForecastResult::empty()
        };
        let ai_insight = self.insight(ctx, &forecast);
        ForecastResponse {
            forecast,
            ai_insight,
        }
    }

    pub fn forecast_for_shop(&self, reader: &dyn LedgerReader, ctx: &RequestContext) -> KhataResult<ForecastResponse> {
        let snapshot = reader.shop_snapshot(ctx.shop_id)?;
        Ok(self.forecast(ctx, &snapshot))
    }

    fn insight(&self, ctx: &RequestContext, forecast: &ForecastResult) -> String {
        let context = InsightContext {
            shop_name: &ctx.shop_name,
            language: ctx.language,
        };
        if let Some(backend) = &self.insight_backend {
            match backend.generate(forecast, &context) {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => log::warn!("Insight backend '{}' returned no text; using template", backend.name()),
                Err(e) => log::warn!("Insight backend '{}' failed: {e}; using template", backend.name()),
            }
        }
        TemplateInsight::render(forecast, &context)
    }

    // ── GET community-risk ─────────────────────────────────────

    /// Aggregate pre-scored flags for the requesting shop.
    pub fn community_risk(
        &self,
        ctx: &RequestContext,
        your_areas: &BTreeSet<String>,
        flags: &[CustomerFlag],
    ) -> CommunityRiskReport {
        aggregate(ctx.shop_id, your_areas, flags, &self.config.community)
    }

    /// Score other shops' visible customers, then aggregate. The
    /// requester's areas come from its own customers.
    pub fn community_risk_from_snapshots(
        &self,
        ctx: &RequestContext,
        own: &ShopSnapshot,
        others: &[ShopSnapshot],
    ) -> CommunityRiskReport {
        let your_areas = if owns(ctx, own) {
            own.areas()
        } else {
            BTreeSet::new()
        };
        if your_areas.is_empty() {
            return CommunityRiskReport::empty(&your_areas);
        }
        let flags = flags_from_snapshots(others, ctx.as_of, &self.config.score);
        self.community_risk(ctx, &your_areas, &flags)
    }

    pub fn community_risk_for_shop(
        &self,
        reader: &dyn LedgerReader,
        ctx: &RequestContext,
    ) -> KhataResult<CommunityRiskReport> {
        let own = reader.shop_snapshot(ctx.shop_id)?;
        let areas = own.areas();
        if areas.is_empty() {
            return Ok(CommunityRiskReport::empty(&areas));
        }
        let others = reader.community_snapshots(&areas, ctx.shop_id)?;
        Ok(self.community_risk_from_snapshots(ctx, &own, &others))
    }

    // ── POST message ───────────────────────────────────────────

    pub fn reminder(
        &self,
        ctx: &RequestContext,
        snapshot: &ShopSnapshot,
        request: &MessageRequest,
    ) -> KhataResult<ReminderMessage> {
        let ledger = owns(ctx, snapshot)
            .then(|| snapshot.customer(request.customer_id))
            .flatten()
            .ok_or(KhataError::CustomerNotFound {
                customer_id: request.customer_id,
            })?;
        let amount_due = ledger.amount_due();
        Ok(ReminderMessage {
            customer_id: ledger.customer.customer_id,
            customer_name: ledger.customer.name.clone(),
            amount_due,
            language: request.language,
            message: compose_reminder(&ledger.customer.name, amount_due, &ctx.shop_name, request.language),
        })
    }

    pub fn reminder_for_shop(
        &self,
        reader: &dyn LedgerReader,
        ctx: &RequestContext,
        request: &MessageRequest,
    ) -> KhataResult<ReminderMessage> {
        let snapshot = reader.shop_snapshot(ctx.shop_id)?;
        self.reminder(ctx, &snapshot, request)
    }
}

fn owns(ctx: &RequestContext, snapshot: &ShopSnapshot) -> bool {
    if snapshot.shop.shop_id == ctx.shop_id {
        return true;
    }
    log::warn!(
        "Shop {} asked about shop {}'s ledger; answering empty",
        ctx.shop_id,
        snapshot.shop.shop_id
    );
    false
}
