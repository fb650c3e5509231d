//! khata-runner: headless runner for the Khata analytics engine.
//!
//! Usage:
//!   khata-runner --db khata.db --shop 1 --as-of 2026-06-30
//!   khata-runner --seed-demo --seed 42 --shop 1
//!   khata-runner --db khata.db --shop 1 --ipc-mode

use anyhow::{Context, Result};
use chrono::NaiveDate;
use khata_core::{
    config::EngineConfig,
    demo::seed_demo_ledger,
    engine::{KhataEngine, RequestContext},
    error::KhataError,
    insight::Language,
    ledger::LedgerReader,
    reminder::MessageRequest,
    store::LedgerStore,
    types::{format_rupees, CustomerId, ShopId},
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    Score {
        customer_id: CustomerId,
    },
    Forecast {
        #[serde(default)]
        language: Option<Language>,
    },
    CommunityRisk,
    Message {
        customer_id: CustomerId,
        #[serde(default)]
        language: Option<Language>,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let shop_id = parse_arg(&args, "--shop", 1 as ShopId);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let seed_demo = args.iter().any(|a| a == "--seed-demo");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let as_of = match flag_value(&args, "--as-of") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("--as-of expects YYYY-MM-DD, got '{raw}'"))?,
        None => chrono::Local::now().date_naive(),
    };

    if !ipc_mode {
        println!("Khata: credit analytics runner");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!("  shop:      {shop_id}");
        println!("  as_of:     {as_of}");
        println!();
    }

    // For :memory: use a named shared-memory URI, one per process.
    let db_effective: String = if db == ":memory:" {
        format!("file:khata_{}?mode=memory&cache=shared", std::process::id())
    } else {
        db.to_string()
    };
    let store = LedgerStore::open(&db_effective)?;
    store.migrate()?;

    if seed_demo {
        let summary = seed_demo_ledger(&store, seed, as_of)?;
        if !ipc_mode {
            println!(
                "Seeded demo ledger (seed {seed}): {} shops, {} customers, {} transactions",
                summary.shop_ids.len(),
                summary.customers,
                summary.transactions
            );
            println!();
        }
    }

    let config = if Path::new(data_dir).is_dir() {
        EngineConfig::load(data_dir)?
    } else {
        log::warn!("Data dir '{data_dir}' not found; using default engine config");
        EngineConfig::default()
    };
    let language = config.insight.default_language;
    let engine = KhataEngine::new(config);

    let shop = store
        .shop(shop_id)?
        .ok_or(KhataError::ShopNotFound { shop_id })?;
    let ctx = RequestContext {
        shop_id,
        shop_name: shop.shop_name,
        as_of,
        language,
    };

    if ipc_mode {
        run_ipc_loop(&engine, &store, &ctx)?;
    } else {
        print_summary(&engine, &store, &ctx)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &KhataEngine, store: &LedgerStore, ctx: &RequestContext) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };
        if matches!(request, IpcRequest::Quit) {
            break;
        }

        match handle_request(engine, store, ctx, request) {
            Ok(response) => writeln!(stdout, "{response}")?,
            Err(e) => {
                log::debug!("Request failed: {e}");
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn handle_request(
    engine: &KhataEngine,
    store: &LedgerStore,
    ctx: &RequestContext,
    request: IpcRequest,
) -> Result<serde_json::Value> {
    let value = match request {
        IpcRequest::Score { customer_id } => {
            let snapshot = store.shop_snapshot(ctx.shop_id)?;
            let ledger = snapshot
                .customer(customer_id)
                .ok_or(KhataError::CustomerNotFound { customer_id })?;
            serde_json::to_value(engine.score(ctx, ledger)?)?
        }
        IpcRequest::Forecast { language } => {
            let ctx = RequestContext {
                language: language.unwrap_or(ctx.language),
                ..ctx.clone()
            };
            serde_json::to_value(engine.forecast_for_shop(store, &ctx)?)?
        }
        IpcRequest::CommunityRisk => serde_json::to_value(engine.community_risk_for_shop(store, ctx)?)?,
        IpcRequest::Message {
            customer_id,
            language,
        } => {
            let request = MessageRequest {
                customer_id,
                language: language.unwrap_or(ctx.language),
            };
            serde_json::to_value(engine.reminder_for_shop(store, ctx, &request)?)?
        }
        IpcRequest::Quit => serde_json::Value::Null,
    };
    Ok(value)
}

fn write_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{err_json}")?;
    stdout.flush()?;
    Ok(())
}

fn print_summary(engine: &KhataEngine, store: &LedgerStore, ctx: &RequestContext) -> Result<()> {
    let snapshot = store.shop_snapshot(ctx.shop_id)?;
    let customers = engine.customer_summaries(ctx, &snapshot);
    let forecast = engine.forecast(ctx, &snapshot);
    let community = engine.community_risk_for_shop(store, ctx)?;

    println!("=== {} ===", ctx.shop_name);
    println!("  customers:        {}", customers.len());
    println!("  outstanding:      {}", format_rupees(forecast.forecast.total_outstanding));
    println!("  at risk:          {}", format_rupees(forecast.forecast.at_risk_amount));
    println!("  shortage warning: {}", forecast.forecast.shortage_warning);
    println!("  collections due:  {}", forecast.forecast.upcoming_collections.len());

    println!();
    println!("=== CUSTOMERS ===");
    if customers.is_empty() {
        println!("  (No customers yet)");
    }
    for c in &customers {
        println!(
            "  {:<20} | Score: {:>3} ({}) | Due: {}",
            c.name,
            c.aitbaar_score,
            c.tier,
            format_rupees(c.total_due)
        );
    }

    println!();
    println!("=== INSIGHT ===");
    println!("  {}", forecast.ai_insight);

    println!();
    println!("=== COMMUNITY RISK ({}) ===", community.your_areas.join(", "));
    if community.community_risks.is_empty() {
        println!("  (No shared defaulters in your areas)");
    }
    for r in &community.community_risks {
        println!(
            "  {:<20} | {} | {} shops | Avg score: {} | Due: {}",
            r.name,
            r.area,
            r.reported_by_shops,
            r.average_aitbaar_score,
            format_rupees(r.total_due_across_shops)
        );
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
