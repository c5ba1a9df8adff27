use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use couponbook_core::config::{default_ledger_path, EngineConfig};
use couponbook_core::eventbus::EventBus;
use couponbook_core::repositories::JsonFileLedgerRepository;
use couponbook_core::utils::time::current_epoch_millis;
use couponbook_core::{CouponCatalog, CouponId, RedemptionEngine};

mod render;
mod watch;

#[derive(Parser, Debug, Clone)]
#[command(name = "couponbook")]
#[command(author, version, about = "couponbook - redeem coupons with use limits and cooldowns")]
struct Args {
    /// Ledger file. Defaults to <data dir>/couponbook/ledger.json
    #[arg(long, env = "COUPONBOOK_LEDGER")]
    ledger_path: Option<PathBuf>,

    /// Catalog JSON file. The bundled catalog is used if omitted.
    #[arg(long, env = "COUPONBOOK_CATALOG")]
    catalog_path: Option<PathBuf>,

    /// Cooldown refresh period for `watch`, in milliseconds
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List coupons grouped by category
    List {
        /// Only coupons whose title or description contains this text
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Show one coupon's state
    Show { id: CouponId },
    /// Redeem a coupon now
    Redeem { id: CouponId },
    /// Live view with countdowns; type an id to redeem
    Watch {
        #[arg(long, short)]
        search: Option<String>,
    },
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ledger_path: self.ledger_path.clone().unwrap_or_else(default_ledger_path),
            catalog_path: self.catalog_path.clone(),
            tick_interval: Duration::from_millis(self.tick_ms.max(1)),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("couponbook=warn".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {}", e);
    }
}

async fn load_catalog(config: &EngineConfig) -> anyhow::Result<CouponCatalog> {
    match &config.catalog_path {
        Some(path) => CouponCatalog::load(path)
            .await
            .with_context(|| format!("loading catalog from {}", path.display())),
        None => CouponCatalog::builtin().context("loading bundled catalog"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    let config = args.engine_config();
    info!("couponbook starting. ledger={:?}, catalog={:?}", config.ledger_path, config.catalog_path);

    let catalog = Arc::new(load_catalog(&config).await?);
    let repo = Arc::new(JsonFileLedgerRepository::new(&config.ledger_path));
    let bus = EventBus::new();
    let bus_for_ctrlc = bus.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Error waiting for ctrl_c: {:?}", e);
            return;
        }
        info!("Ctrl-C received; shutting down.");
        bus_for_ctrlc.shutdown();
    });
    let mut engine = RedemptionEngine::open(catalog, repo).await.with_event_bus(bus.clone());

    let code = match args.command {
        Command::List { search } => {
            render::print_category_views(&engine.views(current_epoch_millis(), search.as_deref()));
            ExitCode::SUCCESS
        }
        Command::Show { id } => match engine.view(id, current_epoch_millis()) {
            Ok(view) => {
                render::print_view(&view);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", render::describe_error(&e));
                ExitCode::FAILURE
            }
        },
        Command::Redeem { id } => match engine.attempt_redeem(id, current_epoch_millis()).await {
            Ok(snapshot) => {
                render::celebrate(engine.catalog(), id, &snapshot);
                ExitCode::SUCCESS
            }
            Err(e) => {
                if !e.is_gate_failure() {
                    error!("Redeem of coupon {} failed: {:?}", id, e);
                }
                eprintln!("{}", render::describe_error(&e));
                ExitCode::FAILURE
            }
        },
        Command::Watch { search } => {
            watch::run_watch(&mut engine, &bus, config.tick_interval, search).await?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
