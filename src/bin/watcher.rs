//! WATCH strategy binary
//!
//! Evaluates only the paths whose tokens actually traded in each new
//! block, with consecutive-block gating before any dispatch.
//!
//! Usage:
//!   cargo run --bin watcher -- --consecutive 2 [--send-tx]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use printer_bot::arbitrage::{ArbitrageEngine, ConsecutiveGate, EvalParams, Evaluator};
use printer_bot::config::{CommonArgs, Config};
use printer_bot::ethereum::Eth;
use printer_bot::exchange::ChainQuoter;
use printer_bot::notify::Notifier;
use printer_bot::pool::PoolLoader;
use printer_bot::printer::Printer;
use printer_bot::strategy::StrategyWatcher;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "watcher", about = "Arbitrage paths whose tokens traded this block")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Trigger tx only after this many consecutive blocks of arbitrage
    #[arg(long, default_value_t = 2)]
    consecutive: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.common.debug);

    info!("-----------------------------------------------------------");
    info!("--------------- WATCHING TRANSFER EVENTS ------------------");
    info!("-----------------------------------------------------------");
    info!("Consecutive Arbitrage: {}", args.consecutive);
    info!("Gas Multiplier: {}", args.common.gas_multiplier);
    info!("Max Block Allowed: {}", args.common.max_block);
    info!("Sending Transactions on-chain: {}", args.common.send_tx);

    let config = Config::load(&args.common)?;
    let eth = Eth::connect(&config).await?;
    let notifier = Arc::new(Notifier::new(&config));
    let weth = config.weth_token();

    let printer = Arc::new(Printer::new(eth.clone(), &config, notifier.clone())?);
    let evaluator = Evaluator::new(
        Arc::new(ChainQuoter::new(eth.provider())),
        weth.clone(),
        EvalParams::from_config(&config, &weth),
    );
    let engine = ArbitrageEngine::new(
        evaluator,
        printer,
        notifier.clone(),
        weth,
        Some(ConsecutiveGate::new(args.consecutive)),
    );

    let loader = PoolLoader::new(config.clone());
    StrategyWatcher::new(eth, config, loader, engine, notifier, args.consecutive)
        .run()
        .await
}

fn init_tracing(debug: bool) {
    let default = if debug { "printer_bot=debug,info" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}
