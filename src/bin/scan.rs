//! SCAN strategy binary
//!
//! Loads the pool universe once, enumerates every cyclic path and
//! re-evaluates all of them on each new block.
//!
//! Usage:
//!   cargo run --bin scan -- --min-amount 3.0 --max-amount 6.0 [--send-tx]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use printer_bot::arbitrage::{ArbitrageEngine, EvalParams, Evaluator};
use printer_bot::config::{CommonArgs, Config};
use printer_bot::ethereum::Eth;
use printer_bot::exchange::ChainQuoter;
use printer_bot::notify::Notifier;
use printer_bot::path::PathFinder;
use printer_bot::pool::PoolLoader;
use printer_bot::printer::Printer;
use printer_bot::strategy::StrategyScan;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "scan", about = "Scan all enumerated paths on every new block")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.common.debug);

    info!("-----------------------------------------------------------");
    info!("------------------ SCANNING SOME ARBS ---------------------");
    info!("-----------------------------------------------------------");
    info!("Gas Multiplier: {}", args.common.gas_multiplier);
    info!("Max Block Allowed: {}", args.common.max_block);
    info!("Sending Transactions on-chain: {}", args.common.send_tx);

    let config = Config::load(&args.common)?;
    let eth = Eth::connect(&config).await?;
    let notifier = Arc::new(Notifier::new(&config));
    let weth = config.weth_token();

    let pools = PoolLoader::new(config.clone()).load_all_pools().await?;
    let paths = PathFinder::new(&pools, config.weth_address, config.max_depth).find_all_paths()?;

    let printer = Arc::new(Printer::new(eth.clone(), &config, notifier.clone())?);
    let evaluator = Evaluator::new(
        Arc::new(ChainQuoter::new(eth.provider())),
        weth.clone(),
        EvalParams::from_config(&config, &weth),
    );
    let engine = ArbitrageEngine::new(evaluator, printer, notifier.clone(), weth, None);

    StrategyScan::new(eth, engine, paths, notifier, config.gas_multiplier)
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
