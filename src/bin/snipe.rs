//! SNIPE strategy binary
//!
//! Watches the mempool for pending transactions from tracked competitor
//! addresses and races them at their gas price plus one wei.
//!
//! Usage:
//!   cargo run --bin snipe -- [--address 0x...] [--send-tx]
//!
//! Without --address the watch-list comes from pools/snipers.yaml.

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::Result;
use clap::Parser;
use printer_bot::arbitrage::{ArbitrageEngine, EvalParams, Evaluator};
use printer_bot::config::{CommonArgs, Config};
use printer_bot::ethereum::Eth;
use printer_bot::exchange::ChainQuoter;
use printer_bot::mempool::{load_noobs, MempoolScanner, SnipingNoob};
use printer_bot::notify::Notifier;
use printer_bot::path::PathFinder;
use printer_bot::pool::PoolLoader;
use printer_bot::printer::Printer;
use printer_bot::strategy::StrategySnipe;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "snipe", about = "Race tracked arbitrageurs out of the mempool")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Snipe a single arbitrageur address instead of the YAML watch-list
    #[arg(long)]
    address: Option<Address>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.common.debug);

    info!("-----------------------------------------------------------");
    info!("----------------- SNIPING SOME NOOOOOBS -------------------");
    info!("-----------------------------------------------------------");
    if let Some(address) = args.address {
        info!("Sniping Address: {address}");
    }
    info!("Gas Multiplier: {}", args.common.gas_multiplier);
    info!("Sending Transactions on-chain: {}", args.common.send_tx);

    let config = Config::load(&args.common)?;
    let eth = Eth::connect(&config).await?;
    let notifier = Arc::new(Notifier::new(&config));
    let weth = config.weth_token();

    let pools = PoolLoader::new(config.clone()).load_all_pools().await?;
    let paths = PathFinder::new(&pools, config.weth_address, config.max_depth).find_all_paths()?;

    let noobs = match args.address {
        Some(address) => vec![SnipingNoob { address }],
        None => load_noobs(&config.snipers_yaml)?,
    };
    info!("Watching {} noob addresses", noobs.len());
    let scanner = MempoolScanner::new(eth.clone(), noobs, &pools);

    let printer = Arc::new(Printer::new(eth.clone(), &config, notifier.clone())?);
    let evaluator = Evaluator::new(
        Arc::new(ChainQuoter::new(eth.provider())),
        weth.clone(),
        EvalParams::from_config(&config, &weth),
    );
    let engine = ArbitrageEngine::new(evaluator, printer, notifier.clone(), weth, None);

    StrategySnipe::new(eth, engine, scanner, paths, notifier)
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
