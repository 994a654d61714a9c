//! FRESH strategy binary
//!
//! Like scan, but the pool universe is reloaded every 200 blocks and
//! dispatch is gated on N consecutive fillable blocks per path.
//!
//! Usage:
//!   cargo run --bin fresh -- --consecutive 2 [--send-tx]

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
use printer_bot::strategy::StrategyFresh;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fresh", about = "Arbitrage a periodically refreshed pool universe")]
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
    info!("--------------- ARBITRAGING FRESH POOLS -------------------");
    info!("-----------------------------------------------------------");
    info!("Consecutive Arbitrage: {}", args.consecutive);
    info!("Gas Multiplier: {}", args.common.gas_multiplier);
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
    StrategyFresh::new(eth, config, loader, engine, notifier)
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
