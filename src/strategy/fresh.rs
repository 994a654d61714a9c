//! FRESH — scan with a periodically refreshed pool universe.
//!
//! Subgraph-discovered pools go stale; every 200 blocks the universe is
//! reloaded, paths re-enumerated and the consecutive gate reset. Because
//! freshly-listed pools carry the most mispricing (and the most noise),
//! dispatch is gated on C consecutive fillable blocks and the gas price
//! gets a competitive floor after the multiplier.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use tracing::{error, info, warn};

use crate::arbitrage::ArbitrageEngine;
use crate::config::{Config, POOL_RELOAD_BLOCKS};
use crate::ethereum::Eth;
use crate::notify::Notifier;
use crate::path::PathFinder;
use crate::pool::PoolLoader;
use crate::strategy::cycle_gas_price;
use crate::types::ArbitragePath;

pub struct StrategyFresh {
    eth: Eth,
    config: Config,
    loader: PoolLoader,
    engine: ArbitrageEngine,
    notifier: Arc<Notifier>,
}

impl StrategyFresh {
    pub fn new(
        eth: Eth,
        config: Config,
        loader: PoolLoader,
        engine: ArbitrageEngine,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            eth,
            config,
            loader,
            engine,
            notifier,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut paths = self.reload().await?;
        let mut current_block = self.eth.block_number().await?;
        let mut counter: u64 = 1;

        loop {
            // Roughly every 40 minutes: new universe, new paths, gate
            // streaks no longer meaningful.
            if counter % POOL_RELOAD_BLOCKS == 0 {
                paths = self.reload().await?;
                self.engine.reset_gate();
                self.notifier.heartbeat("fresh", current_block).await;
            }

            let latest_block = self.eth.wait_new_block(current_block).await;
            current_block = latest_block;
            let started = Instant::now();

            let gas_price = match cycle_gas_price(&self.eth, self.config.gas_multiplier).await {
                Ok(price) => price.max(self.config.gas_floor_gwei as u128 * 1_000_000_000),
                Err(e) => {
                    warn!("skipping block {latest_block}: {e}");
                    counter += 1;
                    continue;
                }
            };

            let report = self.engine.run_cycle(&paths, latest_block, gas_price).await;

            counter += 1;
            info!(
                "--- Ended in {:.2}s --- (Gas: {} Gwei, {} fillable, {} dispatched)",
                started.elapsed().as_secs_f64(),
                gas_price / 1_000_000_000,
                report.fillable.len(),
                report.dispatched
            );
        }
    }

    /// Fetch pools and re-enumerate paths, retrying transient failures on
    /// the spot. Invariant violations abort: the enumerator produced a
    /// malformed path and a restart is the only safe recovery.
    async fn reload(&self) -> Result<Vec<Arc<ArbitragePath>>> {
        loop {
            let started = Instant::now();
            match self.load_once().await {
                Ok(paths) => {
                    info!(
                        "Finished fetching pools & detecting paths ({:.1}s, {} paths)",
                        started.elapsed().as_secs_f64(),
                        paths.len()
                    );
                    return Ok(paths);
                }
                Err(e) if e.is_fatal() => bail!("fatal during reload: {e}"),
                Err(e) => {
                    error!("Exception loading arbitrage paths: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                }
            }
        }
    }

    async fn load_once(&self) -> crate::error::BotResult<Vec<Arc<ArbitragePath>>> {
        let pools = self.loader.load_all_pools().await?;
        let finder = PathFinder::new(&pools, self.config.weth_address, self.config.max_depth);
        finder.find_all_paths()
    }
}
