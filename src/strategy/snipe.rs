//! SNIPE — race tracked competitors out of the mempool.
//!
//! Each new pending transaction from a watched address is sliced for pool
//! references; every enumerated path touching one of those pools is
//! re-evaluated at the latest block with the victim's gas price plus one
//! wei, so our transaction orders ahead of theirs. Dispatch is ungated:
//! by the next block the victim will have moved the price.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::arbitrage::ArbitrageEngine;
use crate::config::BLOCK_POLL_INTERVAL;
use crate::ethereum::Eth;
use crate::mempool::MempoolScanner;
use crate::notify::Notifier;
use crate::strategy::maybe_heartbeat;
use crate::types::ArbitragePath;

pub struct StrategySnipe {
    eth: Eth,
    engine: ArbitrageEngine,
    scanner: MempoolScanner,
    paths: Vec<Arc<ArbitragePath>>,
    notifier: Arc<Notifier>,
}

impl StrategySnipe {
    pub fn new(
        eth: Eth,
        engine: ArbitrageEngine,
        scanner: MempoolScanner,
        paths: Vec<Arc<ArbitragePath>>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            eth,
            engine,
            scanner,
            paths,
            notifier,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!(
            "SNIPE starting: {} paths in the racing set",
            self.paths.len()
        );
        loop {
            let latest_block = match self.eth.block_number().await {
                Ok(block) => block,
                Err(e) => {
                    warn!("block number fetch failed: {e}");
                    tokio::time::sleep(BLOCK_POLL_INTERVAL).await;
                    continue;
                }
            };
            maybe_heartbeat(&self.notifier, "snipe", latest_block).await;

            let sniped = match self.scanner.scan().await {
                Ok(sniped) => sniped,
                Err(e) => {
                    warn!("mempool scan failed: {e}");
                    tokio::time::sleep(BLOCK_POLL_INTERVAL).await;
                    continue;
                }
            };

            for pending in sniped {
                let touched: Vec<Arc<ArbitragePath>> = self
                    .paths
                    .iter()
                    .filter(|path| {
                        pending
                            .pools
                            .iter()
                            .any(|pool| path.contains_pool(pool.address))
                    })
                    .cloned()
                    .collect();
                if touched.is_empty() {
                    continue;
                }

                info!(
                    "[Pending Tx: {}] {} paths touch its {} pools",
                    pending.tx_hash,
                    touched.len(),
                    pending.pools.len()
                );
                self.notifier
                    .send_snipe(&format!(
                        "Sniping pending tx {} ({} candidate paths, victim gas {} Gwei)",
                        pending.tx_hash,
                        touched.len(),
                        pending.gas_price / 1_000_000_000
                    ))
                    .await;

                // One wei over the victim: orders directly ahead of them.
                self.engine
                    .run_cycle(&touched, latest_block, pending.gas_price + 1)
                    .await;
            }

            tokio::time::sleep(BLOCK_POLL_INTERVAL).await;
        }
    }
}
