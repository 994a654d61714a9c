//! SCAN — evaluate the full enumerated path set on every new block.
//!
//! The universe is loaded once at startup; the loop is wait-block,
//! gas-quote, evaluate, dispatch. Dispatches are ungated.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, warn};

use crate::arbitrage::ArbitrageEngine;
use crate::ethereum::Eth;
use crate::notify::Notifier;
use crate::strategy::{cycle_gas_price, maybe_heartbeat};
use crate::types::ArbitragePath;

pub struct StrategyScan {
    eth: Eth,
    engine: ArbitrageEngine,
    paths: Vec<Arc<ArbitragePath>>,
    notifier: Arc<Notifier>,
    gas_multiplier: f64,
}

impl StrategyScan {
    pub fn new(
        eth: Eth,
        engine: ArbitrageEngine,
        paths: Vec<Arc<ArbitragePath>>,
        notifier: Arc<Notifier>,
        gas_multiplier: f64,
    ) -> Self {
        Self {
            eth,
            engine,
            paths,
            notifier,
            gas_multiplier,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!("SCAN starting over {} paths", self.paths.len());
        let mut current_block = self.eth.block_number().await?;

        loop {
            let latest_block = self.eth.wait_new_block(current_block).await;
            current_block = latest_block;
            maybe_heartbeat(&self.notifier, "scan", latest_block).await;

            let started = Instant::now();
            let gas_price = match cycle_gas_price(&self.eth, self.gas_multiplier).await {
                Ok(price) => price,
                Err(e) => {
                    warn!("skipping block {latest_block}: {e}");
                    continue;
                }
            };

            let report = self
                .engine
                .run_cycle(&self.paths, latest_block, gas_price)
                .await;

            info!(
                "--- Ended in {:.2}s --- (Gas: {} Gwei, {} fillable, {} dispatched)",
                started.elapsed().as_secs_f64(),
                gas_price / 1_000_000_000,
                report.fillable.len(),
                report.dispatched
            );
        }
    }
}
