//! WATCH — evaluate only where this block actually traded.
//!
//! Every new block's receipts are filtered for ERC20 `Transfer` and
//! Balancer `LOG_SWAP` events; the tokens they touch select candidate
//! paths through the paths-by-token index. Dispatch is gated on C
//! consecutive fillable blocks, and once a path goes positive the watcher
//! narrows to it alone until the gate fills or the edge disappears.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use alloy::primitives::{b256, Address, B256};
use alloy::rpc::types::Log;
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

/// keccak("Transfer(address,address,uint256)")
const TRANSFER_TOPIC: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// keccak("LOG_SWAP(address,address,address,uint256,uint256)")
const LOG_SWAP_TOPIC: B256 =
    b256!("908fb5ee8f16c6bc9bc3690973819f32a4d4b10188134543c88706e0e1d43378");

type PathIndex = HashMap<Address, Vec<Arc<ArbitragePath>>>;

pub struct StrategyWatcher {
    eth: Eth,
    config: Config,
    loader: PoolLoader,
    engine: ArbitrageEngine,
    notifier: Arc<Notifier>,
    consecutive: u32,
}

impl StrategyWatcher {
    pub fn new(
        eth: Eth,
        config: Config,
        loader: PoolLoader,
        engine: ArbitrageEngine,
        notifier: Arc<Notifier>,
        consecutive: u32,
    ) -> Self {
        Self {
            eth,
            config,
            loader,
            engine,
            notifier,
            consecutive,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut index = self.reload().await?;
        let mut current_block = self.eth.block_number().await?;
        let mut counter: u64 = 1;

        loop {
            if counter % POOL_RELOAD_BLOCKS == 0 {
                index = self.reload().await?;
                self.engine.reset_gate();
                self.notifier.heartbeat("watcher", current_block).await;
            }

            let latest_block = self.eth.wait_new_block(current_block).await;
            current_block = latest_block;
            counter += 1;
            let started = Instant::now();

            let logs = match self
                .eth
                .logs_at_block(latest_block, vec![TRANSFER_TOPIC, LOG_SWAP_TOPIC])
                .await
            {
                Ok(logs) => logs,
                Err(e) => {
                    warn!("log fetch failed for block {latest_block}: {e}");
                    continue;
                }
            };

            let watched = watched_tokens(&logs, self.config.weth_address);
            if watched.is_empty() {
                continue;
            }

            // Union of the paths touching any watched token, deduped.
            let mut seen_ids: HashSet<String> = HashSet::new();
            let mut targets: Vec<Arc<ArbitragePath>> = Vec::new();
            for token in &watched {
                for path in index.get(token).into_iter().flatten() {
                    if seen_ids.insert(path.path_id()) {
                        targets.push(path.clone());
                    }
                }
            }
            if targets.is_empty() {
                continue;
            }

            let gas_price = match cycle_gas_price(&self.eth, self.config.gas_multiplier).await {
                Ok(price) => price,
                Err(e) => {
                    warn!("skipping block {latest_block}: {e}");
                    continue;
                }
            };

            let report = self
                .engine
                .run_cycle(&targets, latest_block, gas_price)
                .await;

            info!(
                "--- {} Ended in {:.2}s --- ({} watched tokens, {} paths, {} fillable)",
                latest_block,
                started.elapsed().as_secs_f64(),
                watched.len(),
                targets.len(),
                report.fillable.len()
            );

            // A positive path with an unfilled gate: follow it block by
            // block instead of waiting for its tokens to trade again.
            if self.consecutive > 1 && report.dispatched == 0 {
                if let Some(plan) = report.fillable.first() {
                    current_block = self
                        .focus(plan.path.clone(), current_block, gas_price)
                        .await;
                }
            }
        }
    }

    /// Re-evaluate one path on consecutive blocks until the gate fires or
    /// the opportunity disappears. Returns the last block observed.
    async fn focus(
        &mut self,
        path: Arc<ArbitragePath>,
        mut current_block: u64,
        gas_price: u128,
    ) -> u64 {
        info!(
            "Focusing on one path until we find {} consecutive arbs",
            self.consecutive
        );
        for _ in 0..self.consecutive.saturating_sub(1) {
            let latest_block = self.eth.wait_new_block(current_block).await;
            current_block = latest_block;
            let report = self
                .engine
                .run_cycle(std::slice::from_ref(&path), latest_block, gas_price)
                .await;
            if report.fillable.is_empty() {
                info!("Could not find subsequent arbitrage");
                break;
            }
            if report.dispatched > 0 {
                break;
            }
        }
        current_block
    }

    async fn reload(&self) -> Result<PathIndex> {
        loop {
            let started = Instant::now();
            match self.load_once().await {
                Ok(index) => {
                    info!(
                        "Finished fetching pools & detecting paths ({:.1}s, {} indexed tokens)",
                        started.elapsed().as_secs_f64(),
                        index.len()
                    );
                    return Ok(index);
                }
                Err(e) if e.is_fatal() => bail!("fatal during reload: {e}"),
                Err(e) => {
                    error!("Exception loading arbitrage paths: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                }
            }
        }
    }

    async fn load_once(&self) -> crate::error::BotResult<PathIndex> {
        let pools = self.loader.load_all_pools().await?;
        let finder = PathFinder::new(&pools, self.config.weth_address, self.config.max_depth);
        let paths = finder.find_all_paths()?;
        Ok(PathFinder::paths_by_token(&paths))
    }
}

/// Token addresses worth re-evaluating after this block.
///
/// Balancer swaps name their tokens in the indexed topics. Transfer events
/// name only the token contract (the log address); a single transfer is
/// any unrelated payment, so those only count when one transaction moved
/// two or more distinct non-WETH tokens — the shape of a swap.
fn watched_tokens(logs: &[Log], weth: Address) -> HashSet<Address> {
    let mut watched: HashSet<Address> = HashSet::new();
    let mut transfers_by_tx: HashMap<B256, HashSet<Address>> = HashMap::new();

    for log in logs {
        let topic0 = log.topic0();
        if topic0 == Some(&LOG_SWAP_TOPIC) {
            for topic in log.topics().iter().skip(1) {
                watched.insert(Address::from_word(*topic));
            }
        } else if topic0 == Some(&TRANSFER_TOPIC) && log.address() != weth {
            if let Some(tx_hash) = log.transaction_hash {
                transfers_by_tx
                    .entry(tx_hash)
                    .or_default()
                    .insert(log.address());
            }
        }
    }

    for (_, tokens) in transfers_by_tx {
        if tokens.len() > 1 {
            watched.extend(tokens);
        }
    }
    watched
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes, LogData};

    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
    const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

    fn transfer_log(token: Address, tx: B256) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: token,
                data: LogData::new_unchecked(
                    vec![TRANSFER_TOPIC, B256::ZERO, B256::ZERO],
                    Bytes::new(),
                ),
            },
            transaction_hash: Some(tx),
            ..Default::default()
        }
    }

    fn balancer_log(token_in: Address, token_out: Address) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: address!("5555555555555555555555555555555555555555"),
                data: LogData::new_unchecked(
                    vec![
                        LOG_SWAP_TOPIC,
                        B256::ZERO, // caller
                        token_in.into_word(),
                        token_out.into_word(),
                    ],
                    Bytes::new(),
                ),
            },
            transaction_hash: Some(B256::from([9u8; 32])),
            ..Default::default()
        }
    }

    #[test]
    fn test_balancer_swap_tokens_watched() {
        let watched = watched_tokens(&[balancer_log(DAI, USDC)], WETH);
        assert!(watched.contains(&DAI));
        assert!(watched.contains(&USDC));
    }

    #[test]
    fn test_single_transfer_is_not_a_swap() {
        let tx = B256::from([1u8; 32]);
        let watched = watched_tokens(&[transfer_log(DAI, tx)], WETH);
        assert!(watched.is_empty());
    }

    #[test]
    fn test_multi_token_transfer_tx_is_watched() {
        let tx = B256::from([1u8; 32]);
        let watched = watched_tokens(&[transfer_log(DAI, tx), transfer_log(USDC, tx)], WETH);
        assert!(watched.contains(&DAI));
        assert!(watched.contains(&USDC));
    }

    #[test]
    fn test_weth_transfers_ignored() {
        let tx = B256::from([1u8; 32]);
        let watched = watched_tokens(&[transfer_log(WETH, tx), transfer_log(DAI, tx)], WETH);
        // Only one non-WETH token in the tx: not a swap shape.
        assert!(watched.is_empty());
    }

    #[test]
    fn test_transfers_in_different_txs_not_grouped() {
        let watched = watched_tokens(
            &[
                transfer_log(DAI, B256::from([1u8; 32])),
                transfer_log(USDC, B256::from([2u8; 32])),
            ],
            WETH,
        );
        assert!(watched.is_empty());
    }
}
