//! Strategy loops
//!
//! Four drivers over the same engine, differing only in trigger and pool
//! lifecycle:
//!     scan.rs    — every new block, static universe
//!     fresh.rs   — every new block, universe reloaded every 200 blocks
//!     snipe.rs   — pending competitor txs from the mempool
//!     watcher.rs — blocks whose receipts carry Transfer/LOG_SWAP events
//!
//! Author: AI-Generated
//! Created: 2026-07-16

pub mod fresh;
pub mod scan;
pub mod snipe;
pub mod watcher;

pub use fresh::StrategyFresh;
pub use scan::StrategyScan;
pub use snipe::StrategySnipe;
pub use watcher::StrategyWatcher;

use tracing::warn;

use crate::config::HEARTBEAT_BLOCKS;
use crate::error::BotResult;
use crate::ethereum::Eth;
use crate::notify::Notifier;

/// Node gas quote with the strategy multiplier applied. One retry on a
/// transient failure; a second failure skips the cycle.
pub(crate) async fn cycle_gas_price(eth: &Eth, multiplier: f64) -> BotResult<u128> {
    let quote = match eth.gas_price().await {
        Ok(quote) => quote,
        Err(e) => {
            warn!("gas price fetch failed, retrying once: {e}");
            eth.gas_price().await?
        }
    };
    Ok(apply_multiplier(quote, multiplier))
}

pub(crate) fn apply_multiplier(gas_price: u128, multiplier: f64) -> u128 {
    (gas_price as f64 * multiplier) as u128
}

/// Liveness ping every HEARTBEAT_BLOCKS.
pub(crate) async fn maybe_heartbeat(notifier: &Notifier, strategy: &str, block: u64) {
    if block % HEARTBEAT_BLOCKS == 0 {
        notifier.heartbeat(strategy, block).await;
    }
}
