//! Printer Bot Library
//!
//! Cyclic WETH arbitrage across Uniswap V2, SushiSwap and Balancer
//! weighted pools, executed atomically through a pre-deployed printer
//! contract. Four strategy binaries (scan, fresh, snipe, watcher) drive
//! the same evaluate-and-dispatch core with different triggers.
//!
//! Author: AI-Generated
//! Created: 2026-07-12

pub mod arbitrage;
pub mod config;
pub mod contracts;
pub mod error;
pub mod ethereum;
pub mod exchange;
pub mod mempool;
pub mod notify;
pub mod path;
pub mod pool;
pub mod printer;
pub mod strategy;
pub mod types;

// Re-export commonly used types
pub use config::{CommonArgs, Config};
pub use error::{BotError, BotResult};
pub use types::{ArbitragePath, ArbitragePlan, ConnectingPath, Pool, PoolKind, Token};
