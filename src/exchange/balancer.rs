//! Balancer weighted-pool simulator
//!
//! State per side is (balance, denormalized weight) plus the pool swap fee.
//! The output is whatever the pool's own `calcOutGivenIn` returns for that
//! state — the bot never re-implements the fixed-point pow. All five reads
//! and the quote are pinned to the same block.

use alloy::eips::BlockId;
use alloy::primitives::U256;
use alloy::providers::DynProvider;

use crate::contracts::IBPool;
use crate::error::BotResult;
use crate::exchange::sim_call;
use crate::types::{Pool, Token};

pub async fn amount_out_at(
    provider: &DynProvider,
    pool: &Pool,
    token_in: &Token,
    token_out: &Token,
    amount_in_wei: U256,
    block: BlockId,
) -> BotResult<U256> {
    let bpool = IBPool::new(pool.address, provider.clone());

    let balance_in = sim_call(
        pool.address,
        bpool.getBalance(token_in.address).block(block).call(),
    )
    .await?;
    let balance_out = sim_call(
        pool.address,
        bpool.getBalance(token_out.address).block(block).call(),
    )
    .await?;
    let weight_in = sim_call(
        pool.address,
        bpool
            .getDenormalizedWeight(token_in.address)
            .block(block)
            .call(),
    )
    .await?;
    let weight_out = sim_call(
        pool.address,
        bpool
            .getDenormalizedWeight(token_out.address)
            .block(block)
            .call(),
    )
    .await?;
    let swap_fee = sim_call(pool.address, bpool.getSwapFee().block(block).call()).await?;

    sim_call(
        pool.address,
        bpool
            .calcOutGivenIn(
                balance_in,
                weight_in,
                balance_out,
                weight_out,
                amount_in_wei,
                swap_fee,
            )
            .block(block)
            .call(),
    )
    .await
}
