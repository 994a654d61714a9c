//! Constant-product simulator (Uniswap V2 and the Sushi fork)
//!
//! Reserves are read at the pinned block, then the swap is computed locally
//! with the exact integer formula of the on-chain `getAmountOut`:
//!
//!     in_with_fee = 997 * amount_in
//!     amount_out  = in_with_fee * reserve_out / (reserve_in * 1000 + in_with_fee)
//!
//! Multiply-before-divide on U256 keeps the result bit-identical to the
//! contract; the 997/1000 factor is the 0.3% swap fee.

use alloy::eips::BlockId;
use alloy::primitives::U256;
use alloy::providers::DynProvider;

use crate::contracts::IUniswapV2Pair;
use crate::error::{BotError, BotResult};
use crate::exchange::sim_call;
use crate::types::{Pool, Token};

/// Pure constant-product output. Zero in, or an empty side, pays zero.
pub fn v2_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return U256::ZERO;
    }
    let in_with_fee = amount_in * U256::from(997);
    let numerator = in_with_fee * reserve_out;
    let denominator = reserve_in * U256::from(1000) + in_with_fee;
    numerator / denominator
}

/// Read reserves at `block`, orient them to the swap direction and quote.
pub async fn amount_out_at(
    provider: &DynProvider,
    pool: &Pool,
    token_in: &Token,
    amount_in_wei: U256,
    block: BlockId,
) -> BotResult<U256> {
    let pair = IUniswapV2Pair::new(pool.address, provider.clone());

    let token0 = sim_call(pool.address, pair.token0().block(block).call()).await?;
    let reserves = sim_call(pool.address, pair.getReserves().block(block).call()).await?;

    let reserve0 = U256::from(reserves.reserve0.to::<u128>());
    let reserve1 = U256::from(reserves.reserve1.to::<u128>());

    let (reserve_in, reserve_out) = if token0 == token_in.address {
        (reserve0, reserve1)
    } else if pool.contains_token(token_in.address) {
        (reserve1, reserve0)
    } else {
        return Err(BotError::simulation(
            pool.address,
            format!("token {} not in pool", token_in.address),
        ));
    };

    Ok(v2_amount_out(amount_in_wei, reserve_in, reserve_out))
}
