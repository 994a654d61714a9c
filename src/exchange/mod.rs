//! Exchange Simulators
//!
//! One pure quote per pool kind: given an input amount and a pinned block,
//! what does this pool pay out? Constant-product pools (Uniswap V2 and the
//! Sushi fork) are computed locally from on-chain reserves; Balancer
//! weighted pools are quoted through the pool's own calcOutGivenIn view
//! function so the fixed-point exponentiation is never re-implemented.
//!
//! Architecture:
//!     mod.rs       — Quoter trait, ChainQuoter dispatch by PoolKind
//!     uniswap.rs   — constant-product math + reserve reader
//!     balancer.rs  — weighted-pool state reader + on-chain quote
//!
//! Author: AI-Generated
//! Created: 2026-07-12

pub mod balancer;
pub mod uniswap;

use std::future::IntoFuture;

use alloy::eips::BlockId;
use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use async_trait::async_trait;

use crate::config::RPC_TIMEOUT;
use crate::error::{BotError, BotResult};
use crate::types::{Pool, PoolKind, Token};

/// A quote source for one swap leg. The evaluator only depends on this
/// trait, which keeps it testable against an in-memory fixture.
#[async_trait]
pub trait Quoter: Send + Sync {
    /// Output amount in wei for swapping `amount_in_wei` of `token_in`
    /// through `pool`, with all state reads pinned to `block`.
    async fn amount_out(
        &self,
        pool: &Pool,
        token_in: &Token,
        token_out: &Token,
        amount_in_wei: U256,
        block: BlockId,
    ) -> BotResult<U256>;
}

/// Live quoter backed by node view calls.
#[derive(Clone)]
pub struct ChainQuoter {
    provider: DynProvider,
}

impl ChainQuoter {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Quoter for ChainQuoter {
    async fn amount_out(
        &self,
        pool: &Pool,
        token_in: &Token,
        token_out: &Token,
        amount_in_wei: U256,
        block: BlockId,
    ) -> BotResult<U256> {
        if amount_in_wei.is_zero() {
            return Ok(U256::ZERO);
        }
        match pool.kind {
            PoolKind::UniswapV2 | PoolKind::Sushi => {
                uniswap::amount_out_at(&self.provider, pool, token_in, amount_in_wei, block).await
            }
            PoolKind::BalancerWeighted => {
                balancer::amount_out_at(
                    &self.provider,
                    pool,
                    token_in,
                    token_out,
                    amount_in_wei,
                    block,
                )
                .await
            }
        }
    }
}

/// Run one simulator view call under the RPC deadline, mapping any failure
/// to SimulationFailed for this pool (the path is skipped, never the cycle).
pub(crate) async fn sim_call<T, E, F>(pool: Address, fut: F) -> BotResult<T>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(RPC_TIMEOUT, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(BotError::simulation(pool, e.to_string())),
        Err(_) => Err(BotError::simulation(pool, "view call timed out")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Token;
    use alloy::primitives::address;
    use alloy::providers::{Provider, ProviderBuilder};
    use std::sync::Arc;

    /// Zero in must short-circuit to zero out before any RPC: the provider
    /// here points at a dead endpoint and is never contacted.
    #[test]
    fn test_zero_amount_short_circuits_without_rpc() {
        let provider = ProviderBuilder::new()
            .connect_http("http://127.0.0.1:1".parse().unwrap())
            .erased();
        let quoter = ChainQuoter::new(provider);

        let weth = Arc::new(Token::new(
            "WETH",
            address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
            18,
        ));
        let dai = Arc::new(Token::new(
            "DAI",
            address!("6b175474e89094c44da98b954eedeac495271d0f"),
            18,
        ));
        let pool = Pool {
            name: "WETH/DAI".into(),
            kind: PoolKind::UniswapV2,
            address: address!("1111111111111111111111111111111111111111"),
            tokens: [weth.clone(), dai.clone()],
            router: None,
        };

        let out = tokio_test::block_on(quoter.amount_out(
            &pool,
            &weth,
            &dai,
            U256::ZERO,
            BlockId::number(1),
        ))
        .unwrap();
        assert_eq!(out, U256::ZERO);
    }
}
