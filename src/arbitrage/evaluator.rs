//! Arbitrage Evaluator
//!
//! For one path at one pinned block: simulate the full cycle at a probe
//! amount, climb the input amount while profit keeps rising, derive the
//! per-leg revert bounds from the optimal snapshot and apply the
//! gas-inclusive profitability predicate. Stateless between cycles; every
//! view call inside one evaluation uses the same pinned block.
//!
//! Author: AI-Generated
//! Created: 2026-07-13
//! Modified: 2026-07-19 - worker-pool fan-out over paths

use std::sync::Arc;

use alloy::eips::BlockId;
use alloy::primitives::U256;
use futures::stream::{self, StreamExt};
use tracing::{debug, error};

use crate::config::{Config, SinceBlock};
use crate::error::{BotError, BotResult};
use crate::exchange::Quoter;
use crate::types::{ArbitragePath, ArbitragePlan, Token};

#[derive(Debug, Clone)]
pub struct EvalParams {
    /// Probe amount and lower sweep bound, in WETH units.
    pub min_amount: f64,
    /// Upper sweep bound, in WETH units.
    pub max_amount: f64,
    /// Sweep increment, in WETH units.
    pub step: f64,
    /// Gas units one execution is budgeted at.
    pub gas_units: u64,
    /// MEV safety margin added on top of gas in the fillable predicate.
    pub safety_margin_wei: U256,
    /// Deadline offset: plan may mine up to pinned_block + offset.
    pub max_block_offset: u64,
    /// Block tag for simulator reads.
    pub since: SinceBlock,
    /// Width of the per-cycle worker pool over paths.
    pub concurrency: usize,
}

impl EvalParams {
    pub fn from_config(config: &Config, weth: &Token) -> Self {
        Self {
            min_amount: config.min_amount,
            max_amount: config.max_amount,
            step: config.incremental_step,
            gas_units: config.gas_units,
            safety_margin_wei: weth.to_wei(config.safety_margin_weth),
            max_block_offset: config.max_block,
            since: config.since,
            concurrency: config.eval_concurrency.max(1),
        }
    }
}

pub struct Evaluator {
    quoter: Arc<dyn Quoter>,
    weth: Arc<Token>,
    params: EvalParams,
}

impl Evaluator {
    pub fn new(quoter: Arc<dyn Quoter>, weth: Arc<Token>, params: EvalParams) -> Self {
        Self {
            quoter,
            weth,
            params,
        }
    }

    fn block_ref(&self, pinned_block: u64) -> BlockId {
        match self.params.since {
            SinceBlock::Latest => BlockId::number(pinned_block),
            SinceBlock::Pending => BlockId::pending(),
        }
    }

    /// Chain the legs: leg i consumes leg i-1's output. Returns the full
    /// output vector. Any simulator failure aborts this path only.
    pub async fn simulate_path(
        &self,
        path: &ArbitragePath,
        amount_in_wei: U256,
        block: BlockId,
    ) -> BotResult<Vec<U256>> {
        let mut amount = amount_in_wei;
        let mut outs = Vec::with_capacity(path.len());
        for leg in &path.legs {
            amount = self
                .quoter
                .amount_out(&leg.pool, &leg.token_in, &leg.token_out, amount, block)
                .await?;
            outs.push(amount);
        }
        Ok(outs)
    }

    /// Evaluate one path at one pinned block and gas price. Returns a plan
    /// only when the optimised cycle clears gas plus the safety margin.
    pub async fn evaluate(
        &self,
        path: &Arc<ArbitragePath>,
        pinned_block: u64,
        gas_price: u128,
    ) -> BotResult<Option<ArbitragePlan>> {
        let block = self.block_ref(pinned_block);
        let gas_cost = U256::from(gas_price) * U256::from(self.params.gas_units);

        let probe_in = self.weth.to_wei(self.params.min_amount);
        let probe_outs = self.simulate_path(path, probe_in, block).await?;
        let Some(&probe_out) = probe_outs.last() else {
            return Ok(None);
        };

        // Triage: no gross gain at the probe means the curve has no slack
        // worth climbing.
        if probe_out <= probe_in {
            return Ok(None);
        }

        let (best_in, best_outs, best_profit) =
            self.climb(path, block, probe_in, probe_outs, probe_out - probe_in).await?;

        // Fillable predicate: strict, so exact break-even never dispatches.
        if best_profit <= gas_cost + self.params.safety_margin_wei {
            debug!(
                "path {} positive but under margin: profit {} wei",
                path.route_label(),
                best_profit
            );
            return Ok(None);
        }

        let Some(&final_out) = best_outs.last() else {
            return Ok(None);
        };

        // Min-out derivation: scale the optimal snapshot so the terminal
        // bound lands exactly on amount_in + gas_cost. The on-chain revert
        // predicate out_i >= m_i then reads "covers its own gas or reverts".
        let target = best_in + gas_cost;
        let min_amount_outs: Vec<U256> = best_outs
            .iter()
            .map(|w| (*w * target) / final_out)
            .collect();

        Ok(Some(ArbitragePlan {
            path: path.clone(),
            amount_in: best_in,
            amount_outs: best_outs,
            min_amount_outs,
            gas_price,
            gas_cost,
            profit: best_profit,
            max_block_height: pinned_block + self.params.max_block_offset,
        }))
    }

    /// Monotonic ascent over the input amount: sweep upward in fixed steps
    /// and stop on the first profit decline. Constant-product and weighted
    /// cost curves are unimodal in the input, so the early break is sound
    /// and saves most of the sweep's latency.
    async fn climb(
        &self,
        path: &ArbitragePath,
        block: BlockId,
        probe_in: U256,
        probe_outs: Vec<U256>,
        probe_profit: U256,
    ) -> BotResult<(U256, Vec<U256>, U256)> {
        let mut best_in = probe_in;
        let mut best_outs = probe_outs;
        let mut best_profit = probe_profit;

        let step = self.weth.to_wei(self.params.step);
        let max = self.weth.to_wei(self.params.max_amount);
        if step.is_zero() {
            return Ok((best_in, best_outs, best_profit));
        }

        let mut amount = probe_in + step;
        while amount < max {
            let outs = self.simulate_path(path, amount, block).await?;
            let Some(&out) = outs.last() else { break };
            let profit = out.saturating_sub(amount);
            if profit >= best_profit {
                best_profit = profit;
                best_in = amount;
                best_outs = outs;
            } else {
                break;
            }
            amount += step;
        }
        Ok((best_in, best_outs, best_profit))
    }

    /// Evaluate many paths at one pinned block with a bounded worker pool.
    /// Failed paths are logged and skipped; results come back sorted by
    /// profit, best first.
    pub async fn evaluate_all(
        &self,
        paths: &[Arc<ArbitragePath>],
        pinned_block: u64,
        gas_price: u128,
    ) -> Vec<ArbitragePlan> {
        let mut plans: Vec<ArbitragePlan> = stream::iter(paths.iter().cloned())
            .map(|path| async move {
                match self.evaluate(&path, pinned_block, gas_price).await {
                    Ok(plan) => plan,
                    Err(e @ BotError::SimulationFailed { .. })
                    | Err(e @ BotError::TransientRpc(_)) => {
                        error!("skipping path {}: {e}", path.route_label());
                        None
                    }
                    Err(e) => {
                        error!("evaluation error on {}: {e}", path.route_label());
                        None
                    }
                }
            })
            .buffer_unordered(self.params.concurrency)
            .filter_map(|plan| async move { plan })
            .collect()
            .await;

        plans.sort_by(|a, b| b.profit.cmp(&a.profit));
        plans
    }
}
