//! Printer Contract Dispatcher
//!
//! Takes a fillable plan through the full submission pipeline:
//! validate -> encode -> dry-run -> sign -> submit -> track. Every
//! transition is observable through the notification facade. A plan that
//! fails anywhere is terminal: there are no automatic retries, the next
//! block simply produces a fresh plan.
//!
//! Architecture:
//!     encoder.rs — masked 3x7 calldata matrix, min-out grouping
//!     mod.rs     — validation caps, estimate-gas dry run, local signing,
//!                  raw submission, receipt tracking
//!
//! Author: AI-Generated
//! Created: 2026-07-14
//! Modified: 2026-07-20 - pluggable dispatch predicate

pub mod encoder;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use tracing::{error, info, warn};

use crate::config::{Config, TX_GAS_LIMIT};
use crate::contracts::IPrinter;
use crate::error::{BotError, BotResult};
use crate::ethereum::Eth;
use crate::notify::Notifier;
use crate::types::{ArbitragePlan, Token};

/// Operator-pluggable last-look filter, applied after validation and before
/// the dry run. Defaults to pass-all.
pub type DispatchPredicate = Box<dyn Fn(&ArbitragePlan) -> bool + Send + Sync>;

/// Terminal states of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Dry run passed but --send-tx is off; nothing was submitted.
    DryRunOnly,
    /// Rejected by the operator predicate.
    Skipped,
    Mined(B256),
    Reverted(B256),
    TimedOut(B256),
}

pub struct Printer {
    eth: Eth,
    notifier: Arc<Notifier>,
    weth: Arc<Token>,
    printer_address: Address,
    executor: Address,
    mask: Address,
    wallet: EthereumWallet,
    send_tx: bool,
    chain_id: u64,
    min_executor_balance: U256,
    receipt_timeout: Duration,
    etherscan_tx_base: String,
    predicate: DispatchPredicate,
    /// Plans that died in the dry run; exposed for operator telemetry.
    would_not_go_through: AtomicU64,
}

impl Printer {
    pub fn new(eth: Eth, config: &Config, notifier: Arc<Notifier>) -> BotResult<Self> {
        let signer = PrivateKeySigner::from_bytes(&config.signer_key)
            .map_err(|e| BotError::Validation(format!("invalid signer key: {e}")))?;
        let weth = config.weth_token();
        Ok(Self {
            eth,
            notifier,
            min_executor_balance: weth.to_wei(config.min_executor_balance_weth),
            weth,
            printer_address: config.printer_address,
            executor: config.executor_address,
            mask: config.mask_address,
            wallet: EthereumWallet::from(signer),
            send_tx: config.send_tx,
            chain_id: config.chain_id,
            // Deadline window plus two blocks of slack at ~12s each.
            receipt_timeout: Duration::from_secs(12 * (config.max_block + 2)),
            etherscan_tx_base: config.network.etherscan_tx_base().to_string(),
            predicate: Box::new(|_| true),
            would_not_go_through: AtomicU64::new(0),
        })
    }

    pub fn with_predicate(mut self, predicate: DispatchPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn dry_run_failures(&self) -> u64 {
        self.would_not_go_through.load(Ordering::Relaxed)
    }

    /// Run one plan through the pipeline. Validation failures are reported
    /// to the error sink and returned; later failures are terminal
    /// outcomes for this plan only.
    pub async fn dispatch(&self, plan: &ArbitragePlan) -> BotResult<DispatchOutcome> {
        if let Err(e) = self.validate(plan).await {
            self.notifier
                .send_error(&format!(
                    "Dispatch validation failed: {e}\nPath: {}",
                    plan.path.route_label()
                ))
                .await;
            return Err(e);
        }

        if !(self.predicate)(plan) {
            info!("dispatch predicate skipped {}", plan.path.route_label());
            return Ok(DispatchOutcome::Skipped);
        }

        let calldata = encoder::encode(plan, self.mask)?;
        let input = IPrinter::arbitrageCall {
            tokenPaths: calldata.token_paths,
            minAmountsOut: calldata.min_amounts_out,
            amountIn: plan.amount_in,
            gasCost: plan.gas_cost,
            poolTypes: calldata.pool_types.map(U256::from),
            deadlineBlock: U256::from(plan.max_block_height),
        }
        .abi_encode();

        let tx = TransactionRequest::default()
            .with_from(self.executor)
            .with_to(self.printer_address)
            .with_input(input)
            .with_gas_price(plan.gas_price);

        // Dry run with the exact calldata. A revert here means the chain
        // moved against the snapshot; drop the plan without a transaction.
        if let Err(e) = self.eth.estimate_gas(tx.clone()).await {
            let failures = self.would_not_go_through.fetch_add(1, Ordering::Relaxed) + 1;
            error!(
                "Dry run reverted (would-not-go-through #{failures}): {e} | {}",
                plan.path.route_label()
            );
            return Err(BotError::DryRunRevert(e.to_string()));
        }

        if !self.send_tx {
            info!(
                "DRY RUN ok: {} | profit {} ETH (send-tx off)",
                plan.path.route_label(),
                self.weth.from_wei(plan.profit)
            );
            return Ok(DispatchOutcome::DryRunOnly);
        }

        // Nonce is read fresh per dispatch; dispatches are serialised by
        // the strategy loop so it acquires monotonically.
        let nonce = self.eth.nonce(self.executor).await?;
        let tx = tx
            .with_nonce(nonce)
            .with_chain_id(self.chain_id)
            .with_gas_limit(TX_GAS_LIMIT);

        let envelope = tx
            .build(&self.wallet)
            .await
            .map_err(|e| BotError::Validation(format!("signing failed: {e}")))?;

        let pending = self
            .eth
            .send_raw_transaction(&envelope.encoded_2718())
            .await?;
        let tx_hash = *pending.tx_hash();
        let tx_url = format!("{}{tx_hash}", self.etherscan_tx_base);
        info!("Submitted printer tx {tx_url} (nonce {nonce})");
        self.notifier
            .send_all(&format!("Printing Money $$$$ - tx: {tx_url}"))
            .await;

        match pending
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await
        {
            Ok(receipt) if receipt.status() => {
                self.notifier.send_printing_tx(&tx_url, true).await;
                Ok(DispatchOutcome::Mined(tx_hash))
            }
            Ok(_) => {
                self.notifier.send_printing_tx(&tx_url, false).await;
                Ok(DispatchOutcome::Reverted(tx_hash))
            }
            Err(e) => {
                warn!("receipt wait failed for {tx_hash}: {e}");
                self.notifier
                    .send_error(&format!("No receipt inside the wait window: {tx_url}"))
                    .await;
                Ok(DispatchOutcome::TimedOut(tx_hash))
            }
        }
    }

    async fn validate(&self, plan: &ArbitragePlan) -> BotResult<()> {
        validate_shape(plan, self.weth.address, self.weth.to_wei(1.0))?;
        let balance = self.eth.balance(self.executor).await?;
        if balance < self.min_executor_balance {
            return Err(BotError::Validation(format!(
                "executor balance {} below the {} wei floor",
                balance, self.min_executor_balance
            )));
        }
        Ok(())
    }
}

/// The pure validation caps; everything checkable without the chain.
pub fn validate_shape(plan: &ArbitragePlan, weth: Address, one_weth: U256) -> BotResult<()> {
    if plan.path.token_out().address != weth {
        return Err(BotError::Validation("last token out has to be WETH".into()));
    }
    let legs = plan.path.len();
    if legs != plan.min_amount_outs.len() || legs != plan.amount_outs.len() {
        return Err(BotError::Validation(
            "per-leg vectors must match the leg count".into(),
        ));
    }
    if !(2..=encoder::TOKEN_PATH_ROWS).contains(&legs) {
        return Err(BotError::Validation(format!(
            "path length has to be 2..={}",
            encoder::TOKEN_PATH_ROWS
        )));
    }
    if plan.gas_cost >= plan.profit {
        return Err(BotError::Validation(
            "gas cost exceeds the gross profit".into(),
        ));
    }
    if plan.gas_cost >= one_weth {
        return Err(BotError::Validation(
            "gas cost above the 1 WETH sanity cap".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArbitragePath, ConnectingPath, Pool, PoolKind};
    use alloy::primitives::address;

    fn weth() -> Arc<Token> {
        Arc::new(Token::new(
            "WETH",
            address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
            18,
        ))
    }

    fn plan() -> ArbitragePlan {
        let w = weth();
        let dai = Arc::new(Token::new(
            "DAI",
            address!("6b175474e89094c44da98b954eedeac495271d0f"),
            18,
        ));
        let pool = |addr| {
            Arc::new(Pool {
                name: "WETH/DAI".into(),
                kind: PoolKind::UniswapV2,
                address: addr,
                tokens: [w.clone(), dai.clone()],
                router: Some(address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D")),
            })
        };
        ArbitragePlan {
            path: Arc::new(ArbitragePath::new(vec![
                ConnectingPath {
                    pool: pool(address!("1111111111111111111111111111111111111111")),
                    token_in: w.clone(),
                    token_out: dai.clone(),
                },
                ConnectingPath {
                    pool: pool(address!("2222222222222222222222222222222222222222")),
                    token_in: dai,
                    token_out: w.clone(),
                },
            ])),
            amount_in: w.to_wei(3.0),
            amount_outs: vec![U256::from(6000u64), w.to_wei(3.3)],
            min_amount_outs: vec![U256::from(5500u64), w.to_wei(3.1)],
            gas_price: 100_000_000_000,
            gas_cost: w.to_wei(0.05),
            profit: w.to_wei(0.3),
            max_block_height: 15_000_003,
        }
    }

    #[test]
    fn test_valid_plan_passes_shape_checks() {
        let w = weth();
        assert!(validate_shape(&plan(), w.address, w.to_wei(1.0)).is_ok());
    }

    #[test]
    fn test_gas_above_profit_is_rejected() {
        let w = weth();
        let mut p = plan();
        p.gas_cost = p.profit;
        assert!(matches!(
            validate_shape(&p, w.address, w.to_wei(1.0)),
            Err(BotError::Validation(_))
        ));
    }

    #[test]
    fn test_gas_above_one_weth_cap_is_rejected() {
        let w = weth();
        let mut p = plan();
        p.gas_cost = w.to_wei(1.5);
        p.profit = w.to_wei(2.0);
        assert!(validate_shape(&p, w.address, w.to_wei(1.0)).is_err());
    }

    #[test]
    fn test_non_weth_terminal_is_rejected() {
        let w = weth();
        let mut p = plan();
        // Break the terminal leg: swap the last leg's direction.
        let mut legs = p.path.legs.clone();
        let last = legs.len() - 1;
        let tmp = legs[last].token_in.clone();
        legs[last].token_in = legs[last].token_out.clone();
        legs[last].token_out = tmp;
        p.path = Arc::new(ArbitragePath::new(legs));
        assert!(validate_shape(&p, w.address, w.to_wei(1.0)).is_err());
    }

    #[test]
    fn test_mismatched_vectors_rejected() {
        let w = weth();
        let mut p = plan();
        p.min_amount_outs.pop();
        assert!(validate_shape(&p, w.address, w.to_wei(1.0)).is_err());
    }
}
