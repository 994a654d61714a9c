//! Node access facade
//!
//! Wraps the alloy providers behind the handful of primitives the rest of
//! the bot needs: block cursor, gas price, per-block logs, pending txpool,
//! account state and raw transaction submission. Every call carries the
//! bounded RPC timeout; a timeout surfaces as TransientRpc and is handled
//! by the caller at path or cycle granularity.
//!
//! The WS endpoint serves the block loop and log filters; the HTTP endpoint
//! serves txpool_content, which several node operators only expose there.
//!
//! Author: AI-Generated
//! Created: 2026-07-12

use std::collections::BTreeMap;
use std::future::IntoFuture;
use std::time::Instant;

use alloy::network::Ethereum;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::ext::TxPoolApi;
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{Filter, Log, Transaction, TransactionRequest};
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::{Config, BLOCK_POLL_INTERVAL, RPC_TIMEOUT};
use crate::error::{BotError, BotResult};

#[derive(Clone)]
pub struct Eth {
    ws: DynProvider,
    http: DynProvider,
    pub chain_id: u64,
}

impl Eth {
    pub async fn connect(config: &Config) -> Result<Self> {
        let ws = ProviderBuilder::new()
            .connect_ws(WsConnect::new(&config.ws_uri))
            .await
            .context("WS provider connect failed")?
            .erased();

        let http_url = config
            .http_uri
            .parse()
            .context("invalid ETHEREUM_HTTP_URI")?;
        let http = ProviderBuilder::new().connect_http(http_url).erased();

        info!("Connected to node | chain_id={}", config.chain_id);
        Ok(Self {
            ws,
            http,
            chain_id: config.chain_id,
        })
    }

    /// Provider for simulator view calls (pinned-block reads).
    pub fn provider(&self) -> DynProvider {
        self.ws.clone()
    }

    pub async fn block_number(&self) -> BotResult<u64> {
        rpc(self.ws.get_block_number()).await
    }

    /// Block on the next block: poll the block number on a short sleep
    /// until it advances past `current`. This is the single suspension
    /// point of every strategy loop.
    pub async fn wait_new_block(&self, current: u64) -> u64 {
        let started = Instant::now();
        loop {
            match self.block_number().await {
                Ok(latest) if latest > current => {
                    info!(
                        "Block number: {} ({:.1}s)",
                        latest,
                        started.elapsed().as_secs_f64()
                    );
                    return latest;
                }
                Ok(_) => {}
                Err(e) => warn!("block number poll failed: {e}"),
            }
            tokio::time::sleep(BLOCK_POLL_INTERVAL).await;
        }
    }

    pub async fn gas_price(&self) -> BotResult<u128> {
        rpc(self.ws.get_gas_price()).await
    }

    /// All logs of one block whose topic0 is in `signatures`.
    pub async fn logs_at_block(&self, block: u64, signatures: Vec<B256>) -> BotResult<Vec<Log>> {
        let filter = Filter::new().select(block).event_signature(signatures);
        rpc(self.ws.get_logs(&filter)).await
    }

    /// Pending transactions grouped by sender, from the node's txpool.
    pub async fn pending_by_sender(
        &self,
    ) -> BotResult<BTreeMap<Address, BTreeMap<String, Transaction>>> {
        let content = rpc(self.http.txpool_content()).await?;
        Ok(content.pending)
    }

    pub async fn balance(&self, address: Address) -> BotResult<U256> {
        rpc(self.ws.get_balance(address)).await
    }

    pub async fn nonce(&self, address: Address) -> BotResult<u64> {
        rpc(self.ws.get_transaction_count(address)).await
    }

    /// Dry-run a call exactly as it would be submitted. A revert comes back
    /// as an RPC error and is mapped to DryRunRevert by the dispatcher.
    pub async fn estimate_gas(&self, tx: TransactionRequest) -> BotResult<u64> {
        rpc(self.ws.estimate_gas(tx)).await
    }

    pub async fn send_raw_transaction(
        &self,
        encoded: &[u8],
    ) -> BotResult<PendingTransactionBuilder<Ethereum>> {
        match tokio::time::timeout(RPC_TIMEOUT, self.ws.send_raw_transaction(encoded)).await {
            Ok(Ok(pending)) => {
                debug!("raw tx accepted: {}", pending.tx_hash());
                Ok(pending)
            }
            Ok(Err(e)) => Err(BotError::TransientRpc(e.to_string())),
            Err(_) => Err(BotError::TransientRpc("send_raw_transaction timed out".into())),
        }
    }
}

/// Apply the bounded timeout and collapse transport errors to TransientRpc.
/// Provider methods hand back lazy builders, hence the IntoFuture bound.
async fn rpc<T, E, F>(fut: F) -> BotResult<T>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(RPC_TIMEOUT, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(BotError::TransientRpc(e.to_string())),
        Err(_) => Err(BotError::TransientRpc(format!(
            "rpc call exceeded {}s",
            RPC_TIMEOUT.as_secs()
        ))),
    }
}
