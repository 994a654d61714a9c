//! Mempool Scanner
//!
//! Feeds the SNIPE strategy: read the node's pending txpool, pick out the
//! transactions of tracked competitor addresses ("noobs"), and slice their
//! calldata into 32-byte words to recover the pools they are about to
//! trade through. The strategy then races them at gas_price + 1.
//!
//! Seen tx hashes are tracked per iteration so the same pending tx never
//! triggers twice; the set is single-writer state owned by the SNIPE loop.
//!
//! Author: AI-Generated
//! Created: 2026-07-15

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use alloy::consensus::Transaction as TransactionTrait;
use alloy::network::TransactionResponse;
use alloy::primitives::{Address, B256};
use serde::Deserialize;
use tracing::debug;

use crate::error::{BotError, BotResult};
use crate::ethereum::Eth;
use crate::types::Pool;

/// A competitor address worth racing.
#[derive(Debug, Clone, Deserialize)]
pub struct SnipingNoob {
    pub address: Address,
}

#[derive(Debug, Deserialize)]
struct NoobsFile {
    noobs: Vec<SnipingNoob>,
}

/// Load the watch-list from snipers.yaml (`noobs: [{address}]`).
pub fn load_noobs(path: &Path) -> BotResult<Vec<SnipingNoob>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| BotError::ConfigMissing(format!("{}: {e}", path.display())))?;
    let file: NoobsFile = serde_yaml::from_str(&raw)
        .map_err(|e| BotError::Validation(format!("snipers.yaml parse error: {e}")))?;
    Ok(file.noobs)
}

/// One pending competitor transaction worth reacting to.
#[derive(Debug, Clone)]
pub struct SnipedPending {
    pub pools: Vec<Arc<Pool>>,
    pub gas_price: u128,
    pub tx_hash: B256,
}

pub struct MempoolScanner {
    eth: Eth,
    noobs: Vec<Address>,
    pools_by_address: HashMap<Address, Arc<Pool>>,
    last_seen: HashSet<B256>,
}

impl MempoolScanner {
    pub fn new(eth: Eth, noobs: Vec<SnipingNoob>, pools: &[Arc<Pool>]) -> Self {
        Self {
            eth,
            noobs: noobs.into_iter().map(|n| n.address).collect(),
            pools_by_address: pools.iter().map(|p| (p.address, p.clone())).collect(),
            last_seen: HashSet::new(),
        }
    }

    /// One pass over the pending pool. Returns the new competitor
    /// transactions that reference at least one known pool.
    pub async fn scan(&mut self) -> BotResult<Vec<SnipedPending>> {
        let pending = self.eth.pending_by_sender().await?;

        let mut observed: Vec<(B256, Vec<u8>, u128)> = Vec::new();
        for noob in &self.noobs {
            let Some(txs) = pending.get(noob) else {
                continue;
            };
            for tx in txs.values() {
                let gas_price = TransactionResponse::gas_price(tx)
                    .unwrap_or_else(|| TransactionTrait::max_fee_per_gas(tx));
                observed.push((tx.tx_hash(), tx.input().to_vec(), gas_price));
            }
        }
        Ok(collect_sniped(
            &mut self.last_seen,
            &self.pools_by_address,
            observed,
        ))
    }
}

/// Pure half of the scan, fed by (hash, calldata, gas_price) triples.
/// Updates the seen-set to this iteration's hashes so an unchanged pending
/// pool produces nothing on the next pass.
fn collect_sniped(
    last_seen: &mut HashSet<B256>,
    pools_by_address: &HashMap<Address, Arc<Pool>>,
    observed: Vec<(B256, Vec<u8>, u128)>,
) -> Vec<SnipedPending> {
    let mut sniped = Vec::new();
    let mut seen_now = HashSet::new();
    for (tx_hash, input, gas_price) in observed {
        seen_now.insert(tx_hash);
        if last_seen.contains(&tx_hash) {
            continue;
        }
        let pools = extract_pools(&input, pools_by_address);
        if pools.is_empty() {
            continue;
        }
        debug!(
            "pending noob tx {tx_hash} references {} known pools at {} wei gas",
            pools.len(),
            gas_price
        );
        sniped.push(SnipedPending {
            pools,
            gas_price,
            tx_hash,
        });
    }
    if !seen_now.is_empty() {
        *last_seen = seen_now;
    }
    sniped
}

/// Slice the argument section of the calldata into 32-byte words and match
/// the low 20 bytes of each against the known pool set.
fn extract_pools(
    input: &[u8],
    known: &HashMap<Address, Arc<Pool>>,
) -> Vec<Arc<Pool>> {
    let mut found: Vec<Arc<Pool>> = Vec::new();
    let mut seen: HashSet<Address> = HashSet::new();
    if input.len() <= 4 {
        return found;
    }
    for word in input[4..].chunks_exact(32) {
        let candidate = Address::from_slice(&word[12..32]);
        if seen.contains(&candidate) {
            continue;
        }
        if let Some(pool) = known.get(&candidate) {
            seen.insert(candidate);
            found.push(pool.clone());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PoolKind, Token};
    use alloy::primitives::address;

    fn pool(addr: Address) -> Arc<Pool> {
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
        Arc::new(Pool {
            name: "WETH/DAI".into(),
            kind: PoolKind::UniswapV2,
            address: addr,
            tokens: [weth, dai],
            router: None,
        })
    }

    /// Calldata: 4-byte selector then 32-byte words with the address in
    /// the low 20 bytes.
    fn calldata_with(addresses: &[Address]) -> Vec<u8> {
        let mut data = vec![0xab, 0xcd, 0xef, 0x01];
        for addr in addresses {
            let mut word = [0u8; 32];
            word[12..32].copy_from_slice(addr.as_slice());
            data.extend_from_slice(&word);
        }
        data
    }

    #[test]
    fn test_extracts_known_pools_from_words() {
        let p1 = address!("1111111111111111111111111111111111111111");
        let unknown = address!("9999999999999999999999999999999999999999");
        let known: HashMap<Address, Arc<Pool>> = [(p1, pool(p1))].into();

        let pools = extract_pools(&calldata_with(&[unknown, p1]), &known);
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].address, p1);
    }

    #[test]
    fn test_duplicate_words_collapse() {
        let p1 = address!("1111111111111111111111111111111111111111");
        let known: HashMap<Address, Arc<Pool>> = [(p1, pool(p1))].into();
        let pools = extract_pools(&calldata_with(&[p1, p1, p1]), &known);
        assert_eq!(pools.len(), 1);
    }

    #[test]
    fn test_short_calldata_yields_nothing() {
        let known: HashMap<Address, Arc<Pool>> = HashMap::new();
        assert!(extract_pools(&[0x12, 0x34], &known).is_empty());
    }

    #[test]
    fn test_seen_hashes_do_not_retrigger() {
        let p1 = address!("1111111111111111111111111111111111111111");
        let known: HashMap<Address, Arc<Pool>> = [(p1, pool(p1))].into();
        let mut last_seen = HashSet::new();

        let hash = B256::from([7u8; 32]);
        let first = collect_sniped(
            &mut last_seen,
            &known,
            vec![(hash, calldata_with(&[p1]), 100)],
        );
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].gas_price, 100);

        let second = collect_sniped(
            &mut last_seen,
            &known,
            vec![(hash, calldata_with(&[p1]), 100)],
        );
        assert!(second.is_empty());
    }

    #[test]
    fn test_tx_without_known_pools_ignored() {
        let p1 = address!("1111111111111111111111111111111111111111");
        let unknown = address!("9999999999999999999999999999999999999999");
        let known: HashMap<Address, Arc<Pool>> = [(p1, pool(p1))].into();
        let mut last_seen = HashSet::new();
        let sniped = collect_sniped(
            &mut last_seen,
            &known,
            vec![(B256::from([1u8; 32]), calldata_with(&[unknown]), 50)],
        );
        assert!(sniped.is_empty());
    }
}
