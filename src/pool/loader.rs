//! Pool universe loader
//!
//! Three sources, merged and filtered into one immutable pool set:
//!   - the Uniswap V2 subgraph (pairs inside the configured liquidity band),
//!   - the Balancer subgraph (public two-token weighted pools in the band),
//!   - YAML overrides (hand-picked pools; the only source on Kovan).
//!
//! A blacklist YAML removes every pool touching a listed token; an optional
//! only-tokens list narrows the universe to named tokens. Tokens are
//! interned by address so every pool shares one allocation per token.
//!
//! Author: AI-Generated
//! Created: 2026-07-13
//! Modified: 2026-07-18 - liquidity band on both subgraph queries

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use alloy::primitives::Address;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{BotError, BotResult};
use crate::types::{Pool, PoolKind, Token};

const UNISWAP_SUBGRAPH: &str = "https://api.thegraph.com/subgraphs/name/uniswap/uniswap-v2";
const BALANCER_SUBGRAPH: &str = "https://api.thegraph.com/subgraphs/name/balancer-labs/balancer";

// ── Subgraph response shapes ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UniswapData {
    pairs: Vec<UniswapPair>,
}

#[derive(Debug, Deserialize)]
struct UniswapPair {
    id: String,
    token0: SubgraphToken,
    token1: SubgraphToken,
}

#[derive(Debug, Deserialize)]
struct SubgraphToken {
    id: String,
    symbol: String,
    decimals: String,
}

#[derive(Debug, Deserialize)]
struct BalancerData {
    pools: Vec<BalancerPool>,
}

#[derive(Debug, Deserialize)]
struct BalancerPool {
    id: String,
    tokens: Vec<BalancerToken>,
}

#[derive(Debug, Deserialize)]
struct BalancerToken {
    address: String,
    symbol: String,
    decimals: u8,
}

// ── YAML shapes ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokensFile {
    tokens: Vec<TokenYaml>,
}

#[derive(Debug, Deserialize)]
struct TokenYaml {
    name: String,
    address: String,
    decimal: u8,
}

#[derive(Debug, Deserialize)]
struct PoolsFile {
    pools: Vec<PoolYaml>,
}

#[derive(Debug, Deserialize)]
struct PoolYaml {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    address: String,
    tokens: Vec<String>,
}

/// Shares one `Arc<Token>` per address across the whole universe.
#[derive(Default)]
struct TokenInterner {
    by_address: HashMap<Address, Arc<Token>>,
}

impl TokenInterner {
    fn intern(&mut self, name: &str, address: Address, decimals: u8) -> Arc<Token> {
        self.by_address
            .entry(address)
            .or_insert_with(|| Arc::new(Token::new(name, address, decimals)))
            .clone()
    }
}

pub struct PoolLoader {
    config: Config,
    client: reqwest::Client,
}

impl PoolLoader {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch, merge and filter the whole universe. Subgraph failures are
    /// transient: the caller retries on the next reload tick.
    pub async fn load_all_pools(&self) -> BotResult<Vec<Arc<Pool>>> {
        let mut interner = TokenInterner::default();
        let mut pools: Vec<Arc<Pool>> = Vec::new();

        if !self.config.is_kovan() {
            pools.extend(self.load_uniswap_pools(&mut interner).await?);
            pools.extend(self.load_balancer_pools(&mut interner).await?);
        }
        pools.extend(self.load_yaml_pools(&mut interner)?);

        let blacklist = self.load_blacklist();
        let kept = filter_pools(
            pools,
            self.config.weth_address,
            &blacklist,
            self.config.only_tokens.as_deref(),
        );
        info!(
            "Pool universe loaded: {} pools ({} blacklisted tokens)",
            kept.len(),
            blacklist.len()
        );
        Ok(kept)
    }

    async fn load_uniswap_pools(
        &self,
        interner: &mut TokenInterner,
    ) -> BotResult<Vec<Arc<Pool>>> {
        let query = format!(
            r#"{{
    pairs(
        first: 1000,
        where: {{ reserveUSD_gt: {}, reserveUSD_lt: {} }},
        orderBy: volumeUSD,
        orderDirection: desc) {{
        id
        token0 {{ id symbol decimals }}
        token1 {{ id symbol decimals }}
    }}
}}"#,
            self.config.min_liquidity, self.config.max_liquidity
        );
        let data: GraphResponse<UniswapData> = self.post_subgraph(UNISWAP_SUBGRAPH, &query).await?;

        let mut pools = Vec::with_capacity(data.data.pairs.len());
        for pair in data.data.pairs {
            match uniswap_pair_to_pool(&pair, interner, self.config.uniswap_router) {
                Ok(pool) => pools.push(pool),
                Err(e) => warn!("skipping subgraph pair {}: {e}", pair.id),
            }
        }
        Ok(pools)
    }

    async fn load_balancer_pools(
        &self,
        interner: &mut TokenInterner,
    ) -> BotResult<Vec<Arc<Pool>>> {
        let query = format!(
            r#"{{
    pools(
        first: 1000,
        where: {{ publicSwap: true, tokensCount: 2, liquidity_gt: {}, liquidity_lt: {} }},
        orderBy: totalSwapVolume,
        orderDirection: desc) {{
        id
        tokens {{ address symbol decimals }}
    }}
}}"#,
            self.config.min_liquidity, self.config.max_liquidity
        );
        let data: GraphResponse<BalancerData> =
            self.post_subgraph(BALANCER_SUBGRAPH, &query).await?;

        let mut pools = Vec::with_capacity(data.data.pools.len());
        for bpool in data.data.pools {
            match balancer_pool_to_pool(&bpool, interner) {
                Ok(pool) => pools.push(pool),
                Err(e) => warn!("skipping subgraph bpool {}: {e}", bpool.id),
            }
        }
        Ok(pools)
    }

    async fn post_subgraph<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &str,
    ) -> BotResult<T> {
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| BotError::TransientRpc(format!("subgraph post failed: {e}")))?;
        response
            .json::<T>()
            .await
            .map_err(|e| BotError::TransientRpc(format!("subgraph decode failed: {e}")))
    }

    fn load_yaml_pools(&self, interner: &mut TokenInterner) -> BotResult<Vec<Arc<Pool>>> {
        let tokens_raw = read_file(&self.config.tokens_yaml)?;
        let pools_raw = read_file(&self.config.pools_yaml)?;
        yaml_pools(
            &tokens_raw,
            &pools_raw,
            interner,
            self.config.uniswap_router,
            self.config.sushiswap_router,
        )
    }

    /// Token addresses whose pools are excluded. A missing blacklist file
    /// just means nothing is blacklisted.
    fn load_blacklist(&self) -> HashSet<Address> {
        let Ok(raw) = std::fs::read_to_string(&self.config.blacklist_yaml) else {
            return HashSet::new();
        };
        match serde_yaml::from_str::<TokensFile>(&raw) {
            Ok(file) => file
                .tokens
                .iter()
                .filter_map(|t| parse_address(&t.address).ok())
                .collect(),
            Err(e) => {
                warn!("blacklist.yaml parse error, ignoring: {e}");
                HashSet::new()
            }
        }
    }
}

fn read_file(path: &Path) -> BotResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| BotError::ConfigMissing(format!("{}: {e}", path.display())))
}

fn parse_address(s: &str) -> BotResult<Address> {
    s.trim()
        .parse()
        .map_err(|_| BotError::Validation(format!("invalid address: {s}")))
}

fn uniswap_pair_to_pool(
    pair: &UniswapPair,
    interner: &mut TokenInterner,
    router: Address,
) -> BotResult<Arc<Pool>> {
    let t0 = interner.intern(
        &pair.token0.symbol,
        parse_address(&pair.token0.id)?,
        parse_decimals(&pair.token0.decimals)?,
    );
    let t1 = interner.intern(
        &pair.token1.symbol,
        parse_address(&pair.token1.id)?,
        parse_decimals(&pair.token1.decimals)?,
    );
    Ok(Arc::new(Pool {
        name: format!("{}/{}", t0.name, t1.name),
        kind: PoolKind::UniswapV2,
        address: parse_address(&pair.id)?,
        tokens: [t0, t1],
        router: Some(router),
    }))
}

fn balancer_pool_to_pool(
    bpool: &BalancerPool,
    interner: &mut TokenInterner,
) -> BotResult<Arc<Pool>> {
    if bpool.tokens.len() != 2 {
        return Err(BotError::Validation(format!(
            "expected 2 tokens, got {}",
            bpool.tokens.len()
        )));
    }
    let t0 = interner.intern(
        &bpool.tokens[0].symbol,
        parse_address(&bpool.tokens[0].address)?,
        bpool.tokens[0].decimals,
    );
    let t1 = interner.intern(
        &bpool.tokens[1].symbol,
        parse_address(&bpool.tokens[1].address)?,
        bpool.tokens[1].decimals,
    );
    Ok(Arc::new(Pool {
        name: format!("{}/{}", t0.name, t1.name),
        kind: PoolKind::BalancerWeighted,
        address: parse_address(&bpool.id)?,
        tokens: [t0, t1],
        router: None,
    }))
}

fn parse_decimals(s: &str) -> BotResult<u8> {
    let d: u8 = s
        .parse()
        .map_err(|_| BotError::Validation(format!("invalid decimals: {s}")))?;
    if d > 30 {
        return Err(BotError::Validation(format!("decimals {d} out of range")));
    }
    Ok(d)
}

/// Build pools from the YAML overrides. Pool entries reference tokens by
/// name; unknown names are an error so a typo never silently drops a pool.
fn yaml_pools(
    tokens_raw: &str,
    pools_raw: &str,
    interner: &mut TokenInterner,
    uniswap_router: Address,
    sushiswap_router: Address,
) -> BotResult<Vec<Arc<Pool>>> {
    let tokens_file: TokensFile = serde_yaml::from_str(tokens_raw)
        .map_err(|e| BotError::Validation(format!("tokens.yaml parse error: {e}")))?;
    let pools_file: PoolsFile = serde_yaml::from_str(pools_raw)
        .map_err(|e| BotError::Validation(format!("pools.yaml parse error: {e}")))?;

    let mut token_by_name: HashMap<String, Arc<Token>> = HashMap::new();
    for t in &tokens_file.tokens {
        let token = interner.intern(&t.name, parse_address(&t.address)?, t.decimal);
        token_by_name.insert(t.name.clone(), token);
    }

    let mut pools = Vec::with_capacity(pools_file.pools.len());
    for p in &pools_file.pools {
        if p.tokens.len() != 2 {
            return Err(BotError::Validation(format!(
                "pool {} must reference exactly 2 tokens",
                p.name
            )));
        }
        let kind = PoolKind::parse(&p.kind)?;
        let resolve = |name: &str| {
            token_by_name
                .get(name)
                .cloned()
                .ok_or_else(|| BotError::Validation(format!("unknown token name: {name}")))
        };
        let router = match kind {
            PoolKind::UniswapV2 => Some(uniswap_router),
            PoolKind::Sushi => Some(sushiswap_router),
            PoolKind::BalancerWeighted => None,
        };
        pools.push(Arc::new(Pool {
            name: p.name.clone(),
            kind,
            address: parse_address(&p.address)?,
            tokens: [resolve(&p.tokens[0])?, resolve(&p.tokens[1])?],
            router,
        }));
    }
    Ok(pools)
}

/// Sanity and policy filters applied to the merged universe.
fn filter_pools(
    pools: Vec<Arc<Pool>>,
    weth: Address,
    blacklist: &HashSet<Address>,
    only_tokens: Option<&[String]>,
) -> Vec<Arc<Pool>> {
    pools
        .into_iter()
        .filter(|pool| {
            // Degenerate pairs (both sides the same token, WETH/WETH
            // included) never form a usable leg.
            if pool.tokens[0].address == pool.tokens[1].address {
                warn!("rejecting degenerate pool {}", pool.address);
                return false;
            }
            if pool.tokens.iter().any(|t| blacklist.contains(&t.address)) {
                return false;
            }
            if let Some(only) = only_tokens {
                let allowed = |t: &Token| {
                    t.address == weth || only.iter().any(|name| name.eq_ignore_ascii_case(&t.name))
                };
                if !pool.tokens.iter().all(|t| allowed(t)) {
                    return false;
                }
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const UNI_ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
    const SUSHI_ROUTER: Address = address!("d9e1cE17f2641f24aE83637ab66a2cca9C378B9F");
    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    const TOKENS_YAML: &str = r#"
tokens:
  - name: WETH
    address: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
    decimal: 18
  - name: DAI
    address: "0x6b175474e89094c44da98b954eedeac495271d0f"
    decimal: 18
  - name: USDC
    address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
    decimal: 6
"#;

    const POOLS_YAML: &str = r#"
pools:
  - name: WETH/DAI
    type: UNISWAP
    address: "0x1111111111111111111111111111111111111111"
    tokens: [WETH, DAI]
  - name: DAI/USDC
    type: SUSHISWAP
    address: "0x2222222222222222222222222222222222222222"
    tokens: [DAI, USDC]
  - name: WETH/USDC
    type: BPOOL
    address: "0x3333333333333333333333333333333333333333"
    tokens: [WETH, USDC]
"#;

    #[test]
    fn test_yaml_pools_parse_with_routers() {
        let mut interner = TokenInterner::default();
        let pools = yaml_pools(TOKENS_YAML, POOLS_YAML, &mut interner, UNI_ROUTER, SUSHI_ROUTER)
            .unwrap();
        assert_eq!(pools.len(), 3);
        assert_eq!(pools[0].kind, PoolKind::UniswapV2);
        assert_eq!(pools[0].router, Some(UNI_ROUTER));
        assert_eq!(pools[1].kind, PoolKind::Sushi);
        assert_eq!(pools[1].router, Some(SUSHI_ROUTER));
        assert_eq!(pools[2].kind, PoolKind::BalancerWeighted);
        assert_eq!(pools[2].router, None);
    }

    #[test]
    fn test_yaml_tokens_are_interned() {
        let mut interner = TokenInterner::default();
        let pools = yaml_pools(TOKENS_YAML, POOLS_YAML, &mut interner, UNI_ROUTER, SUSHI_ROUTER)
            .unwrap();
        // DAI in pool 0 and pool 1 is the same allocation.
        let dai_a = pools[0].tokens.iter().find(|t| t.name == "DAI").unwrap();
        let dai_b = pools[1].tokens.iter().find(|t| t.name == "DAI").unwrap();
        assert!(Arc::ptr_eq(dai_a, dai_b));
    }

    #[test]
    fn test_unknown_token_name_is_an_error() {
        let broken = r#"
pools:
  - name: WETH/WAT
    type: UNISWAP
    address: "0x1111111111111111111111111111111111111111"
    tokens: [WETH, WAT]
"#;
        let mut interner = TokenInterner::default();
        assert!(yaml_pools(TOKENS_YAML, broken, &mut interner, UNI_ROUTER, SUSHI_ROUTER).is_err());
    }

    #[test]
    fn test_uniswap_subgraph_response_parses() {
        let json = r#"{
            "data": {
                "pairs": [{
                    "id": "0x1111111111111111111111111111111111111111",
                    "token0": {"id": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", "symbol": "WETH", "decimals": "18"},
                    "token1": {"id": "0x6b175474e89094c44da98b954eedeac495271d0f", "symbol": "DAI", "decimals": "18"}
                }]
            }
        }"#;
        let parsed: GraphResponse<UniswapData> = serde_json::from_str(json).unwrap();
        let mut interner = TokenInterner::default();
        let pool = uniswap_pair_to_pool(&parsed.data.pairs[0], &mut interner, UNI_ROUTER).unwrap();
        assert_eq!(pool.name, "WETH/DAI");
        assert_eq!(pool.kind, PoolKind::UniswapV2);
    }

    #[test]
    fn test_balancer_subgraph_response_parses() {
        let json = r#"{
            "data": {
                "pools": [{
                    "id": "0x3333333333333333333333333333333333333333",
                    "tokens": [
                        {"address": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", "symbol": "WETH", "decimals": 18},
                        {"address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "symbol": "USDC", "decimals": 6}
                    ]
                }]
            }
        }"#;
        let parsed: GraphResponse<BalancerData> = serde_json::from_str(json).unwrap();
        let mut interner = TokenInterner::default();
        let pool = balancer_pool_to_pool(&parsed.data.pools[0], &mut interner).unwrap();
        assert_eq!(pool.kind, PoolKind::BalancerWeighted);
        assert_eq!(pool.tokens[1].decimals, 6);
    }

    fn fixture_pools() -> Vec<Arc<Pool>> {
        let mut interner = TokenInterner::default();
        yaml_pools(TOKENS_YAML, POOLS_YAML, &mut interner, UNI_ROUTER, SUSHI_ROUTER).unwrap()
    }

    #[test]
    fn test_blacklist_removes_touching_pools() {
        let blacklist: HashSet<Address> =
            [address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")].into();
        let kept = filter_pools(fixture_pools(), WETH, &blacklist, None);
        // Both USDC pools are gone.
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "WETH/DAI");
    }

    #[test]
    fn test_only_tokens_narrows_universe() {
        let only = vec!["DAI".to_string()];
        let kept = filter_pools(fixture_pools(), WETH, &HashSet::new(), Some(&only));
        // WETH/DAI survives (WETH always allowed); the USDC pools do not.
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "WETH/DAI");
    }

    #[test]
    fn test_degenerate_pool_rejected() {
        let mut interner = TokenInterner::default();
        let weth = interner.intern("WETH", WETH, 18);
        let degenerate = Arc::new(Pool {
            name: "WETH/WETH".into(),
            kind: PoolKind::UniswapV2,
            address: address!("4444444444444444444444444444444444444444"),
            tokens: [weth.clone(), weth],
            router: Some(UNI_ROUTER),
        });
        let kept = filter_pools(vec![degenerate], WETH, &HashSet::new(), None);
        assert!(kept.is_empty());
    }
}
