// Core data model: tokens, pools, cyclic paths and evaluated plans.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BotError;

/// An ERC20 token. Immutable; shared by `Arc` and interned by address in
/// the pool loader so every pool referencing the same token holds the same
/// allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    pub fn new(name: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            name: name.into(),
            address,
            decimals,
        }
    }

    /// `to_wei(x) = floor(x * 10^decimals)`, computed exactly.
    ///
    /// The float is first lifted into a decimal mantissa/scale pair so the
    /// scaling happens in integer arithmetic; `6.05` WETH becomes exactly
    /// 6_050_000_000_000_000_000 and not a neighbouring float artifact.
    pub fn to_wei(&self, amount: f64) -> U256 {
        let Some(dec) = Decimal::from_f64(amount) else {
            return U256::ZERO;
        };
        if dec.is_sign_negative() {
            return U256::ZERO;
        }
        let mantissa = U256::from(dec.mantissa().unsigned_abs());
        let num = mantissa * U256::from(10u64).pow(U256::from(self.decimals));
        num / U256::from(10u64).pow(U256::from(dec.scale()))
    }

    /// Lossy wei -> display units. Only for logging and notifications;
    /// all decision math stays on `U256`.
    pub fn from_wei(&self, amount_wei: U256) -> f64 {
        let raw: f64 = amount_wei.to_string().parse().unwrap_or(f64::MAX);
        raw / 10f64.powi(self.decimals as i32)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Pool kinds we can simulate and execute through the printer contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    UniswapV2,
    Sushi,
    BalancerWeighted,
}

impl PoolKind {
    /// Pool-type code in the printer contract's `pool_types` vector.
    /// SushiSwap executes through the Uniswap V2 router interface and
    /// shares its code on-chain.
    pub fn contract_code(&self) -> u8 {
        match self {
            PoolKind::BalancerWeighted => 1,
            PoolKind::UniswapV2 | PoolKind::Sushi => 2,
        }
    }

    /// Constant-product pools are simulated locally from reserves;
    /// Balancer pools are quoted through the pool's own view function.
    pub fn is_constant_product(&self) -> bool {
        matches!(self, PoolKind::UniswapV2 | PoolKind::Sushi)
    }

    pub fn parse(s: &str) -> Result<Self, BotError> {
        match s {
            "UNISWAP" => Ok(PoolKind::UniswapV2),
            "SUSHISWAP" => Ok(PoolKind::Sushi),
            "BPOOL" => Ok(PoolKind::BalancerWeighted),
            other => Err(BotError::Validation(format!("unknown pool type: {other}"))),
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::UniswapV2 => write!(f, "UNISWAP"),
            PoolKind::Sushi => write!(f, "SUSHISWAP"),
            PoolKind::BalancerWeighted => write!(f, "BPOOL"),
        }
    }
}

/// A swap venue over two tokens. The pool value itself is immutable;
/// its reserves live on-chain and are read at a pinned block on demand.
#[derive(Debug, Clone)]
pub struct Pool {
    pub name: String,
    pub kind: PoolKind,
    pub address: Address,
    pub tokens: [Arc<Token>; 2],
    /// Router for path-based AMMs (Uniswap family). None for Balancer,
    /// which is called directly on the pool.
    pub router: Option<Address>,
}

impl Pool {
    pub fn contains_token(&self, address: Address) -> bool {
        self.tokens.iter().any(|t| t.address == address)
    }

    /// Orient the token pair so the first element is `token_in`.
    pub fn token_pair_from(&self, token_in: Address) -> Option<(Arc<Token>, Arc<Token>)> {
        if self.tokens[0].address == token_in {
            Some((self.tokens[0].clone(), self.tokens[1].clone()))
        } else if self.tokens[1].address == token_in {
            Some((self.tokens[1].clone(), self.tokens[0].clone()))
        } else {
            None
        }
    }
}

/// One leg of a cycle: a pool traversed in a fixed direction.
#[derive(Debug, Clone)]
pub struct ConnectingPath {
    pub pool: Arc<Pool>,
    pub token_in: Arc<Token>,
    pub token_out: Arc<Token>,
}

/// An ordered list of legs forming a WETH -> ... -> WETH cycle.
///
/// Identity is the tuple of ordered pool addresses; two paths through the
/// same pools in the same order are the same path regardless of how the
/// enumerator reached them.
#[derive(Debug, Clone)]
pub struct ArbitragePath {
    pub legs: Vec<ConnectingPath>,
}

impl ArbitragePath {
    pub fn new(legs: Vec<ConnectingPath>) -> Self {
        Self { legs }
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn path_id(&self) -> String {
        let mut id = String::with_capacity(self.legs.len() * 40);
        for leg in &self.legs {
            id.push_str(&format!("{:x}", leg.pool.address));
        }
        id
    }

    pub fn token_out(&self) -> &Arc<Token> {
        &self.legs[self.legs.len() - 1].token_out
    }

    pub fn contains_pool(&self, address: Address) -> bool {
        self.legs.iter().any(|leg| leg.pool.address == address)
    }

    pub fn touches_token(&self, address: Address) -> bool {
        self.legs
            .iter()
            .any(|leg| leg.token_in.address == address || leg.token_out.address == address)
    }

    /// Enforce the structural invariants every enumerated path must hold.
    /// A violation here means the enumerator itself is broken, which is
    /// fatal for the process.
    pub fn validate(&self, weth: Address, max_depth: usize) -> Result<(), BotError> {
        if self.legs.len() < 2 || self.legs.len() > max_depth {
            return Err(BotError::PathInvariant(format!(
                "path length {} outside [2, {}]",
                self.legs.len(),
                max_depth
            )));
        }
        if self.legs[0].token_in.address != weth {
            return Err(BotError::PathInvariant(
                "entry leg does not start in WETH".into(),
            ));
        }
        if self.token_out().address != weth {
            return Err(BotError::PathInvariant(
                "terminal leg does not end in WETH".into(),
            ));
        }
        for window in self.legs.windows(2) {
            if window[0].token_out.address != window[1].token_in.address {
                return Err(BotError::PathInvariant(
                    "token chain broken between adjacent legs".into(),
                ));
            }
            if window[0].pool.address == window[1].pool.address {
                return Err(BotError::PathInvariant(
                    "adjacent legs reuse the same pool".into(),
                ));
            }
        }
        Ok(())
    }

    /// "WETH -> DAI (UNISWAP) -> WETH (BPOOL)" for logs.
    pub fn route_label(&self) -> String {
        let mut label = self.legs[0].token_in.name.clone();
        for leg in &self.legs {
            label.push_str(&format!(" -> {} ({})", leg.token_out.name, leg.pool.kind));
        }
        label
    }
}

/// An evaluated, fillable cycle: the path plus everything the dispatcher
/// needs to submit it. Owned snapshot of a single simulation; never mutated
/// after the evaluator hands it over.
#[derive(Debug, Clone)]
pub struct ArbitragePlan {
    pub path: Arc<ArbitragePath>,
    /// Input amount that maximised profit, in WETH wei.
    pub amount_in: U256,
    /// Simulated output of each leg at `amount_in`, same snapshot.
    pub amount_outs: Vec<U256>,
    /// Per-leg revert bounds; the last equals `amount_in + gas_cost`.
    pub min_amount_outs: Vec<U256>,
    /// Gas price the evaluation assumed, in wei.
    pub gas_price: u128,
    /// `gas_price * GAS_UNITS`, in wei.
    pub gas_cost: U256,
    /// `amount_outs.last() - amount_in` (gross, before gas).
    pub profit: U256,
    /// Last block the transaction is allowed to mine in.
    pub max_block_height: u64,
}

impl ArbitragePlan {
    /// Net gain after the assumed gas cost. Zero when gas eats the edge.
    pub fn net_profit(&self) -> U256 {
        self.profit.saturating_sub(self.gas_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn weth() -> Arc<Token> {
        Arc::new(Token::new(
            "WETH",
            address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
            18,
        ))
    }

    fn dai() -> Arc<Token> {
        Arc::new(Token::new(
            "DAI",
            address!("6b175474e89094c44da98b954eedeac495271d0f"),
            18,
        ))
    }

    fn pool(kind: PoolKind, addr: Address, a: Arc<Token>, b: Arc<Token>) -> Arc<Pool> {
        Arc::new(Pool {
            name: format!("{}/{}", a.name, b.name),
            kind,
            address: addr,
            tokens: [a, b],
            router: None,
        })
    }

    fn two_leg_path() -> ArbitragePath {
        let (w, d) = (weth(), dai());
        let p1 = pool(
            PoolKind::UniswapV2,
            address!("1111111111111111111111111111111111111111"),
            w.clone(),
            d.clone(),
        );
        let p2 = pool(
            PoolKind::BalancerWeighted,
            address!("2222222222222222222222222222222222222222"),
            w.clone(),
            d.clone(),
        );
        ArbitragePath::new(vec![
            ConnectingPath {
                pool: p1,
                token_in: w.clone(),
                token_out: d.clone(),
            },
            ConnectingPath {
                pool: p2,
                token_in: d,
                token_out: w,
            },
        ])
    }

    #[test]
    fn test_to_wei_exact() {
        let t = weth();
        assert_eq!(t.to_wei(1.0), U256::from(10u64).pow(U256::from(18)));
        assert_eq!(
            t.to_wei(6.05),
            U256::from(6_050_000_000_000_000_000u128)
        );
        assert_eq!(t.to_wei(0.0), U256::ZERO);
        assert_eq!(t.to_wei(-1.0), U256::ZERO);
    }

    #[test]
    fn test_to_wei_low_decimals() {
        let usdc = Token::new("USDC", Address::ZERO, 6);
        assert_eq!(usdc.to_wei(1.5), U256::from(1_500_000u64));
        // floor semantics: sub-unit precision is truncated
        assert_eq!(usdc.to_wei(0.0000001), U256::ZERO);
    }

    #[test]
    fn test_wei_round_trip() {
        let t = weth();
        for x in [0.1, 1.0, 3.0, 6.0, 123.456] {
            let back = t.from_wei(t.to_wei(x));
            assert!((back - x).abs() < 1e-9, "{x} -> {back}");
        }
    }

    #[test]
    fn test_path_id_is_pool_tuple() {
        let path = two_leg_path();
        assert_eq!(
            path.path_id(),
            "11111111111111111111111111111111111111112222222222222222222222222222222222222222"
        );
    }

    #[test]
    fn test_two_leg_path_validates() {
        let path = two_leg_path();
        assert!(path.validate(weth().address, 3).is_ok());
    }

    #[test]
    fn test_validate_rejects_same_pool_twice() {
        let (w, d) = (weth(), dai());
        let p = pool(
            PoolKind::UniswapV2,
            address!("1111111111111111111111111111111111111111"),
            w.clone(),
            d.clone(),
        );
        let path = ArbitragePath::new(vec![
            ConnectingPath {
                pool: p.clone(),
                token_in: w.clone(),
                token_out: d.clone(),
            },
            ConnectingPath {
                pool: p,
                token_in: d,
                token_out: w,
            },
        ]);
        assert!(path.validate(weth().address, 3).is_err());
    }

    #[test]
    fn test_validate_rejects_non_weth_entry() {
        let mut path = two_leg_path();
        path.legs.swap(0, 1); // now starts in DAI and the chain is broken
        assert!(path.validate(weth().address, 3).is_err());
    }

    #[test]
    fn test_pool_type_codes() {
        assert_eq!(PoolKind::BalancerWeighted.contract_code(), 1);
        assert_eq!(PoolKind::UniswapV2.contract_code(), 2);
        assert_eq!(PoolKind::Sushi.contract_code(), 2);
    }

    #[test]
    fn test_pool_kind_parse() {
        assert_eq!(PoolKind::parse("UNISWAP").unwrap(), PoolKind::UniswapV2);
        assert_eq!(PoolKind::parse("SUSHISWAP").unwrap(), PoolKind::Sushi);
        assert_eq!(
            PoolKind::parse("BPOOL").unwrap(),
            PoolKind::BalancerWeighted
        );
        assert!(PoolKind::parse("CURVE").is_err());
    }
}
