//! Printer calldata encoder
//!
//! The printer contract's layout is fixed and bit-exact:
//!
//!   - `token_paths`: 3 rows x 7 address slots, zero-padded. A Balancer leg
//!     fills one row with [pool, token_in, token_out]. A run of consecutive
//!     same-kind Uniswap-family legs fills one row with the token sequence;
//!     the final two slots of such a row carry the router address and an
//!     address-encoded count of the non-zero token slots.
//!   - Non-zero addresses are XORed with the 20-byte mask before placement;
//!     zero slots stay zero.
//!   - `min_amounts_out`: one slot per Balancer leg or Uniswap run (the run's
//!     last leg bound); unused slots hold the ~1e31 sentinel.
//!   - `pool_types`: codes collapsed by run (BALANCER=1, UNISWAP-family=2);
//!     unused slots hold the sentinel 8.
//!
//! Author: AI-Generated
//! Created: 2026-07-14

use alloy::primitives::{Address, U256};
use once_cell::sync::Lazy;

use crate::error::{BotError, BotResult};
use crate::types::{ArbitragePlan, PoolKind};

/// K: rows in the token-path matrix (and max legs per cycle).
pub const TOKEN_PATH_ROWS: usize = 3;

/// P: address slots per row. The last two slots of a Uniswap-family row are
/// router and count, leaving 5 for tokens.
pub const ADDRESSES_PER_ROW: usize = 7;

/// Code marking an unused pool_types slot.
pub const POOL_TYPE_UNUSED: u8 = 8;

/// Sentinel for unused min-out slots: 9_999_999_999_999 * 10^18.
pub static MIN_OUT_SENTINEL: Lazy<U256> =
    Lazy::new(|| U256::from(9_999_999_999_999u64) * U256::from(10u64).pow(U256::from(18)));

/// The fully laid-out arguments of one `arbitrage(...)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterCalldata {
    pub token_paths: [[Address; ADDRESSES_PER_ROW]; TOKEN_PATH_ROWS],
    pub min_amounts_out: [U256; TOKEN_PATH_ROWS],
    pub pool_types: [u8; TOKEN_PATH_ROWS],
}

/// XOR an address with the mask. The zero address is the matrix padding
/// value and must survive unchanged.
pub fn mask_address(address: Address, mask: Address) -> Address {
    if address.is_zero() {
        return address;
    }
    let mut bytes = address.0;
    for (b, m) in bytes.iter_mut().zip(mask.0.iter()) {
        *b ^= m;
    }
    Address::from(bytes)
}

/// Lay a plan out into the contract's matrix form.
pub fn encode(plan: &ArbitragePlan, mask: Address) -> BotResult<PrinterCalldata> {
    let legs = &plan.path.legs;
    if legs.len() != plan.min_amount_outs.len() {
        return Err(BotError::Validation(
            "plan min-out vector does not match leg count".into(),
        ));
    }

    let mut rows: Vec<[Address; ADDRESSES_PER_ROW]> = Vec::new();
    let mut min_outs: Vec<U256> = Vec::new();
    let mut types: Vec<u8> = Vec::new();
    let mut run_tokens: Vec<Address> = Vec::new();

    for (i, leg) in legs.iter().enumerate() {
        match leg.pool.kind {
            PoolKind::BalancerWeighted => {
                let mut row = [Address::ZERO; ADDRESSES_PER_ROW];
                row[0] = mask_address(leg.pool.address, mask);
                row[1] = mask_address(leg.token_in.address, mask);
                row[2] = mask_address(leg.token_out.address, mask);
                rows.push(row);
                types.push(leg.pool.kind.contract_code());
                min_outs.push(plan.min_amount_outs[i]);
            }
            kind => {
                run_tokens.push(mask_address(leg.token_in.address, mask));
                let run_ends = i + 1 >= legs.len() || legs[i + 1].pool.kind != kind;
                if run_ends {
                    run_tokens.push(mask_address(leg.token_out.address, mask));
                    let num_tokens = run_tokens.len();
                    if num_tokens > ADDRESSES_PER_ROW - 2 {
                        return Err(BotError::Validation(format!(
                            "{num_tokens}-token run does not fit a {ADDRESSES_PER_ROW}-slot row"
                        )));
                    }
                    let router = leg.pool.router.ok_or_else(|| {
                        BotError::Validation(format!(
                            "pool {} has no router for path execution",
                            leg.pool.address
                        ))
                    })?;
                    let mut row = [Address::ZERO; ADDRESSES_PER_ROW];
                    row[..num_tokens].copy_from_slice(&run_tokens);
                    row[ADDRESSES_PER_ROW - 2] = router;
                    row[ADDRESSES_PER_ROW - 1] = count_slot(num_tokens);
                    rows.push(row);
                    types.push(kind.contract_code());
                    min_outs.push(plan.min_amount_outs[i]);
                    run_tokens.clear();
                }
            }
        }
    }

    if rows.len() > TOKEN_PATH_ROWS {
        return Err(BotError::Validation(format!(
            "{} grouped rows exceed the {TOKEN_PATH_ROWS}-row matrix",
            rows.len()
        )));
    }

    let mut token_paths = [[Address::ZERO; ADDRESSES_PER_ROW]; TOKEN_PATH_ROWS];
    let mut min_amounts_out = [*MIN_OUT_SENTINEL; TOKEN_PATH_ROWS];
    let mut pool_types = [POOL_TYPE_UNUSED; TOKEN_PATH_ROWS];
    for (i, row) in rows.into_iter().enumerate() {
        token_paths[i] = row;
        min_amounts_out[i] = min_outs[i];
        pool_types[i] = types[i];
    }

    Ok(PrinterCalldata {
        token_paths,
        min_amounts_out,
        pool_types,
    })
}

/// `0x…000N` - an address whose low byte encodes the number of non-zero
/// token slots in its row.
fn count_slot(num_tokens: usize) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = num_tokens as u8;
    Address::from(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArbitragePath, ConnectingPath, Pool, Token};
    use alloy::primitives::address;
    use proptest::prelude::*;
    use std::sync::Arc;

    const MASK: Address = address!("5afe5afe5afe5afe5afe5afe5afe5afe5afe5afe");
    const ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

    fn token(name: &str, addr: Address) -> Arc<Token> {
        Arc::new(Token::new(name, addr, 18))
    }

    fn leg(kind: PoolKind, pool_addr: Address, a: &Arc<Token>, b: &Arc<Token>) -> ConnectingPath {
        ConnectingPath {
            pool: Arc::new(Pool {
                name: format!("{}/{}", a.name, b.name),
                kind,
                address: pool_addr,
                tokens: [a.clone(), b.clone()],
                router: if kind.is_constant_product() {
                    Some(ROUTER)
                } else {
                    None
                },
            }),
            token_in: a.clone(),
            token_out: b.clone(),
        }
    }

    fn plan(legs: Vec<ConnectingPath>, min_outs: Vec<U256>) -> ArbitragePlan {
        let n = legs.len();
        ArbitragePlan {
            path: Arc::new(ArbitragePath::new(legs)),
            amount_in: U256::from(3u64),
            amount_outs: vec![U256::from(1u64); n],
            min_amount_outs: min_outs,
            gas_price: 1,
            gas_cost: U256::from(1u64),
            profit: U256::from(1u64),
            max_block_height: 100,
        }
    }

    #[test]
    fn test_mask_is_involution_and_preserves_zero() {
        let a = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        assert_eq!(mask_address(mask_address(a, MASK), MASK), a);
        assert_eq!(mask_address(Address::ZERO, MASK), Address::ZERO);
        assert_ne!(mask_address(a, MASK), a);
    }

    proptest! {
        #[test]
        fn prop_mask_round_trips(bytes in proptest::array::uniform20(any::<u8>())) {
            let a = Address::from(bytes);
            prop_assert_eq!(mask_address(mask_address(a, MASK), MASK), a);
        }
    }

    /// BALANCER(P1, A->B) then a two-leg UNISWAP run (B->C->WETH)
    /// encodes to one Balancer row, one run row with router and count 3,
    /// and one sentinel row.
    #[test]
    fn test_balancer_then_uniswap_run_layout() {
        let weth = token("WETH", address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        let a = token("AAA", address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
        let b = token("BBB", address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"));
        let p1 = address!("1111111111111111111111111111111111111111");

        let legs = vec![
            leg(PoolKind::BalancerWeighted, p1, &weth, &a),
            leg(
                PoolKind::UniswapV2,
                address!("2222222222222222222222222222222222222222"),
                &a,
                &b,
            ),
            leg(
                PoolKind::UniswapV2,
                address!("3333333333333333333333333333333333333333"),
                &b,
                &weth,
            ),
        ];
        let min_outs = vec![U256::from(11u64), U256::from(22u64), U256::from(33u64)];
        let calldata = encode(&plan(legs, min_outs), MASK).unwrap();

        // Row 0: Balancer pool plus its oriented pair, masked.
        assert_eq!(calldata.token_paths[0][0], mask_address(p1, MASK));
        assert_eq!(calldata.token_paths[0][1], mask_address(weth.address, MASK));
        assert_eq!(calldata.token_paths[0][2], mask_address(a.address, MASK));
        assert_eq!(calldata.token_paths[0][3], Address::ZERO);

        // Row 1: token sequence A -> B -> WETH, router, count 3.
        assert_eq!(calldata.token_paths[1][0], mask_address(a.address, MASK));
        assert_eq!(calldata.token_paths[1][1], mask_address(b.address, MASK));
        assert_eq!(calldata.token_paths[1][2], mask_address(weth.address, MASK));
        assert_eq!(calldata.token_paths[1][3], Address::ZERO);
        assert_eq!(calldata.token_paths[1][4], Address::ZERO);
        assert_eq!(calldata.token_paths[1][5], ROUTER);
        assert_eq!(calldata.token_paths[1][6].0[19], 3);

        // Row 2: unused.
        assert_eq!(calldata.token_paths[2], [Address::ZERO; ADDRESSES_PER_ROW]);

        // One min-out per Balancer leg or run; the run takes its last leg.
        assert_eq!(
            calldata.min_amounts_out,
            [U256::from(11u64), U256::from(33u64), *MIN_OUT_SENTINEL]
        );
        assert_eq!(calldata.pool_types, [1, 2, POOL_TYPE_UNUSED]);
    }

    /// Sushi and Uniswap legs never share a run: each gets its own row and
    /// router even though they share the on-chain type code.
    #[test]
    fn test_mixed_family_breaks_run() {
        let weth = token("WETH", address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        let a = token("AAA", address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));

        let legs = vec![
            leg(
                PoolKind::UniswapV2,
                address!("2222222222222222222222222222222222222222"),
                &weth,
                &a,
            ),
            leg(
                PoolKind::Sushi,
                address!("3333333333333333333333333333333333333333"),
                &a,
                &weth,
            ),
        ];
        let min_outs = vec![U256::from(1u64), U256::from(2u64)];
        let calldata = encode(&plan(legs, min_outs), MASK).unwrap();

        assert_eq!(calldata.token_paths[0][6].0[19], 2);
        assert_eq!(calldata.token_paths[1][6].0[19], 2);
        assert_eq!(calldata.pool_types, [2, 2, POOL_TYPE_UNUSED]);
        assert_eq!(
            calldata.min_amounts_out,
            [U256::from(1u64), U256::from(2u64), *MIN_OUT_SENTINEL]
        );
    }

    /// Unmasking every non-zero token slot recovers the source addresses.
    #[test]
    fn test_unmask_recovers_sources() {
        let weth = token("WETH", address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        let a = token("AAA", address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
        let legs = vec![
            leg(
                PoolKind::UniswapV2,
                address!("2222222222222222222222222222222222222222"),
                &weth,
                &a,
            ),
            leg(
                PoolKind::Sushi,
                address!("3333333333333333333333333333333333333333"),
                &a,
                &weth,
            ),
        ];
        let calldata = encode(
            &plan(legs, vec![U256::from(1u64), U256::from(2u64)]),
            MASK,
        )
        .unwrap();
        let row = calldata.token_paths[0];
        assert_eq!(mask_address(row[0], MASK), weth.address);
        assert_eq!(mask_address(row[1], MASK), a.address);
    }

    #[test]
    fn test_missing_router_is_rejected() {
        let weth = token("WETH", address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        let a = token("AAA", address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
        let strip_router = |leg: ConnectingPath| ConnectingPath {
            pool: Arc::new(Pool {
                router: None,
                ..(*leg.pool).clone()
            }),
            ..leg
        };
        let l1 = strip_router(leg(
            PoolKind::UniswapV2,
            address!("2222222222222222222222222222222222222222"),
            &weth,
            &a,
        ));
        let l2 = strip_router(leg(
            PoolKind::UniswapV2,
            address!("3333333333333333333333333333333333333333"),
            &a,
            &weth,
        ));
        let result = encode(
            &plan(vec![l1, l2], vec![U256::from(1u64), U256::from(2u64)]),
            MASK,
        );
        assert!(matches!(result, Err(BotError::Validation(_))));
    }
}
