//! Centralized Contract Definitions
//!
//! All Solidity interfaces the bot talks to, defined with alloy's `sol!`
//! macro and annotated `#[sol(rpc)]` so instances can make calls through
//! any alloy Provider (with a pinned `block_identifier` where it matters).
//!
//! Author: AI-Generated
//! Created: 2026-07-12

use alloy::sol;

// ── ERC20 ─────────────────────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}

// ── Uniswap V2 / SushiSwap pair ──────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }
}

// ── Balancer weighted pool (BPool) ───────────────────────────────────
//
// The simulator calls calcOutGivenIn on the pool itself rather than
// re-implementing the fixed-point exponentiation: correctness over speed.

sol! {
    #[sol(rpc)]
    interface IBPool {
        function getBalance(address token) external view returns (uint256);
        function getDenormalizedWeight(address token) external view returns (uint256);
        function getSwapFee() external view returns (uint256);
        function calcOutGivenIn(uint256 tokenBalanceIn, uint256 tokenWeightIn, uint256 tokenBalanceOut, uint256 tokenWeightOut, uint256 tokenAmountIn, uint256 swapFee) external pure returns (uint256 tokenAmountOut);
    }
}

// ── Printer (atomic cycle executor) ──────────────────────────────────
//
// The calldata layout is contract-dictated and bit-exact: a 3x7 address
// matrix (XOR-masked, zero-padded, router + leg count in the tail slots of
// Uniswap-family rows), one min-out per Balancer leg or Uniswap run, and
// pool-type codes collapsed by consecutive run. See printer::encoder.

sol! {
    #[sol(rpc)]
    interface IPrinter {
        function arbitrage(address[7][3] tokenPaths, uint256[3] minAmountsOut, uint256 amountIn, uint256 gasCost, uint256[3] poolTypes, uint256 deadlineBlock) external;
    }
}
