//! Error taxonomy
//!
//! Errors are classified by cause, not by module, so callers can apply the
//! cycle-isolation rules uniformly: a failing path never takes down the
//! cycle, a failing cycle never takes down the loop. Only configuration and
//! path-invariant errors are fatal.
//!
//! Author: AI-Generated
//! Created: 2026-07-12

use alloy::primitives::{Address, B256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// RPC hiccup (timeout, 5xx, dropped WS). Retried next cycle.
    #[error("transient rpc error: {0}")]
    TransientRpc(String),

    /// A simulator read or view call failed for one pool. The path is
    /// skipped; the cycle continues.
    #[error("simulation failed on pool {pool}: {reason}")]
    SimulationFailed { pool: Address, reason: String },

    /// The path enumerator produced a malformed path. Fatal: the pool
    /// universe is inconsistent and the process should restart.
    #[error("path invariant violated: {0}")]
    PathInvariant(String),

    /// eth_estimateGas reverted for a plan's calldata. The plan is dropped.
    #[error("dry run reverted: {0}")]
    DryRunRevert(String),

    /// A dispatch-time sanity cap was breached (reported to the error sink).
    #[error("plan validation failed: {0}")]
    Validation(String),

    /// Receipt never showed up inside the wait window.
    #[error("timed out waiting for receipt of {0}")]
    TxTimeout(B256),

    /// Mined with status=0.
    #[error("transaction {0} reverted on-chain")]
    TxReverted(B256),

    /// Required environment variable absent. The process must not start.
    #[error("missing configuration: {0}")]
    ConfigMissing(String),
}

impl BotError {
    /// Fatal errors abort the process; everything else is contained at the
    /// path or plan level.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::PathInvariant(_) | BotError::ConfigMissing(_))
    }

    pub fn simulation(pool: Address, reason: impl Into<String>) -> Self {
        BotError::SimulationFailed {
            pool,
            reason: reason.into(),
        }
    }
}

pub type BotResult<T> = Result<T, BotError>;
