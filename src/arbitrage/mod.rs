//! Arbitrage Engine
//!
//! The trigger-independent core every strategy drives: evaluate a path set
//! at one pinned block, report opportunities, and hand gate-cleared plans
//! to the printer. FRESH and WATCH wire in a consecutive-block gate; SCAN
//! and SNIPE dispatch ungated.
//!
//! Architecture:
//!     evaluator.rs — simulate, optimise, min-outs, fillable predicate
//!     gate.rs      — consecutive-block dispatch gate
//!     mod.rs       — per-cycle orchestration
//!
//! Author: AI-Generated
//! Created: 2026-07-13

pub mod evaluator;
pub mod gate;

pub use evaluator::{EvalParams, Evaluator};
pub use gate::ConsecutiveGate;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::notify::{format_opportunity, Notifier};
use crate::printer::Printer;
use crate::types::{ArbitragePath, ArbitragePlan, Token};

/// What one cycle produced: the fillable plans (best first) and how many
/// cleared the gate and went to the dispatcher.
pub struct CycleReport {
    pub fillable: Vec<ArbitragePlan>,
    pub dispatched: usize,
}

pub struct ArbitrageEngine {
    evaluator: Evaluator,
    printer: Arc<Printer>,
    notifier: Arc<Notifier>,
    weth: Arc<Token>,
    gate: Option<ConsecutiveGate>,
}

impl ArbitrageEngine {
    pub fn new(
        evaluator: Evaluator,
        printer: Arc<Printer>,
        notifier: Arc<Notifier>,
        weth: Arc<Token>,
        gate: Option<ConsecutiveGate>,
    ) -> Self {
        Self {
            evaluator,
            printer,
            notifier,
            weth,
            gate,
        }
    }

    /// Reset the consecutive gate, called after every pool-universe reload.
    pub fn reset_gate(&mut self) {
        if let Some(gate) = &mut self.gate {
            gate.reset();
        }
    }

    /// Evaluate `paths` at `latest_block` and dispatch what clears the
    /// gate. Dispatches are serial; evaluation fans out internally.
    pub async fn run_cycle(
        &mut self,
        paths: &[Arc<ArbitragePath>],
        latest_block: u64,
        gas_price: u128,
    ) -> CycleReport {
        let plans = self
            .evaluator
            .evaluate_all(paths, latest_block, gas_price)
            .await;

        // Any path that did not come back fillable breaks its streak.
        if let Some(gate) = &mut self.gate {
            let fillable_ids: HashSet<String> =
                plans.iter().map(|p| p.path.path_id()).collect();
            for path in paths {
                let id = path.path_id();
                if !fillable_ids.contains(&id) {
                    gate.record_not_fillable(&id);
                }
            }
        }

        let mut dispatched = 0;
        for plan in &plans {
            let id = plan.path.path_id();
            let (cleared, streak) = match &mut self.gate {
                Some(gate) => {
                    let cleared = gate.record_fillable(&id);
                    let streak = if cleared {
                        gate.required()
                    } else {
                        gate.streak(&id)
                    };
                    (cleared, Some(streak))
                }
                None => (true, None),
            };

            info!(
                "Opportunity: {} | profit {} ETH",
                plan.path.route_label(),
                self.weth.from_wei(plan.profit)
            );
            self.notifier
                .send_opportunity(&format_opportunity(plan, &self.weth, latest_block, streak))
                .await;

            if !cleared {
                continue;
            }
            match self.printer.dispatch(plan).await {
                Ok(outcome) => {
                    info!("dispatch outcome: {outcome:?}");
                    dispatched += 1;
                }
                Err(e) => warn!("dispatch failed for {}: {e}", plan.path.route_label()),
            }
        }

        CycleReport {
            fillable: plans,
            dispatched,
        }
    }
}
