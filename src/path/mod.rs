//! Path Enumerator
//!
//! Walks the token-adjacency multigraph (edges = pools) depth-first to
//! produce every cyclic path of length 2..=max_depth that starts and ends
//! in WETH, never using the same pool on two adjacent legs. Paths stream
//! out of a lazy iterator — the full product is O(N^K) in the worst case
//! and callers may stop early — and `find_all_paths` collects, dedupes by
//! the ordered pool tuple and asserts the structural invariants.
//!
//! Author: AI-Generated
//! Created: 2026-07-12

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use alloy::primitives::Address;
use tracing::info;

use crate::error::BotResult;
use crate::types::{ArbitragePath, ConnectingPath, Pool};

pub struct PathFinder {
    pools_by_token: HashMap<Address, Vec<Arc<Pool>>>,
    num_pools: usize,
    weth: Address,
    max_depth: usize,
}

impl PathFinder {
    pub fn new(pools: &[Arc<Pool>], weth: Address, max_depth: usize) -> Self {
        let mut pools_by_token: HashMap<Address, Vec<Arc<Pool>>> = HashMap::new();
        for pool in pools {
            for token in &pool.tokens {
                pools_by_token
                    .entry(token.address)
                    .or_default()
                    .push(pool.clone());
            }
        }
        Self {
            pools_by_token,
            num_pools: pools.len(),
            weth,
            max_depth,
        }
    }

    /// Lazy stream of cycles. Finite and restartable: each call starts a
    /// fresh traversal over the same immutable pool set.
    pub fn iter_paths(&self) -> PathIter<'_> {
        let mut stack = Vec::new();
        for pool in self.pools_by_token.get(&self.weth).into_iter().flatten() {
            if let Some((token_in, token_out)) = pool.token_pair_from(self.weth) {
                // A WETH/WETH pool is rejected at load; guard anyway so the
                // iterator never cycles on a degenerate edge.
                if token_out.address == self.weth {
                    continue;
                }
                stack.push(vec![ConnectingPath {
                    pool: pool.clone(),
                    token_in,
                    token_out,
                }]);
            }
        }
        PathIter {
            finder: self,
            stack,
            ready: VecDeque::new(),
        }
    }

    /// Enumerate, dedup by path identity and validate every cycle.
    /// An invariant violation here is fatal by design.
    pub fn find_all_paths(&self) -> BotResult<Vec<Arc<ArbitragePath>>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut paths: Vec<Arc<ArbitragePath>> = Vec::new();
        for path in self.iter_paths() {
            let id = path.path_id();
            if !seen.insert(id) {
                continue;
            }
            path.validate(self.weth, self.max_depth)?;
            paths.push(Arc::new(path));
        }
        info!(
            "Out of {} pools, PathFinder detected {} arbitrage paths",
            self.num_pools,
            paths.len()
        );
        Ok(paths)
    }

    /// Secondary index for the WATCH strategy: every path that touches a
    /// token, keyed by token address.
    pub fn paths_by_token(
        paths: &[Arc<ArbitragePath>],
    ) -> HashMap<Address, Vec<Arc<ArbitragePath>>> {
        let mut index: HashMap<Address, Vec<Arc<ArbitragePath>>> = HashMap::new();
        for path in paths {
            let mut touched: HashSet<Address> = HashSet::new();
            for leg in &path.legs {
                touched.insert(leg.token_in.address);
                touched.insert(leg.token_out.address);
            }
            for token in touched {
                index.entry(token).or_default().push(path.clone());
            }
        }
        index
    }
}

/// Depth-first traversal state. Partial paths live on an explicit stack;
/// completed cycles queue in `ready` until the consumer pulls them.
pub struct PathIter<'a> {
    finder: &'a PathFinder,
    stack: Vec<Vec<ConnectingPath>>,
    ready: VecDeque<ArbitragePath>,
}

impl Iterator for PathIter<'_> {
    type Item = ArbitragePath;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(done) = self.ready.pop_front() {
                return Some(done);
            }
            let partial = self.stack.pop()?;
            let tail = &partial[partial.len() - 1];
            let current = tail.token_out.clone();
            let last_pool = tail.pool.address;

            for pool in self
                .finder
                .pools_by_token
                .get(&current.address)
                .into_iter()
                .flatten()
            {
                // No immediate reversal through the pool we just crossed.
                if pool.address == last_pool {
                    continue;
                }
                let Some((token_in, token_out)) = pool.token_pair_from(current.address) else {
                    continue;
                };
                let next_leg = ConnectingPath {
                    pool: pool.clone(),
                    token_in,
                    token_out,
                };
                if next_leg.token_out.address == self.finder.weth {
                    if partial.len() + 1 <= self.finder.max_depth {
                        let mut legs = partial.clone();
                        legs.push(next_leg);
                        self.ready.push_back(ArbitragePath::new(legs));
                    }
                } else if partial.len() + 1 < self.finder.max_depth {
                    let mut legs = partial.clone();
                    legs.push(next_leg);
                    self.stack.push(legs);
                }
            }
        }
    }
}
