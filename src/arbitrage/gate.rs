//! Consecutive-block gate
//!
//! FRESH and WATCH run on a periodically reloaded pool universe, so a
//! single-block "opportunity" is often a stale-subgraph artifact. The gate
//! requires the same path to be ruled fillable in C consecutive blocks
//! before a transaction goes out; any non-fillable observation, a dispatch
//! or a universe reload resets the streak.

use std::collections::HashMap;

/// Single-writer state owned by the strategy loop task.
pub struct ConsecutiveGate {
    required: u32,
    streaks: HashMap<String, u32>,
}

impl ConsecutiveGate {
    /// `required` is clamped to at least 1 (1 = dispatch immediately).
    pub fn new(required: u32) -> Self {
        Self {
            required: required.max(1),
            streaks: HashMap::new(),
        }
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    /// Record a fillable observation for this path. Returns true when the
    /// streak reaches the threshold; the streak resets on that step so the
    /// next dispatch needs a fresh run of C blocks.
    pub fn record_fillable(&mut self, path_id: &str) -> bool {
        let streak = self.streaks.entry(path_id.to_string()).or_insert(0);
        *streak += 1;
        if *streak >= self.required {
            self.streaks.remove(path_id);
            true
        } else {
            false
        }
    }

    /// A non-fillable observation breaks the streak.
    pub fn record_not_fillable(&mut self, path_id: &str) {
        self.streaks.remove(path_id);
    }

    /// Current streak for a path (0 when untracked).
    pub fn streak(&self, path_id: &str) -> u32 {
        self.streaks.get(path_id).copied().unwrap_or(0)
    }

    /// Drop every streak. Called after a pool-universe reload: the paths
    /// were re-enumerated and old identities may no longer mean the same
    /// route.
    pub fn reset(&mut self) {
        self.streaks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// With C=2, the first fillable block arms the gate, the second
    /// fires it, and the streak is back to zero afterwards.
    #[test]
    fn test_fires_on_second_consecutive_block() {
        let mut gate = ConsecutiveGate::new(2);
        assert!(!gate.record_fillable("path-a"));
        assert_eq!(gate.streak("path-a"), 1);
        assert!(gate.record_fillable("path-a"));
        assert_eq!(gate.streak("path-a"), 0);
    }

    #[test]
    fn test_non_fillable_resets_streak() {
        let mut gate = ConsecutiveGate::new(3);
        assert!(!gate.record_fillable("path-a"));
        assert!(!gate.record_fillable("path-a"));
        gate.record_not_fillable("path-a");
        assert_eq!(gate.streak("path-a"), 0);
        assert!(!gate.record_fillable("path-a"));
    }

    #[test]
    fn test_threshold_one_dispatches_immediately() {
        let mut gate = ConsecutiveGate::new(1);
        assert!(gate.record_fillable("path-a"));
        assert_eq!(gate.streak("path-a"), 0);
    }

    #[test]
    fn test_zero_clamps_to_one() {
        let mut gate = ConsecutiveGate::new(0);
        assert_eq!(gate.required(), 1);
        assert!(gate.record_fillable("path-a"));
    }

    #[test]
    fn test_paths_tracked_independently() {
        let mut gate = ConsecutiveGate::new(2);
        assert!(!gate.record_fillable("path-a"));
        assert!(!gate.record_fillable("path-b"));
        assert!(gate.record_fillable("path-a"));
        assert_eq!(gate.streak("path-b"), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut gate = ConsecutiveGate::new(2);
        gate.record_fillable("path-a");
        gate.record_fillable("path-b");
        gate.reset();
        assert_eq!(gate.streak("path-a"), 0);
        assert_eq!(gate.streak("path-b"), 0);
    }
}
