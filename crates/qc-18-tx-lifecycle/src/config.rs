//! Tracker configuration from environment variables.

use std::env;

/// Configuration for one tracked chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Memoize `is_tx_valid` / `is_tx_successful` answers per (block, tx)
    pub memoize_collaborator_calls: bool,

    /// Forward pruned and superseded blocks to `ChainReader::unpin`
    pub unpin_on_finalize: bool,

    /// Upper bound on parent-link walks
    pub max_ancestry_depth: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            memoize_collaborator_calls: true,
            unpin_on_finalize: true,
            max_ancestry_depth: 100_000,
        }
    }
}

impl TrackerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_TRACKER_MEMOIZE`: Memoize collaborator predicates (default: true)
    /// - `QC_TRACKER_UNPIN`: Unpin removed blocks on finalization (default: true)
    /// - `QC_TRACKER_MAX_DEPTH`: Maximum ancestry walk (default: 100000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            memoize_collaborator_calls: env::var("QC_TRACKER_MEMOIZE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.memoize_collaborator_calls),

            unpin_on_finalize: env::var("QC_TRACKER_UNPIN")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.unpin_on_finalize),

            max_ancestry_depth: env::var("QC_TRACKER_MAX_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|depth| *depth > 0)
                .unwrap_or(defaults.max_ancestry_depth),
        }
    }

    pub fn with_memoization(mut self, enabled: bool) -> Self {
        self.memoize_collaborator_calls = enabled;
        self
    }

    pub fn with_unpin(mut self, enabled: bool) -> Self {
        self.unpin_on_finalize = enabled;
        self
    }

    pub fn with_max_ancestry_depth(mut self, depth: usize) -> Self {
        self.max_ancestry_depth = depth;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    value.to_lowercase() != "false" && value != "0"
}
