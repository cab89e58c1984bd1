//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Process-wide attendance policy, passed explicitly to each engine
/// component so tests can vary thresholds without shared mutable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Time of day after which an arrival counts as late ("HH:MM").
    pub cutoff: String,

    /// All-time per-student count that triggers the advisory warning
    /// at insert time.
    pub hard_warning_threshold: usize,

    /// Report-scoped count used to list disciplinary review candidates.
    pub candidate_threshold: usize,

    /// Number of roster rows sent to the store per upsert batch.
    pub import_batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cutoff: "06:30".to_string(),
            hard_warning_threshold: 10,
            candidate_threshold: 5,
            import_batch_size: 300,
        }
    }
}
