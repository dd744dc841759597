//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable parameters for retrieval and the deterministic rule layers.
///
/// Constructed once and passed by reference into each component; service
/// credentials live with the client constructors, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distinct chunks kept in the grounding context after dedup (top-N).
    pub context_chunks: usize,
    /// Nearest neighbours requested per query variant.
    pub per_query_results: usize,
    /// Chunks retrieved (and cited) for a free-text question.
    pub answer_results: usize,
    /// Soft per-person cost cap in currency units.
    pub per_person_cap: f64,
    /// When no guest data is supplied, treat the expense as fully
    /// attributable to foreign guests. This mirrors the original policy;
    /// set to `false` to fail closed (zero allowable) instead.
    pub assume_foreign_when_unknown: bool,
    /// Source-name markers of the primary regulation namespace. Chunks
    /// from matching sources rank as authoritative.
    pub authoritative_prefixes: Vec<String>,
    /// Timeout applied to each external call (embedding, index, reasoning).
    pub upstream_timeout_secs: u64,
    /// Bounded concurrency for batch classification.
    pub batch_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_chunks: 6,
            per_query_results: 4,
            answer_results: 5,
            per_person_cap: 150.0,
            assume_foreign_when_unknown: true,
            authoritative_prefixes: vec!["K-Fund".into(), "K_Fund".into()],
            upstream_timeout_secs: 30,
            batch_concurrency: 4,
        }
    }
}

impl EngineConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Whether a source name belongs to the primary regulation namespace.
    pub fn is_authoritative(&self, source: &str) -> bool {
        self.authoritative_prefixes
            .iter()
            .any(|marker| source.contains(marker.as_str()))
    }
}
