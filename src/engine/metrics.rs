//! Lookup metrics.
//!
//! Small opt-in structs for observing what a lookup did:
//!
//! - `Lemmatizer::lookup` for normal operation.
//! - `Lemmatizer::lookup_with_metrics` for profiling and for inspecting which
//!   level finally resolved a form.

use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

/// Timing and search counters for one lookup.
#[derive(Debug, Default, Clone)]
pub struct LookupMetrics {
    /// Total elapsed time for the lookup.
    pub total: Duration,
    /// One entry per level tried, in order. Lookup stops at the first level
    /// that produces results, so usually this has a single entry.
    pub levels: Vec<LevelMetrics>,
}

/// Counters for a single level attempt.
#[derive(Debug, Default, Clone)]
pub struct LevelMetrics {
    /// The level tried.
    pub level: usize,
    /// Elapsed time for this level (backward search + forward verification).
    pub duration: Duration,
    /// Number of rules in this level's bucket.
    pub rules: usize,
    /// Analysis steps allocated during the backward search.
    pub steps: usize,
    /// Search-budget units consumed.
    pub budget_spent: usize,
    /// Verified results produced at this level.
    pub results: usize,
}
