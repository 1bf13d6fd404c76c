//! Reduction and generation engine.
//!
//! The engine lives in focused submodules under `src/engine/` while keeping
//! public paths stable (for example `crate::engine::Generation` and
//! `crate::engine::LookupMetrics`).
//!
//! ## How the parts work together
//!
//! One lookup is a pipeline:
//!
//! ```text
//! rules (all)  ──┐
//!               │  CompiledRules::new           (compiled.rs)
//!               └───────────────┬──────────────
//!                               │  level buckets + predecessor sets
//! form ─────────────────────────┼─ per ascending level:
//!                               v
//!                     Search::find_stems (analysis.rs)
//!                       - backward reduction, depth-first
//!                       - constraint propagation
//!                       - cycle guard, budget (budget.rs)
//!                               │
//!                               v
//!                     verified_generations (generation.rs)
//!                       - forward rebuild, bottom-up
//!                       - annotate, then verify
//!                               │
//!                               v
//!                        Vec<Arc<Generation>>
//! ```
//!
//! Backward reduction over-generates on purpose: a proposal only has to be
//! *plausibly* reversible. The forward pass is the arbiter; nothing reaches
//! the caller without being rebuilt from its stems and accepted by every
//! verifier along the way.
//!
//! ## Responsibilities by module
//!
//! - `compiled.rs`: derives `CompiledRules` from the rule list and builds
//!   cheap indexes (cumulative level buckets, allowed-predecessor sets).
//! - `analysis.rs`: the per-call search arena; backward reduction of a form
//!   into candidate stem/step graphs.
//! - `budget.rs`: the per-call step budget that bounds the backward search.
//! - `generation.rs`: forward reconstruction and verification of derivation
//!   trees (`Generation`).
//! - `metrics.rs`: optional per-level timing/debug data for lookups.

#[path = "engine/analysis.rs"]
mod analysis;
#[path = "engine/budget.rs"]
mod budget;
#[path = "engine/compiled.rs"]
mod compiled;
#[path = "engine/generation.rs"]
mod generation;
#[path = "engine/metrics.rs"]
mod metrics;

pub(crate) use analysis::Search;
pub(crate) use budget::DEFAULT_SEARCH_BUDGET;
pub(crate) use compiled::CompiledRules;

pub use analysis::StepView;
pub use generation::{GenSource, Generation};
pub use metrics::{LevelMetrics, LookupMetrics};
