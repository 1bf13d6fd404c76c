//! A rule-based morphological analysis engine.
//!
//! Given a literal word form and a table of reversible transformation rules,
//! the engine discovers every way the form could have been derived from a
//! known dictionary stem by chained rule application, and reconstructs the
//! corresponding derivation trees together with attached semantic metadata.
//!
//! Analysis is a bidirectional search:
//!
//! ```text
//! rules (all) ──┐
//!              │  CompiledRules::new          (engine/compiled.rs)
//!              └──────────────┬──────────────
//!                             │  level buckets + predecessor sets
//! form ── normalize ──────────┼─ per ascending level:
//!                             v
//!                  Search::find_stems (engine/analysis.rs)
//!                    - backward reduction pass
//!                    - rule-constraint propagation
//!                    - cycle guard + search budget
//!                             │
//!                             v
//!                  verified_generations (engine/generation.rs)
//!                    - forward rebuild + verification
//!                    - stem + rule constraint checks
//!                             │
//!                             v
//!                     Vec<Resolution>
//! ```
//!
//! The engine carries no language data of its own. Rules are plain structs
//! holding closures, parameterized over consumer-defined metadata via the
//! [`Morphology`] bundle trait; a demonstration Latin table lives under
//! `src/rules/latin/`.

use std::collections::HashSet;
use std::sync::Arc;

#[macro_use]
mod macros;
mod dictionary;
mod engine;
mod error;
mod lemmatizer;
pub mod rules;

pub use dictionary::{Headword, Stem, WordId};
pub use engine::{GenSource, Generation, LevelMetrics, LookupMetrics, StepView};
pub use error::{Error, Result};
pub use lemmatizer::{Lemmatizer, PrincipalPartQuery, Resolution};

// --- Core shared types -------------------------------------------------------

/// Bundle of the consumer-defined metadata types the engine is generic over.
///
/// The engine never inspects these payloads; it only stores them, threads them
/// through derivation trees, and hands them back to rule closures and
/// constraint predicates.
pub trait Morphology: 'static {
    /// Attached to a [`Headword`] (e.g. a gloss). Never read by the engine.
    type WordMeta: Send + Sync + 'static;
    /// Attached to a [`Stem`]. `Clone` is required so the principal-part
    /// reconciliation path can synthesize candidate stems from metadata sets.
    type StemMeta: Clone + Send + Sync + 'static;
    /// Attached to a [`Rule`], visible to constraint predicates.
    type RuleMeta: Send + Sync + 'static;
    /// Computed by a rule's `annotate` hook for a completed derivation node.
    type GenMeta: Send + Sync + 'static;
}

/// Rule identifier (index into the lemmatizer's rule vector).
pub type RuleId = usize;

/// Backward proposal generator: given the step under reduction, propose the
/// simpler form(s) this rule could have produced it from, or `None`.
pub type Proposer<M> =
    Box<dyn Fn(&StepView<'_, M>) -> Option<Vec<ReductionProposal<M>>> + Send + Sync>;

/// Forward verifier: accept or reject a fully assembled derivation node.
pub type GenerationVerifier<M> = Box<dyn Fn(&Generation<M>) -> bool + Send + Sync>;

/// Optional metadata hook: compute the semantic payload for a completed
/// derivation node. Runs before verification.
pub type Annotator<M> =
    Box<dyn Fn(&Generation<M>) -> Option<<M as Morphology>::GenMeta> + Send + Sync>;

/// Setup-time predecessor filter: may the given rule have produced the form
/// this rule reduces? Evaluated once per rule pair in `finish_rule_setup`.
pub type PredecessorFilter<M> = Box<dyn Fn(&Rule<M>) -> bool + Send + Sync>;

/// Shared predicate over a completed derivation (stem generation constraints).
pub type GenerationCheck<M> = Arc<dyn Fn(&Generation<M>) -> bool + Send + Sync>;

/// Shared predicate over a final lookup result (global result constraints,
/// principal-part form checks).
pub type ResultCheck<M> = Arc<dyn Fn(&Resolution<M>) -> bool + Send + Sync>;

/// Shared rule predicate. The `bool` argument is the "immediately deeper"
/// flag: `true` when the candidate rule would apply directly below the step
/// that carries the constraint, `false` for anywhere further down.
pub type RulePredicate<M> = Arc<dyn Fn(&Rule<M>, bool) -> bool + Send + Sync>;

/// Shared stem predicate used by segment stem-constraints.
pub type StemPredicate<M> = Arc<dyn Fn(&Stem<M>) -> bool + Send + Sync>;

/// A transformation rule: a backward proposal generator plus a forward
/// verifier, with optional metadata and predecessor hooks.
///
/// Rules are data, not a trait hierarchy: behavior varies per rule but rules
/// share no state, so the two required behaviors are boxed function values.
/// Immutable once [`Lemmatizer::finish_rule_setup`] has run.
pub struct Rule<M: Morphology> {
    /// Human-readable name, used in diagnostics and reports. Table-generated
    /// rules build these dynamically, so this is an owned `String`.
    pub name: String,
    /// Search tier. Level 0 is always tried first; higher levels are
    /// consulted only if every lower level yields nothing.
    pub level: usize,
    /// Consumer payload, visible to rule-constraint predicates.
    pub metadata: M::RuleMeta,
    /// Backward proposal generator.
    pub propose: Proposer<M>,
    /// Forward verifier, applied to the completed derivation node.
    pub verify: GenerationVerifier<M>,
    /// Optional metadata hook, run on each candidate derivation before
    /// verification.
    pub annotate: Option<Annotator<M>>,
    /// Optional filter precomputed at setup time into the set of rules
    /// allowed to have produced this rule's enclosing form.
    pub predecessor_filter: Option<PredecessorFilter<M>>,
    /// When set together with `predecessor_filter`, an empty precomputed set
    /// is logged as a likely rule-table defect.
    pub expects_predecessors: bool,
}

impl<M: Morphology> std::fmt::Debug for Rule<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("propose", &"<function>")
            .field("verify", &"<function>")
            .field("expects_predecessors", &self.expects_predecessors)
            .finish()
    }
}

bitflags::bitflags! {
    /// How a proposed segment is allowed to bottom out.
    ///
    /// By default a segment is matched against dictionary stems *and* opened
    /// as a nested reduction; rules can narrow that (e.g. a derivational
    /// suffix whose base must be a bare stem).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentOrigins: u8 {
        const STEM    = 1 << 0;
        const DERIVED = 1 << 1;
    }
}

impl Default for SegmentOrigins {
    fn default() -> Self {
        Self::STEM | Self::DERIVED
    }
}

/// One segment of a reduction proposal: a candidate simpler form plus the
/// constraints that govern how it may be grounded.
pub struct Segment<M: Morphology> {
    /// The literal characters of the proposed form.
    pub form: String,
    /// Constraints on which rules may be used for *all* deeper reductions of
    /// this segment.
    pub rule_constraints: Vec<RuleConstraint<M>>,
    /// Constraints on which dictionary stems may directly terminate this
    /// segment. Applied only at this level, not to deeper reductions.
    pub stem_constraints: Vec<StemConstraint<M>>,
    /// Allowed origins for this segment.
    pub origins: SegmentOrigins,
}

impl<M: Morphology> Segment<M> {
    pub fn new(form: impl Into<String>) -> Self {
        Segment {
            form: form.into(),
            rule_constraints: Vec::new(),
            stem_constraints: Vec::new(),
            origins: SegmentOrigins::default(),
        }
    }

    pub fn rule_constraint(mut self, constraint: RuleConstraint<M>) -> Self {
        self.rule_constraints.push(constraint);
        self
    }

    pub fn stem_constraint(mut self, constraint: StemConstraint<M>) -> Self {
        self.stem_constraints.push(constraint);
        self
    }

    pub fn origins(mut self, origins: SegmentOrigins) -> Self {
        self.origins = origins;
        self
    }
}

/// An ordered list of segments. Multiple segments model rules that split one
/// surface form into several morphemes, each grounded separately.
pub type ReductionProposal<M> = Vec<Segment<M>>;

/// Constraint on which rules may participate below a given analysis step.
pub enum RuleConstraint<M: Morphology> {
    /// Membership in a precomputed set. Cheap to check, and doubles as the
    /// restricted search set in principal-part reconciliation.
    Allowed(Arc<HashSet<RuleId>>),
    /// Arbitrary predicate, receiving the candidate rule and the
    /// "immediately deeper" flag.
    Where(RulePredicate<M>),
}

impl<M: Morphology> Clone for RuleConstraint<M> {
    fn clone(&self) -> Self {
        match self {
            RuleConstraint::Allowed(set) => RuleConstraint::Allowed(set.clone()),
            RuleConstraint::Where(pred) => RuleConstraint::Where(pred.clone()),
        }
    }
}

/// Constraint on which dictionary stems may directly terminate a segment.
pub struct StemConstraint<M: Morphology> {
    /// Predicate over a candidate stem.
    pub accepts: StemPredicate<M>,
    /// Candidate metadata for principal-part reconciliation: when the caller
    /// already knows which stem parsings are possible, the engine synthesizes
    /// hypothetical stems from the smallest such set instead of consulting
    /// the dictionary index.
    pub candidate_metadata: Option<Arc<Vec<M::StemMeta>>>,
}

impl<M: Morphology> StemConstraint<M> {
    pub fn new(accepts: StemPredicate<M>) -> Self {
        StemConstraint { accepts, candidate_metadata: None }
    }

    pub fn with_candidates(accepts: StemPredicate<M>, candidates: Vec<M::StemMeta>) -> Self {
        StemConstraint { accepts, candidate_metadata: Some(Arc::new(candidates)) }
    }
}

impl<M: Morphology> Clone for StemConstraint<M> {
    fn clone(&self) -> Self {
        StemConstraint {
            accepts: self.accepts.clone(),
            candidate_metadata: self.candidate_metadata.clone(),
        }
    }
}
