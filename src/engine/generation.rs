//! Forward reconstruction and verification.
//!
//! The backward search over-generates; this pass is the arbiter. For every
//! reduction edge of a step it rebuilds the candidate derivations bottom-up,
//! runs the rule's `annotate` hook, then checks, in order: the generation
//! constraints of every stem the derivation is built directly on, and the
//! rule's own `verify` closure. Only derivations that pass everything become
//! [`Generation`] trees.
//!
//! A step with several reduction edges, or an edge whose sources each admit
//! several sub-derivations, yields one candidate per combination (cartesian
//! product). Sub-trees are `Arc`-shared across the combinations that embed
//! them.

use std::sync::Arc;

use crate::dictionary::Stem;
use crate::engine::analysis::{Search, SegmentSource, StepId};
use crate::{Morphology, RuleId};

/// One source of a derivation node.
pub enum GenSource<M: Morphology> {
    /// A dictionary stem the derivation bottoms out on.
    Stem(Arc<Stem<M>>),
    /// A deeper derivation whose output form this node consumes.
    Derived(Arc<Generation<M>>),
}

impl<M: Morphology> Clone for GenSource<M> {
    fn clone(&self) -> Self {
        match self {
            GenSource::Stem(stem) => GenSource::Stem(stem.clone()),
            GenSource::Derived(generation) => GenSource::Derived(generation.clone()),
        }
    }
}

/// A verified derivation node: `rule` applied to `sources` produces `form`.
///
/// The root of a tree is the surface form; leaves are dictionary stems.
pub struct Generation<M: Morphology> {
    form: String,
    rule: RuleId,
    rule_name: String,
    sources: Vec<GenSource<M>>,
    metadata: Option<M::GenMeta>,
}

impl<M: Morphology> Generation<M> {
    /// The form this node produces.
    pub fn form(&self) -> &str {
        &self.form
    }

    /// The rule that produced this node.
    pub fn rule(&self) -> RuleId {
        self.rule
    }

    /// The producing rule's name, for diagnostics and reports.
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// The sources the rule consumed, in segment order.
    pub fn sources(&self) -> &[GenSource<M>] {
        &self.sources
    }

    /// Metadata computed by the rule's `annotate` hook, if any.
    pub fn metadata(&self) -> Option<&M::GenMeta> {
        self.metadata.as_ref()
    }
}

impl<M: Morphology> std::fmt::Debug for Generation<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation")
            .field("form", &self.form)
            .field("rule", &self.rule_name)
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl<'a, M: Morphology> Search<'a, M> {
    /// All verified derivation trees for `step`, assuming `find_stems` has
    /// already run on it. Memoized, so a step embedded in several trees is
    /// verified once and shared.
    pub(crate) fn verified_generations(&mut self, step: StepId) -> Vec<Arc<Generation<M>>> {
        if let Some(cached) = self.gen_memo.get(&step) {
            return cached.clone();
        }

        let lemmatizer = self.lemmatizer();
        let edges = self.step_reductions(step).to_vec();
        let form = self.step_form(step).to_string();
        let mut verified: Vec<Arc<Generation<M>>> = Vec::new();

        for edge in edges {
            // One candidate source list per combination of sub-derivations,
            // built back to front so partial tails are shared.
            let mut permutations: Vec<Vec<GenSource<M>>> = vec![Vec::new()];
            for source in edge.sources.iter().rev() {
                let mut next: Vec<Vec<GenSource<M>>> = Vec::new();
                match source {
                    SegmentSource::Stem(stem) => {
                        for tail in &permutations {
                            let mut candidate = Vec::with_capacity(tail.len() + 1);
                            candidate.push(GenSource::Stem(stem.clone()));
                            candidate.extend(tail.iter().cloned());
                            next.push(candidate);
                        }
                    }
                    SegmentSource::Step(child) => {
                        for sub in self.verified_generations(*child) {
                            for tail in &permutations {
                                let mut candidate = Vec::with_capacity(tail.len() + 1);
                                candidate.push(GenSource::Derived(sub.clone()));
                                candidate.extend(tail.iter().cloned());
                                next.push(candidate);
                            }
                        }
                    }
                }
                permutations = next;
            }

            let rule = &lemmatizer.rules()[edge.rule];
            'candidates: for sources in permutations {
                let mut generation = Generation {
                    form: form.clone(),
                    rule: edge.rule,
                    rule_name: rule.name.clone(),
                    sources,
                    metadata: None,
                };
                if let Some(annotate) = &rule.annotate {
                    generation.metadata = annotate(&generation);
                }
                for source in &generation.sources {
                    if let GenSource::Stem(stem) = source {
                        if !stem.verify_forward(&generation) {
                            continue 'candidates;
                        }
                    }
                }
                if (rule.verify)(&generation) {
                    verified.push(Arc::new(generation));
                } else {
                    log::trace!("rule \"{}\" rejected candidate \"{}\"", rule.name, generation.form);
                }
            }
        }

        self.gen_memo.insert(step, verified.clone());
        verified
    }
}
