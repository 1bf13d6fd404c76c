//! Backward reduction search.
//!
//! One lookup builds one [`Search`]: an arena of analysis steps wired into a
//! graph by reduction edges. A step holds a candidate form; an edge records
//! that some rule could have produced the step's form from a list of simpler
//! sources, each either a dictionary stem or a deeper step. The arena is
//! discarded when the lookup returns; only verified [`Generation`] trees
//! (built by `generation.rs` from this graph) escape.
//!
//! The search is speculative: an edge is kept as soon as every source is
//! grounded, with no judgement about whether the rule would actually accept
//! the rebuilt form. The forward pass prunes later.
//!
//! ## Invariants
//!
//! - `StepId` is an index into `Search::steps`; steps are never removed.
//! - A step's `parent` chain reaches the root step, so rule constraints
//!   accumulated along the way apply to everything below.
//! - Reduction edges only point at steps whose own search has finished
//!   (`outcome` set), so the graph under a kept edge is fully grounded.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::dictionary::Stem;
use crate::engine::budget::SearchBudget;
use crate::engine::compiled::CompiledRules;
use crate::engine::generation::Generation;
use crate::error::{Error, Result};
use crate::lemmatizer::Lemmatizer;
use crate::{Morphology, RuleConstraint, RuleId, SegmentOrigins, WordId};

/// Step identifier (index into the search arena).
pub(crate) type StepId = usize;

/// One source of a reduction edge.
pub(crate) enum SegmentSource<M: Morphology> {
    Stem(Arc<Stem<M>>),
    Step(StepId),
}

impl<M: Morphology> Clone for SegmentSource<M> {
    fn clone(&self) -> Self {
        match self {
            SegmentSource::Stem(stem) => SegmentSource::Stem(stem.clone()),
            SegmentSource::Step(step) => SegmentSource::Step(*step),
        }
    }
}

/// A grounded reduction: `rule` could have produced the owning step's form
/// from these sources.
pub(crate) struct ReductionEdge<M: Morphology> {
    pub(crate) rule: RuleId,
    pub(crate) sources: Vec<SegmentSource<M>>,
}

impl<M: Morphology> Clone for ReductionEdge<M> {
    fn clone(&self) -> Self {
        ReductionEdge { rule: self.rule, sources: self.sources.clone() }
    }
}

pub(crate) struct StepNode<M: Morphology> {
    form: String,
    parent: Option<StepId>,
    rule_constraints: Vec<RuleConstraint<M>>,
    reductions: Vec<ReductionEdge<M>>,
    /// Memo for `rule_allowed`. Keyed by rule alone; the first evaluation
    /// (whichever `up_recursed` flag it carried) wins.
    rule_memo: HashMap<RuleId, bool>,
    /// Set when this step's search has run, so a step shared by several
    /// source combinations is searched once.
    outcome: Option<bool>,
}

/// Read-only view of an analysis step, handed to rule `propose` closures.
pub struct StepView<'s, M: Morphology> {
    steps: &'s [StepNode<M>],
    id: StepId,
}

impl<'s, M: Morphology> StepView<'s, M> {
    /// The form under reduction.
    pub fn form(&self) -> &'s str {
        &self.steps[self.id].form
    }

    /// The step this one was proposed from, if any. Root steps (the surface
    /// form itself) have no parent.
    pub fn parent(&self) -> Option<StepView<'s, M>> {
        self.steps[self.id].parent.map(|id| StepView { steps: self.steps, id })
    }
}

/// The per-lookup search state: step arena, budget, and memo tables.
pub(crate) struct Search<'a, M: Morphology> {
    lemmatizer: &'a Lemmatizer<M>,
    compiled: &'a CompiledRules,
    steps: Vec<StepNode<M>>,
    budget: SearchBudget,
    /// When set, stem lookups synthesize principal-part candidates for this
    /// headword instead of consulting the dictionary index.
    principal_word: Option<WordId>,
    /// Verified generations per step, shared across the trees that embed them.
    pub(in crate::engine) gen_memo: HashMap<StepId, Vec<Arc<Generation<M>>>>,
}

impl<'a, M: Morphology> Search<'a, M> {
    pub(crate) fn new(
        lemmatizer: &'a Lemmatizer<M>,
        compiled: &'a CompiledRules,
        budget: usize,
        principal_word: Option<WordId>,
    ) -> Self {
        Search {
            lemmatizer,
            compiled,
            steps: Vec::new(),
            budget: SearchBudget::new(budget),
            principal_word,
            gen_memo: HashMap::new(),
        }
    }

    pub(crate) fn lemmatizer(&self) -> &'a Lemmatizer<M> {
        self.lemmatizer
    }

    pub(crate) fn steps_allocated(&self) -> usize {
        self.steps.len()
    }

    pub(crate) fn budget_spent(&self) -> usize {
        self.budget.spent()
    }

    pub(crate) fn push_step(
        &mut self,
        form: String,
        parent: Option<StepId>,
        rule_constraints: Vec<RuleConstraint<M>>,
    ) -> StepId {
        let id = self.steps.len();
        self.steps.push(StepNode {
            form,
            parent,
            rule_constraints,
            reductions: Vec::new(),
            rule_memo: HashMap::new(),
            outcome: None,
        });
        id
    }

    pub(in crate::engine) fn step_form(&self, step: StepId) -> &str {
        &self.steps[step].form
    }

    pub(in crate::engine) fn step_reductions(&self, step: StepId) -> &[ReductionEdge<M>] {
        &self.steps[step].reductions
    }

    /// Reduces `step` toward dictionary stems, recording every grounded
    /// reduction edge. Returns whether at least one edge was grounded.
    ///
    /// `all_rules` is the level bucket for this lookup; `restricted`, when
    /// present, replaces it entirely (it is how a rule's precomputed
    /// predecessor set narrows the search below it, and it may contain rules
    /// outside the current bucket).
    pub(crate) fn find_stems(
        &mut self,
        step: StepId,
        all_rules: &[RuleId],
        restricted: Option<&HashSet<RuleId>>,
    ) -> Result<bool> {
        if let Some(done) = self.steps[step].outcome {
            return Ok(done);
        }
        if !self.budget.spend() {
            return Ok(false);
        }

        let lemmatizer = self.lemmatizer;
        let compiled = self.compiled;

        let rule_ids: Vec<RuleId> = match restricted {
            Some(set) => {
                let mut ids: Vec<RuleId> = set.iter().copied().collect();
                ids.sort_unstable();
                ids
            }
            None => all_rules.to_vec(),
        };

        for rule_id in rule_ids {
            // Caller-supplied restricted sets may carry ids no rule has.
            if rule_id >= lemmatizer.rules().len() {
                continue;
            }
            if !self.rule_allowed(step, rule_id, false) {
                continue;
            }
            let rule = &lemmatizer.rules()[rule_id];

            let view = StepView { steps: &self.steps, id: step };
            let Some(proposals) = (rule.propose)(&view) else {
                continue;
            };
            if proposals.is_empty() {
                continue;
            }

            let own_form = self.steps[step].form.clone();
            log::trace!(
                "rule \"{}\" proposed {} reduction(s) for \"{}\"",
                rule.name,
                proposals.len(),
                own_form
            );

            // A proposal of the step's own form with no new rule constraints
            // can never make progress; the rule table is defective.
            for proposal in &proposals {
                for segment in proposal {
                    if segment.form == own_form && segment.rule_constraints.is_empty() {
                        return Err(Error::CyclicRule {
                            rule: rule.name.clone(),
                            form: own_form.clone(),
                        });
                    }
                }
            }

            for proposal in proposals {
                // Build every stem/step combination for the proposal's
                // segments, back to front, so each partial tail is shared.
                // One nested step per segment, shared across combinations.
                let mut combos: Vec<Vec<SegmentSource<M>>> = vec![Vec::new()];
                for segment in proposal.into_iter().rev() {
                    let mut next: Vec<Vec<SegmentSource<M>>> = Vec::new();

                    if segment.origins.contains(SegmentOrigins::STEM) {
                        let stems = match self.principal_word {
                            Some(word) => lemmatizer.propose_principal_parts_stems(
                                word,
                                &segment.form,
                                &segment.stem_constraints,
                            ),
                            None => lemmatizer.find_stems(&segment.form, &segment.stem_constraints),
                        };
                        for stem in stems {
                            for tail in &combos {
                                let mut combo = Vec::with_capacity(tail.len() + 1);
                                combo.push(SegmentSource::Stem(stem.clone()));
                                combo.extend(tail.iter().cloned());
                                next.push(combo);
                            }
                        }
                    }

                    if segment.origins.contains(SegmentOrigins::DERIVED) {
                        let child =
                            self.push_step(segment.form, Some(step), segment.rule_constraints);
                        for tail in &combos {
                            let mut combo = Vec::with_capacity(tail.len() + 1);
                            combo.push(SegmentSource::Step(child));
                            combo.extend(tail.iter().cloned());
                            next.push(combo);
                        }
                    }

                    combos = next;
                }

                for sources in combos {
                    let mut all_grounded = true;
                    for source in &sources {
                        if let SegmentSource::Step(child) = source {
                            let child_restricted =
                                compiled.allowed_predecessors(rule_id).map(|set| set.as_ref());
                            if !self.find_stems(*child, all_rules, child_restricted)? {
                                all_grounded = false;
                                break;
                            }
                        }
                    }
                    if all_grounded {
                        self.steps[step].reductions.push(ReductionEdge { rule: rule_id, sources });
                    }
                }
            }
        }

        let found = !self.steps[step].reductions.is_empty();
        self.steps[step].outcome = Some(found);
        Ok(found)
    }

    /// May `rule` participate in reductions of `step`? Checks the parent
    /// chain first (a constraint applies to everything below the step that
    /// carries it), then this step's own constraints.
    fn rule_allowed(&mut self, step: StepId, rule_id: RuleId, up_recursed: bool) -> bool {
        if let Some(&ok) = self.steps[step].rule_memo.get(&rule_id) {
            return ok;
        }

        if let Some(parent) = self.steps[step].parent {
            if !self.rule_allowed(parent, rule_id, true) {
                self.steps[step].rule_memo.insert(rule_id, false);
                return false;
            }
        }

        let constraints = self.steps[step].rule_constraints.clone();
        let rule = &self.lemmatizer.rules()[rule_id];
        for constraint in &constraints {
            let ok = match constraint {
                RuleConstraint::Allowed(set) => set.contains(&rule_id),
                RuleConstraint::Where(pred) => pred(rule, !up_recursed),
            };
            if !ok {
                self.steps[step].rule_memo.insert(rule_id, false);
                return false;
            }
        }

        self.steps[step].rule_memo.insert(rule_id, true);
        true
    }
}
