//! The lemmatizer: dictionary, rule table, and the lookup entry points.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::dictionary::{Headword, Stem, WordId};
use crate::engine::{
    CompiledRules, DEFAULT_SEARCH_BUDGET, Generation, LevelMetrics, LookupMetrics, Search,
};
use crate::error::{Error, Result};
use crate::{Morphology, ResultCheck, Rule, RuleConstraint, RuleId, StemConstraint};

type Normalizer = Box<dyn Fn(&str) -> String + Send + Sync>;

/// One answer from a lookup: either the form *is* a dictionary stem, or it is
/// derived from one or more stems by a verified chain of rules.
pub enum Resolution<M: Morphology> {
    Stem(Arc<Stem<M>>),
    Derived(Arc<Generation<M>>),
}

impl<M: Morphology> Resolution<M> {
    /// The surface form this resolution accounts for.
    pub fn form(&self) -> &str {
        match self {
            Resolution::Stem(stem) => stem.form(),
            Resolution::Derived(generation) => generation.form(),
        }
    }
}

impl<M: Morphology> Clone for Resolution<M> {
    fn clone(&self) -> Self {
        match self {
            Resolution::Stem(stem) => Resolution::Stem(stem.clone()),
            Resolution::Derived(generation) => Resolution::Derived(generation.clone()),
        }
    }
}

impl<M: Morphology> std::fmt::Debug for Resolution<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Stem(stem) => f.debug_tuple("Stem").field(stem).finish(),
            Resolution::Derived(generation) => f.debug_tuple("Derived").field(generation).finish(),
        }
    }
}

/// Arguments to [`Lemmatizer::find_stem_candidates_from_principal_part`].
///
/// The caller knows a form is a principal part of `word` (say, from a
/// dictionary import) but not which stem it embeds. `rule_constraint` limits
/// the search to the rules that relate principal parts to stems,
/// `direct_stem_constraint` carries the candidate stem parsings for the case
/// where the form is itself the stem, and `parsed_form_check` accepts only
/// analyses whose resulting parsing matches the principal part slot.
pub struct PrincipalPartQuery<M: Morphology> {
    pub word: WordId,
    pub form: String,
    pub rule_constraint: RuleConstraint<M>,
    pub direct_stem_constraint: StemConstraint<M>,
    pub parsed_form_check: ResultCheck<M>,
}

/// A dictionary plus a frozen rule table. Build one with `add_word` /
/// `add_stem` / `add_rule`, call [`finish_rule_setup`](Self::finish_rule_setup)
/// once, then share it freely: lookups take `&self` and carry their own
/// search state.
pub struct Lemmatizer<M: Morphology> {
    /// Applied, in registration order, to user input and to stem forms as
    /// they are added.
    normalizers: Vec<Normalizer>,
    words: Vec<Headword<M>>,
    stems_by_form: HashMap<String, Vec<Arc<Stem<M>>>>,
    rules: Vec<Rule<M>>,
    compiled: Option<CompiledRules>,
    general_results_constraints: Vec<ResultCheck<M>>,
    search_budget: usize,
}

impl<M: Morphology> Default for Lemmatizer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Morphology> Lemmatizer<M> {
    pub fn new() -> Self {
        Lemmatizer {
            normalizers: Vec::new(),
            words: Vec::new(),
            stems_by_form: HashMap::new(),
            rules: Vec::new(),
            compiled: None,
            general_results_constraints: Vec::new(),
            search_budget: DEFAULT_SEARCH_BUDGET,
        }
    }

    // --- Setup ---------------------------------------------------------------

    /// Registers a string normalizer (e.g. for Latin, folding `v` to `u`).
    /// Applied to both user input and dictionary stem forms.
    pub fn add_string_normalizer(&mut self, normalizer: impl Fn(&str) -> String + Send + Sync + 'static) {
        self.normalizers.push(Box::new(normalizer));
    }

    pub fn normalize(&self, form: &str) -> String {
        let mut form = form.to_string();
        for normalizer in &self.normalizers {
            form = normalizer(&form);
        }
        form
    }

    pub fn add_word(&mut self, metadata: M::WordMeta) -> WordId {
        let id = self.words.len();
        self.words.push(Headword::new(metadata));
        id
    }

    /// Creates a stem under `word` and indexes it. The form is normalized.
    pub fn add_stem(
        &mut self,
        word: WordId,
        form: &str,
        metadata: M::StemMeta,
    ) -> Result<Arc<Stem<M>>> {
        if word >= self.words.len() {
            return Err(Error::UnknownWord(word));
        }
        let form = self.normalize(form);
        let stem = Stem::new(form, word, metadata);
        self.index_stem(word, stem.clone());
        Ok(stem)
    }

    /// Indexes a pre-built stem (e.g. a principal-part candidate accepted by
    /// the caller). The stem must already belong to `word`; its form is
    /// assumed normalized.
    pub fn adopt_stem(&mut self, word: WordId, stem: Arc<Stem<M>>) -> Result<()> {
        if word >= self.words.len() {
            return Err(Error::UnknownWord(word));
        }
        if stem.word() != word {
            return Err(Error::ForeignStem { form: stem.form().to_string() });
        }
        self.index_stem(word, stem);
        Ok(())
    }

    fn index_stem(&mut self, word: WordId, stem: Arc<Stem<M>>) {
        self.stems_by_form.entry(stem.form().to_string()).or_default().push(stem.clone());
        self.words[word].push_stem(stem);
    }

    pub fn headword(&self, word: WordId) -> Option<&Headword<M>> {
        self.words.get(word)
    }

    pub fn rule(&self, rule: RuleId) -> Option<&Rule<M>> {
        self.rules.get(rule)
    }

    pub(crate) fn rules(&self) -> &[Rule<M>] {
        &self.rules
    }

    pub fn add_rule(&mut self, rule: Rule<M>) -> Result<RuleId> {
        if self.compiled.is_some() {
            return Err(Error::RulesFrozen);
        }
        let id = self.rules.len();
        self.rules.push(rule);
        Ok(id)
    }

    /// Freezes the rule table and builds the lookup indexes (level buckets,
    /// predecessor sets). Must be called exactly once, before any lookup.
    pub fn finish_rule_setup(&mut self) -> Result<()> {
        if self.compiled.is_some() {
            return Err(Error::SetupFinished);
        }
        self.compiled = Some(CompiledRules::new(&self.rules));
        Ok(())
    }

    /// Registers a predicate every lookup result must pass (e.g. "a bare
    /// stem is not a word").
    pub fn add_general_results_constraint(&mut self, check: ResultCheck<M>) {
        self.general_results_constraints.push(check);
    }

    /// Overrides the per-lookup search budget (default 10 000 reduction
    /// attempts). One lookup shares its budget across every level it tries.
    pub fn set_search_budget(&mut self, limit: usize) {
        self.search_budget = limit;
    }

    fn meets_general_results_constraints(&self, result: &Resolution<M>) -> bool {
        self.general_results_constraints.iter().all(|check| check(result))
    }

    // --- Lookup --------------------------------------------------------------

    /// Analyzes a surface form: every verified derivation from dictionary
    /// stems, plus the form's own stem matches. Levels are tried in
    /// ascending order; the first level with results wins. Empty (or blank
    /// input) is a normal outcome, not an error.
    pub fn lookup(&self, form: &str) -> Result<Vec<Resolution<M>>> {
        self.lookup_with_metrics(form).map(|(results, _)| results)
    }

    /// [`lookup`](Self::lookup), with per-level timing and search counters.
    pub fn lookup_with_metrics(&self, form: &str) -> Result<(Vec<Resolution<M>>, LookupMetrics)> {
        let compiled = self.compiled.as_ref().ok_or(Error::SetupNotFinished)?;
        let started = Instant::now();
        let mut metrics = LookupMetrics::default();

        let form = self.normalize(form);
        if form.trim().is_empty() {
            metrics.total = started.elapsed();
            return Ok((Vec::new(), metrics));
        }

        let mut budget = self.search_budget;
        for level in 0..compiled.num_levels() {
            let level_started = Instant::now();
            let bucket = compiled.level_bucket(level);
            let (results, steps, budget_spent) =
                self.lookup_with_rules(compiled, bucket, &form, budget)?;
            budget = budget.saturating_sub(budget_spent);
            log::debug!(
                "\"{form}\" level {level}: {} result(s), {steps} step(s), {budget_spent} budget",
                results.len()
            );
            metrics.levels.push(LevelMetrics {
                level,
                duration: level_started.elapsed(),
                rules: bucket.len(),
                steps,
                budget_spent,
                results: results.len(),
            });
            if !results.is_empty() {
                metrics.total = started.elapsed();
                return Ok((results, metrics));
            }
        }

        metrics.total = started.elapsed();
        Ok((Vec::new(), metrics))
    }

    fn lookup_with_rules(
        &self,
        compiled: &CompiledRules,
        rule_ids: &[RuleId],
        form: &str,
        budget: usize,
    ) -> Result<(Vec<Resolution<M>>, usize, usize)> {
        let mut search = Search::new(self, compiled, budget, None);
        let root = search.push_step(form.to_string(), None, Vec::new());
        search.find_stems(root, rule_ids, None)?;

        let mut out = Vec::new();
        for generation in search.verified_generations(root) {
            let result = Resolution::Derived(generation);
            if self.meets_general_results_constraints(&result) {
                out.push(result);
            }
        }
        for stem in self.find_stems(form, &[]) {
            let result = Resolution::Stem(stem);
            if self.meets_general_results_constraints(&result) {
                out.push(result);
            }
        }
        Ok((out, search.steps_allocated(), search.budget_spent()))
    }

    /// Dictionary stems matching `form` exactly, filtered by `constraints`.
    /// The form is not normalized here; pass normalized forms.
    pub fn find_stems(&self, form: &str, constraints: &[StemConstraint<M>]) -> Vec<Arc<Stem<M>>> {
        let Some(stems) = self.stems_by_form.get(form) else {
            return Vec::new();
        };
        stems
            .iter()
            .filter(|stem| constraints.iter().all(|constraint| (constraint.accepts)(stem)))
            .cloned()
            .collect()
    }

    // --- Principal-part reconciliation ---------------------------------------

    /// Works out which stem(s) of `word` a known principal part could embed.
    ///
    /// Runs the level-0 search with the query's rule constraint as the root
    /// constraint; stem lookups synthesize candidate stems for `word` from
    /// the constraints' candidate metadata instead of consulting the
    /// dictionary, so the stems inside the returned derivations are
    /// hypotheses. The caller picks the ones it believes and registers them
    /// with [`adopt_stem`](Self::adopt_stem).
    pub fn find_stem_candidates_from_principal_part(
        &self,
        query: PrincipalPartQuery<M>,
    ) -> Result<Vec<Resolution<M>>> {
        let compiled = self.compiled.as_ref().ok_or(Error::SetupNotFinished)?;
        if query.word >= self.words.len() {
            return Err(Error::UnknownWord(query.word));
        }
        let form = self.normalize(&query.form);

        let restricted = match &query.rule_constraint {
            RuleConstraint::Allowed(set) => Some(set.clone()),
            RuleConstraint::Where(_) => None,
        };

        let mut search = Search::new(self, compiled, self.search_budget, Some(query.word));
        let root = search.push_step(form.clone(), None, vec![query.rule_constraint.clone()]);
        search.find_stems(root, compiled.level_bucket(0), restricted.as_deref())?;

        let mut out = Vec::new();
        for generation in search.verified_generations(root) {
            let result = Resolution::Derived(generation);
            if self.meets_general_results_constraints(&result) && (query.parsed_form_check)(&result)
            {
                out.push(result);
            }
        }
        for stem in self.propose_principal_parts_stems(
            query.word,
            &form,
            std::slice::from_ref(&query.direct_stem_constraint),
        ) {
            let result = Resolution::Stem(stem);
            if self.meets_general_results_constraints(&result) && (query.parsed_form_check)(&result)
            {
                out.push(result);
            }
        }
        Ok(out)
    }

    /// Synthesizes candidate stems of `word` for `form`, one per entry in
    /// the smallest candidate-metadata set among `constraints`. No candidate
    /// metadata means no candidates; the `accepts` predicates are not
    /// consulted here.
    pub(crate) fn propose_principal_parts_stems(
        &self,
        word: WordId,
        form: &str,
        constraints: &[StemConstraint<M>],
    ) -> Vec<Arc<Stem<M>>> {
        let smallest = constraints
            .iter()
            .filter_map(|constraint| constraint.candidate_metadata.as_ref())
            .min_by_key(|candidates| candidates.len());
        let Some(candidates) = smallest else {
            return Vec::new();
        };
        candidates
            .iter()
            .map(|metadata| Stem::new(form.to_string(), word, metadata.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{Segment, SegmentOrigins, StepView};

    struct Toy;

    impl Morphology for Toy {
        type WordMeta = &'static str;
        type StemMeta = &'static str;
        type RuleMeta = ();
        type GenMeta = String;
    }

    /// Strip-a-suffix rule: reduces `base + suffix` to `base`.
    fn suffix_rule(suffix: &'static str, level: usize) -> Rule<Toy> {
        rule! {
            name: format!("-{suffix}"),
            level: level,
            metadata: (),
            propose: move |step: &StepView<'_, Toy>| {
                let base = step.form().strip_suffix(suffix)?;
                if base.is_empty() {
                    return None;
                }
                Some(vec![vec![Segment::new(base)]])
            },
            verify: |_: &Generation<Toy>| true,
        }
    }

    fn toy_with_rules(rules: Vec<Rule<Toy>>) -> Lemmatizer<Toy> {
        let mut lemmatizer = Lemmatizer::new();
        let word = lemmatizer.add_word("to love");
        lemmatizer.add_stem(word, "am", "verb stem").unwrap();
        for rule in rules {
            lemmatizer.add_rule(rule).unwrap();
        }
        lemmatizer.finish_rule_setup().unwrap();
        lemmatizer
    }

    #[test]
    fn resolves_bare_stem() {
        let lemmatizer = toy_with_rules(vec![]);
        let results = lemmatizer.lookup("am").unwrap();
        assert_eq!(results.len(), 1);
        assert!(matches!(&results[0], Resolution::Stem(stem) if stem.form() == "am"));
    }

    #[test]
    fn resolves_single_suffix() {
        let lemmatizer = toy_with_rules(vec![suffix_rule("o", 0)]);
        let results = lemmatizer.lookup("amo").unwrap();
        assert_eq!(results.len(), 1);
        let Resolution::Derived(generation) = &results[0] else {
            panic!("expected a derivation");
        };
        assert_eq!(generation.form(), "amo");
        assert_eq!(generation.rule_name(), "-o");
        assert!(
            matches!(&generation.sources()[0], crate::GenSource::Stem(stem) if stem.form() == "am")
        );
    }

    #[test]
    fn resolves_chained_suffixes() {
        // amabat = am + aba + t, two rule applications deep.
        let lemmatizer = toy_with_rules(vec![suffix_rule("aba", 0), suffix_rule("t", 0)]);
        let results = lemmatizer.lookup("amabat").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].form(), "amabat");
    }

    #[test]
    fn accepted_derivations_reconstruct_the_input() {
        // A verified derivation is the reduction run forward again: at every
        // node, the source form plus the stripped suffix must rebuild the
        // analyzed form exactly.
        let lemmatizer = toy_with_rules(vec![suffix_rule("aba", 0), suffix_rule("t", 0)]);
        let results = lemmatizer.lookup("amabat").unwrap();
        assert_eq!(results.len(), 1);
        let Resolution::Derived(outer) = &results[0] else {
            panic!("expected a derivation");
        };
        assert_eq!(outer.rule_name(), "-t");
        let crate::GenSource::Derived(inner) = &outer.sources()[0] else {
            panic!("expected a nested derivation");
        };
        assert_eq!(format!("{}t", inner.form()), outer.form());
        assert_eq!(inner.rule_name(), "-aba");
        let crate::GenSource::Stem(stem) = &inner.sources()[0] else {
            panic!("expected a stem source");
        };
        assert_eq!(format!("{}aba", stem.form()), inner.form());
    }

    #[test]
    fn unknown_and_blank_forms_resolve_to_nothing() {
        let lemmatizer = toy_with_rules(vec![suffix_rule("o", 0)]);
        assert!(lemmatizer.lookup("xyz").unwrap().is_empty());
        assert!(lemmatizer.lookup("").unwrap().is_empty());
        assert!(lemmatizer.lookup("   ").unwrap().is_empty());
    }

    #[test]
    fn higher_level_tried_only_when_lower_levels_fail() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let rare = rule! {
            name: "-issime (rare)",
            level: 1,
            metadata: (),
            propose: move |step: &StepView<'_, Toy>| {
                seen.fetch_add(1, Ordering::SeqCst);
                let base = step.form().strip_suffix("issime")?;
                Some(vec![vec![Segment::new(base)]])
            },
            verify: |_: &Generation<Toy>| true,
        };
        let lemmatizer = toy_with_rules(vec![suffix_rule("o", 0), rare]);

        // Level 0 resolves this, so the level-1 rule is never consulted.
        let (results, metrics) = lemmatizer.lookup_with_metrics("amo").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(metrics.levels.len(), 1);
        assert_eq!(metrics.levels[0].level, 0);

        // Level 0 has nothing for this, so level 1 kicks in.
        let (results, metrics) = lemmatizer.lookup_with_metrics("amissime").unwrap();
        assert_eq!(results.len(), 1);
        assert!(calls.load(Ordering::SeqCst) > 0);
        assert_eq!(metrics.levels.len(), 2);
    }

    #[test]
    fn forward_verification_prunes_speculative_reductions() {
        let strict = rule! {
            name: "-o (verbs only)",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                let base = step.form().strip_suffix("o")?;
                Some(vec![vec![Segment::new(base)]])
            },
            verify: |generation: &Generation<Toy>| {
                generation.sources().iter().all(|source| match source {
                    crate::GenSource::Stem(stem) => stem.metadata().contains("verb"),
                    crate::GenSource::Derived(_) => true,
                })
            },
        };
        let mut lemmatizer = Lemmatizer::<Toy>::new();
        let word = lemmatizer.add_word("frame");
        lemmatizer.add_stem(word, "tabul", "noun stem").unwrap();
        lemmatizer.add_rule(strict).unwrap();
        lemmatizer.finish_rule_setup().unwrap();

        // The reduction grounds (tabul is a stem) but verification rejects it.
        assert!(lemmatizer.lookup("tabulo").unwrap().is_empty());
    }

    #[test]
    fn annotate_runs_before_verify_and_survives_to_result() {
        let annotated = rule! {
            name: "-s",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                let base = step.form().strip_suffix("s")?;
                Some(vec![vec![Segment::new(base)]])
            },
            verify: |generation: &Generation<Toy>| generation.metadata().is_some(),
            annotate: |generation: &Generation<Toy>| Some(format!("plural of {}", generation.form())),
        };
        let lemmatizer = toy_with_rules(vec![annotated]);
        let results = lemmatizer.lookup("ams").unwrap();
        assert_eq!(results.len(), 1);
        let Resolution::Derived(generation) = &results[0] else {
            panic!("expected a derivation");
        };
        assert_eq!(generation.metadata().map(String::as_str), Some("plural of ams"));
    }

    #[test]
    fn multi_segment_rule_grounds_each_segment() {
        let clitic = rule! {
            name: "clitic -que",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                let base = step.form().strip_suffix("que")?;
                if base.is_empty() {
                    return None;
                }
                Some(vec![vec![
                    Segment::new(base),
                    Segment::new("que").origins(SegmentOrigins::STEM),
                ]])
            },
            verify: |_: &Generation<Toy>| true,
        };
        let mut lemmatizer = Lemmatizer::<Toy>::new();
        let love = lemmatizer.add_word("to love");
        lemmatizer.add_stem(love, "am", "verb stem").unwrap();
        let and = lemmatizer.add_word("and");
        lemmatizer.add_stem(and, "que", "clitic").unwrap();
        lemmatizer.add_rule(clitic).unwrap();
        lemmatizer.add_rule(suffix_rule("o", 0)).unwrap();
        lemmatizer.finish_rule_setup().unwrap();

        let results = lemmatizer.lookup("amoque").unwrap();
        assert_eq!(results.len(), 1);
        let Resolution::Derived(generation) = &results[0] else {
            panic!("expected a derivation");
        };
        assert_eq!(generation.sources().len(), 2);
        assert!(matches!(&generation.sources()[1], crate::GenSource::Stem(stem) if stem.form() == "que"));
    }

    #[test]
    fn stem_constraints_filter_direct_matches() {
        let picky = rule! {
            name: "-o (noun base)",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                let base = step.form().strip_suffix("o")?;
                Some(vec![vec![Segment::new(base).stem_constraint(StemConstraint::new(
                    Arc::new(|stem: &Stem<Toy>| stem.metadata().contains("noun")),
                ))]])
            },
            verify: |_: &Generation<Toy>| true,
        };
        // "am" is a verb stem, so the constrained segment finds no stems.
        let lemmatizer = toy_with_rules(vec![picky]);
        assert!(lemmatizer.lookup("amo").unwrap().is_empty());
    }

    #[test]
    fn rule_constraints_apply_to_all_deeper_reductions() {
        let blocked = rule! {
            name: "-t (not under -que)",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                let base = step.form().strip_suffix("t")?;
                Some(vec![vec![Segment::new(base)]])
            },
            verify: |_: &Generation<Toy>| true,
        };
        let gate = rule! {
            name: "-x gate",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                let base = step.form().strip_suffix("x")?;
                Some(vec![vec![Segment::new(base).rule_constraint(RuleConstraint::Where(
                    Arc::new(|rule: &Rule<Toy>, _: bool| !rule.name.starts_with("-t")),
                ))]])
            },
            verify: |_: &Generation<Toy>| true,
        };
        let lemmatizer = toy_with_rules(vec![blocked, gate]);
        // amt resolves on its own ...
        assert_eq!(lemmatizer.lookup("amt").unwrap().len(), 1);
        // ... but not below the gate, whose constraint excludes "-t".
        assert!(lemmatizer.lookup("amtx").unwrap().is_empty());
    }

    #[test]
    fn general_results_constraints_filter_everything() {
        let mut lemmatizer = Lemmatizer::<Toy>::new();
        let word = lemmatizer.add_word("to love");
        lemmatizer.add_stem(word, "am", "verb stem").unwrap();
        lemmatizer.add_rule(suffix_rule("o", 0)).unwrap();
        lemmatizer.add_general_results_constraint(Arc::new(|result: &Resolution<Toy>| {
            !matches!(result, Resolution::Stem(_))
        }));
        lemmatizer.finish_rule_setup().unwrap();

        // The bare stem is filtered out; the derivation is not.
        assert!(lemmatizer.lookup("am").unwrap().is_empty());
        assert_eq!(lemmatizer.lookup("amo").unwrap().len(), 1);
    }

    #[test]
    fn stem_generation_constraints_veto_forward_pass() {
        let mut lemmatizer = Lemmatizer::<Toy>::new();
        let word = lemmatizer.add_word("to love");
        let stem = lemmatizer.add_stem(word, "am", "verb stem").unwrap();
        stem.add_generation_constraint(Arc::new(|generation: &Generation<Toy>| {
            generation.form() != "amo"
        }));
        lemmatizer.add_rule(suffix_rule("o", 0)).unwrap();
        lemmatizer.add_rule(suffix_rule("at", 0)).unwrap();
        lemmatizer.finish_rule_setup().unwrap();

        assert!(lemmatizer.lookup("amo").unwrap().is_empty());
        assert_eq!(lemmatizer.lookup("amat").unwrap().len(), 1);
    }

    #[test]
    fn normalization_applies_to_input_and_stems() {
        let mut lemmatizer = Lemmatizer::<Toy>::new();
        lemmatizer.add_string_normalizer(|form| form.to_lowercase());
        let word = lemmatizer.add_word("to love");
        lemmatizer.add_stem(word, "AM", "verb stem").unwrap();
        lemmatizer.add_rule(suffix_rule("o", 0)).unwrap();
        lemmatizer.finish_rule_setup().unwrap();

        assert_eq!(lemmatizer.lookup("AMO").unwrap().len(), 1);
        assert_eq!(lemmatizer.lookup("amo").unwrap().len(), 1);
    }

    #[test]
    fn cyclical_rule_is_reported() {
        let cyclical = rule! {
            name: "identity",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| Some(vec![vec![Segment::new(step.form())]]),
            verify: |_: &Generation<Toy>| true,
        };
        let lemmatizer = toy_with_rules(vec![cyclical]);
        assert!(matches!(
            lemmatizer.lookup("amo"),
            Err(Error::CyclicRule { rule, .. }) if rule == "identity"
        ));
    }

    #[test]
    fn search_budget_exhaustion_is_graceful() {
        // Grows the form on every reduction, so the search never terminates
        // on its own; the budget has to stop it.
        let runaway = rule! {
            name: "runaway",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                Some(vec![vec![Segment::new(format!("{}a", step.form()))]])
            },
            verify: |_: &Generation<Toy>| true,
        };
        let mut lemmatizer = toy_with_rules(vec![runaway]);
        lemmatizer.set_search_budget(50);
        assert!(lemmatizer.lookup("amo").unwrap().is_empty());
    }

    #[test]
    fn budget_is_shared_across_levels() {
        // The runaway rule burns the whole budget at level 0; the level-1
        // attempt starts with nothing left instead of a fresh allowance.
        let runaway = rule! {
            name: "runaway",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                Some(vec![vec![Segment::new(format!("{}a", step.form()))]])
            },
            verify: |_: &Generation<Toy>| true,
        };
        let mut lemmatizer = toy_with_rules(vec![runaway, suffix_rule("o", 1)]);
        lemmatizer.set_search_budget(50);

        let (results, metrics) = lemmatizer.lookup_with_metrics("amo").unwrap();
        assert!(results.is_empty());
        assert_eq!(metrics.levels.len(), 2);
        assert_eq!(metrics.levels[0].budget_spent, 50);
        assert_eq!(metrics.levels[1].budget_spent, 0);
    }

    #[test]
    fn restricted_sets_with_stale_rule_ids_are_ignored() {
        let first_person = rule! {
            name: "-o",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                let base = step.form().strip_suffix("o")?;
                Some(vec![vec![Segment::new(base).stem_constraint(StemConstraint::with_candidates(
                    Arc::new(|_: &Stem<Toy>| true),
                    vec!["present stem"],
                ))]])
            },
            verify: |_: &Generation<Toy>| true,
        };
        let mut lemmatizer = Lemmatizer::<Toy>::new();
        let word = lemmatizer.add_word("to love");
        let rule_id = lemmatizer.add_rule(first_person).unwrap();
        lemmatizer.finish_rule_setup().unwrap();

        // The restricted set carries an id no rule has; it is skipped, the
        // live id still searches.
        let results = lemmatizer
            .find_stem_candidates_from_principal_part(PrincipalPartQuery {
                word,
                form: "amo".into(),
                rule_constraint: RuleConstraint::Allowed(Arc::new(HashSet::from([rule_id, 999]))),
                direct_stem_constraint: StemConstraint::new(Arc::new(|_: &Stem<Toy>| true)),
                parsed_form_check: Arc::new(|result: &Resolution<Toy>| {
                    matches!(result, Resolution::Derived(_))
                }),
            })
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn setup_order_is_enforced() {
        let mut lemmatizer = Lemmatizer::<Toy>::new();
        assert!(matches!(lemmatizer.lookup("amo"), Err(Error::SetupNotFinished)));
        lemmatizer.finish_rule_setup().unwrap();
        assert!(matches!(lemmatizer.finish_rule_setup(), Err(Error::SetupFinished)));
        assert!(matches!(lemmatizer.add_rule(suffix_rule("o", 0)), Err(Error::RulesFrozen)));
    }

    #[test]
    fn adopting_a_foreign_stem_is_rejected() {
        let mut lemmatizer = Lemmatizer::<Toy>::new();
        let love = lemmatizer.add_word("to love");
        let carry = lemmatizer.add_word("to carry");
        let stem = lemmatizer.add_stem(love, "am", "verb stem").unwrap();
        assert!(matches!(
            lemmatizer.adopt_stem(carry, stem),
            Err(Error::ForeignStem { form }) if form == "am"
        ));
        assert!(matches!(lemmatizer.adopt_stem(99, Stem::new("x".into(), 99, "")), Err(Error::UnknownWord(99))));
    }

    #[test]
    fn principal_part_search_synthesizes_candidate_stems() {
        // "amo" is known to be the first principal part of some word; the
        // only first-person rule strips "-o". The search should propose the
        // hypothetical stem "am" without it being in the dictionary.
        let first_person = rule! {
            name: "-o",
            level: 0,
            metadata: (),
            propose: |step: &StepView<'_, Toy>| {
                let base = step.form().strip_suffix("o")?;
                Some(vec![vec![Segment::new(base).stem_constraint(StemConstraint::with_candidates(
                    Arc::new(|_: &Stem<Toy>| true),
                    vec!["present stem"],
                ))]])
            },
            verify: |_: &Generation<Toy>| true,
        };
        let mut lemmatizer = Lemmatizer::<Toy>::new();
        let word = lemmatizer.add_word("to love");
        let rule_id = lemmatizer.add_rule(first_person).unwrap();
        lemmatizer.finish_rule_setup().unwrap();

        let results = lemmatizer
            .find_stem_candidates_from_principal_part(PrincipalPartQuery {
                word,
                form: "amo".into(),
                rule_constraint: RuleConstraint::Allowed(Arc::new(HashSet::from([rule_id]))),
                direct_stem_constraint: StemConstraint::new(Arc::new(|_: &Stem<Toy>| true)),
                parsed_form_check: Arc::new(|result: &Resolution<Toy>| {
                    matches!(result, Resolution::Derived(_))
                }),
            })
            .unwrap();

        assert_eq!(results.len(), 1);
        let Resolution::Derived(generation) = &results[0] else {
            panic!("expected a derivation");
        };
        let crate::GenSource::Stem(stem) = &generation.sources()[0] else {
            panic!("expected a stem source");
        };
        assert_eq!(stem.form(), "am");
        assert_eq!(stem.word(), word);
        assert_eq!(*stem.metadata(), "present stem");

        // Adopting the accepted hypothesis makes it a real dictionary stem.
        lemmatizer.adopt_stem(word, stem.clone()).unwrap();
        assert_eq!(lemmatizer.find_stems("am", &[]).len(), 1);
    }

    #[test]
    fn concurrent_lookups_share_one_lemmatizer() {
        let lemmatizer = Arc::new(toy_with_rules(vec![suffix_rule("o", 0)]));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lemmatizer = lemmatizer.clone();
                std::thread::spawn(move || lemmatizer.lookup("amo").unwrap().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
