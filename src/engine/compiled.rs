//! Rule compilation and indexing.
//!
//! The static side of the engine: structures derived once from the full rule
//! list, when the lemmatizer's rule setup is frozen, that make every later
//! lookup cheaper.
//!
//! Two indexes are built:
//!
//! - **Level buckets**: for each level `l`, the ids of every rule with
//!   `level <= l`. A lookup tries bucket 0 first and widens only while lower
//!   levels yield nothing, so rare rules (syncopation, archaisms) never slow
//!   down or pollute the common case.
//! - **Allowed predecessors**: for each rule carrying a `predecessor_filter`,
//!   the precomputed set of rule ids that pass it. The filter runs O(rules²)
//!   once here instead of on every reduction step.
//!
//! ## Invariants
//!
//! - `RuleId` is an index into the lemmatizer's rule vector; `levels` and
//!   `allowed_predecessors` are aligned with it.
//! - Buckets are cumulative and materialized for every level `0..=max`, even
//!   when a level has no rules of its own.

use std::collections::HashSet;
use std::sync::Arc;

use crate::{Morphology, Rule, RuleId};

/// Pre-compiled rule indexes. Built once by `finish_rule_setup`.
#[derive(Debug)]
pub(crate) struct CompiledRules {
    levels: Vec<Vec<RuleId>>,
    allowed_predecessors: Vec<Option<Arc<HashSet<RuleId>>>>,
}

impl CompiledRules {
    pub(crate) fn new<M: Morphology>(rules: &[Rule<M>]) -> Self {
        let max_level = rules.iter().map(|r| r.level).max().unwrap_or(0);

        let mut levels: Vec<Vec<RuleId>> = Vec::with_capacity(max_level + 1);
        for level in 0..=max_level {
            levels.push(
                rules
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.level <= level)
                    .map(|(id, _)| id)
                    .collect(),
            );
        }

        let allowed_predecessors = rules
            .iter()
            .map(|rule| {
                let filter = rule.predecessor_filter.as_ref()?;
                let allowed: HashSet<RuleId> = rules
                    .iter()
                    .enumerate()
                    .filter(|(_, candidate)| filter(candidate))
                    .map(|(id, _)| id)
                    .collect();
                if allowed.is_empty() && rule.expects_predecessors {
                    log::warn!(
                        "rule \"{}\" expects predecessors, but no registered rule qualifies",
                        rule.name
                    );
                }
                Some(Arc::new(allowed))
            })
            .collect();

        CompiledRules { levels, allowed_predecessors }
    }

    /// Number of materialized level buckets (`max rule level + 1`).
    pub(crate) fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Ids of every rule with `level <= level`.
    pub(crate) fn level_bucket(&self, level: usize) -> &[RuleId] {
        &self.levels[level]
    }

    /// Precomputed predecessor set for `rule`, if it declared a filter.
    pub(crate) fn allowed_predecessors(&self, rule: RuleId) -> Option<&Arc<HashSet<RuleId>>> {
        self.allowed_predecessors[rule].as_ref()
    }
}
