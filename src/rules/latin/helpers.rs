//! Table-loading helpers.

use std::sync::Arc;

use crate::{
    Generation, Lemmatizer, Result, Rule, RuleConstraint, Segment, Stem, StemConstraint, StepView,
};

use super::{Latin, Number, Parsing, Person, RuleInfo, StemInfo};

/// Person/number slots in the order conjugation tables list their endings.
pub(super) const PERSON_NUMBER: [(Person, Number); 6] = [
    (Person::First, Number::Singular),
    (Person::Second, Number::Singular),
    (Person::Third, Number::Singular),
    (Person::First, Number::Plural),
    (Person::Second, Number::Plural),
    (Person::Third, Number::Plural),
];

/// Registers the reversible rule "a stem parsed as `in_parsing`, plus
/// `suffix`, is a form parsed as `out_parsing`".
///
/// The proposed base form carries two constraints:
/// - a rule constraint on everything deeper: never this rule again, and any
///   rule applied *immediately* below must output this rule's input parsing;
/// - a stem constraint: a terminating stem must carry the input parsing. The
///   same parsing doubles as the candidate metadata for principal-part
///   reconciliation.
///
/// The predecessor filter mirrors the immediate case and is precomputed into
/// a set at `finish_rule_setup`.
pub(super) fn add_simple_suffix_rule(
    lemmatizer: &mut Lemmatizer<Latin>,
    in_parsing: Parsing,
    suffix: &'static str,
    out_parsing: Parsing,
) -> Result<()> {
    let in_key = in_parsing.key();
    let out_key = out_parsing.key();
    let name = format!("{in_key} -> (+{suffix}) -> {out_key}");
    let out_info = StemInfo::from(out_parsing);

    let rule_constraint = {
        let name = name.clone();
        let in_key = in_key.clone();
        RuleConstraint::Where(Arc::new(move |rule: &Rule<Latin>, immediately_deeper: bool| {
            rule.name != name && (!immediately_deeper || rule.metadata.out_key == in_key)
        }))
    };
    let stem_constraint = {
        let in_key = in_key.clone();
        StemConstraint::with_candidates(
            Arc::new(move |stem: &Stem<Latin>| stem.metadata().key == in_key),
            vec![StemInfo::from(in_parsing)],
        )
    };

    let predecessor_key = in_key.clone();
    let rule = rule! {
        name: name,
        level: 0,
        metadata: RuleInfo { in_key, out_key, out_parsing: Some(out_parsing) },
        propose: move |step: &StepView<'_, Latin>| {
            let base = step.form().strip_suffix(suffix)?;
            Some(vec![vec![
                Segment::new(base)
                    .rule_constraint(rule_constraint.clone())
                    .stem_constraint(stem_constraint.clone()),
            ]])
        },
        verify: |_: &Generation<Latin>| true,
        annotate: move |_: &Generation<Latin>| Some(out_info.clone()),
        predecessors: move |rule: &Rule<Latin>| rule.metadata.out_key == predecessor_key,
    };
    lemmatizer.add_rule(rule)?;
    Ok(())
}
