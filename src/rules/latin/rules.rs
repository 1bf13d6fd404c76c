//! The demo Latin table: normalizer, declension/conjugation rules,
//! enclitics, syncopation, and a small test dictionary.

use std::sync::Arc;

use crate::{
    GenSource, Generation, Lemmatizer, Resolution, Result, Rule, Segment, Stem, StemConstraint,
    StepView,
};

use super::helpers::{PERSON_NUMBER, add_simple_suffix_rule};
use super::{
    Case, Conjugation, Declension, Gender, Latin, Mood, Number, Parsing, RuleInfo, StemInfo, Tense,
    Voice, WordInfo, WordType,
};

/// Case/number slots in the order declension tables list their endings.
const CASE_NUMBER: [(Case, Number); 10] = [
    (Case::Nominative, Number::Singular),
    (Case::Genitive, Number::Singular),
    (Case::Dative, Number::Singular),
    (Case::Accusative, Number::Singular),
    (Case::Ablative, Number::Singular),
    (Case::Nominative, Number::Plural),
    (Case::Genitive, Number::Plural),
    (Case::Dative, Number::Plural),
    (Case::Accusative, Number::Plural),
    (Case::Ablative, Number::Plural),
];

const FIRST_DECLENSION: [&str; 10] = ["a", "ae", "ae", "am", "a", "ae", "arum", "is", "as", "is"];

/// First conjugation, active indicative, by tense.
const PRESENT_ACTIVE: [&str; 6] = ["o", "as", "at", "amus", "atis", "ant"];
const IMPERFECT_ACTIVE: [&str; 6] = ["abam", "abas", "abat", "abamus", "abatis", "abant"];
const FUTURE_ACTIVE: [&str; 6] = ["abo", "abis", "abit", "abimus", "abitis", "abunt"];

/// Perfect-system endings, shared by all conjugations.
const PERFECT_ENDINGS: [&str; 6] = ["i", "isti", "it", "imus", "istis", "erunt"];

/// Builds the demo lemmatizer: normalizer, rule table, general result
/// constraint, and test dictionary, with rule setup finished.
pub fn latin_lemmatizer() -> Result<Lemmatizer<Latin>> {
    let mut lemmatizer = Lemmatizer::new();

    // Orthographic normalization, applied to input and stems alike:
    // lowercase, fold macrons, u for v, i for j.
    lemmatizer.add_string_normalizer(|form: &str| {
        form.chars()
            .flat_map(char::to_lowercase)
            .map(|c| match c {
                '\u{0101}' => 'a', // ā
                '\u{0113}' => 'e', // ē
                '\u{012b}' => 'i', // ī
                '\u{014d}' => 'o', // ō
                '\u{016b}' => 'u', // ū
                '\u{0233}' => 'y', // ȳ
                'v' => 'u',
                'j' => 'i',
                other => other,
            })
            .collect()
    });

    // A bare stem is not a Latin word.
    lemmatizer.add_general_results_constraint(Arc::new(|result: &Resolution<Latin>| {
        let parsing = match result {
            Resolution::Stem(stem) => Some(stem.metadata().parsing),
            Resolution::Derived(generation) => generation.metadata().map(|info| info.parsing),
        };
        !parsing.is_some_and(|parsing| parsing.is_stem)
    }));

    add_regulars(&mut lemmatizer)?;
    add_enclitics(&mut lemmatizer)?;
    add_syncopation(&mut lemmatizer)?;
    add_test_dictionary(&mut lemmatizer)?;

    lemmatizer.finish_rule_setup()?;
    Ok(lemmatizer)
}

fn noun_stem_1st() -> Parsing {
    Parsing {
        word_type: Some(WordType::Noun),
        declension: Some(Declension::First),
        gender: Some(Gender::MascFem),
        is_stem: true,
        ..Parsing::default()
    }
}

fn verb_stem_1st(tense: Tense) -> Parsing {
    Parsing {
        word_type: Some(WordType::Verb),
        conjugation: Some(Conjugation::First),
        tense: Some(tense),
        is_stem: true,
        ..Parsing::default()
    }
}

fn add_regulars(lemmatizer: &mut Lemmatizer<Latin>) -> Result<()> {
    // ----- nouns: first declension ------------------------------------------
    for ((case, number), suffix) in CASE_NUMBER.into_iter().zip(FIRST_DECLENSION) {
        add_simple_suffix_rule(
            lemmatizer,
            noun_stem_1st(),
            suffix,
            Parsing {
                case: Some(case),
                number: Some(number),
                is_stem: false,
                ..noun_stem_1st()
            },
        )?;
    }

    // ----- verbs: first conjugation, present system, active indicative ------
    let present_system: [(Tense, [&'static str; 6]); 3] = [
        (Tense::Present, PRESENT_ACTIVE),
        (Tense::Imperfect, IMPERFECT_ACTIVE),
        (Tense::Future, FUTURE_ACTIVE),
    ];
    for (tense, suffixes) in present_system {
        for ((person, number), suffix) in PERSON_NUMBER.into_iter().zip(suffixes) {
            add_simple_suffix_rule(
                lemmatizer,
                verb_stem_1st(Tense::Present),
                suffix,
                Parsing {
                    tense: Some(tense),
                    mood: Some(Mood::Indicative),
                    voice: Some(Voice::Active),
                    person: Some(person),
                    number: Some(number),
                    is_stem: false,
                    ..verb_stem_1st(Tense::Present)
                },
            )?;
        }
    }

    // ----- verbs: perfect endings -------------------------------------------
    for ((person, number), suffix) in PERSON_NUMBER.into_iter().zip(PERFECT_ENDINGS) {
        add_simple_suffix_rule(
            lemmatizer,
            verb_stem_1st(Tense::Perfect),
            suffix,
            Parsing {
                tense: Some(Tense::Perfect),
                mood: Some(Mood::Indicative),
                voice: Some(Voice::Active),
                person: Some(person),
                number: Some(number),
                is_stem: false,
                ..verb_stem_1st(Tense::Perfect)
            },
        )?;
    }

    Ok(())
}

/// Enclitics attach to a fully inflected word, so the base form is analyzed
/// with no extra constraints; the predecessor filter keeps stem-producing
/// rules out from directly underneath.
fn add_enclitics(lemmatizer: &mut Lemmatizer<Latin>) -> Result<()> {
    for (suffix, name) in [("ne", "-ne"), ("que", "-que"), ("ue", "-ue")] {
        let rule = rule! {
            name: name,
            level: 0,
            metadata: RuleInfo {
                in_key: "<any>".into(),
                out_key: "<any>".into(),
                out_parsing: None,
            },
            propose: move |step: &StepView<'_, Latin>| {
                let base = step.form().strip_suffix(suffix)?;
                Some(vec![vec![Segment::new(base)]])
            },
            verify: |_: &Generation<Latin>| true,
            predecessors: |rule: &Rule<Latin>| {
                !rule.metadata.out_parsing.is_some_and(|parsing| parsing.is_stem)
            },
            expects_predecessors: true,
        };
        lemmatizer.add_rule(rule)?;
    }
    Ok(())
}

fn is_perfect_form(parsing: Parsing) -> bool {
    !parsing.is_stem && matches!(parsing.tense, Some(Tense::Perfect))
}

/// Walks the first-source chain of a derivation looking for the perfect stem
/// it is (transitively) built on.
fn perfect_stem_form(generation: &Generation<Latin>) -> Option<String> {
    let is_perfect_stem = |info: &StemInfo| {
        info.parsing.is_stem && matches!(info.parsing.tense, Some(Tense::Perfect))
    };
    if generation.metadata().is_some_and(is_perfect_stem) {
        return Some(generation.form().to_string());
    }
    match generation.sources().first()? {
        GenSource::Stem(stem) => {
            is_perfect_stem(stem.metadata()).then(|| stem.form().to_string())
        }
        GenSource::Derived(inner) => perfect_stem_form(inner),
    }
}

fn add_syncopation(lemmatizer: &mut Lemmatizer<Latin>) -> Result<()> {
    // Perfect syncopation: amasti for amauisti. Backward, re-insert a
    // dropped u/ue/ui after any non-final vowel and see if the restored form
    // analyzes as a perfect; forward, accept only if the derivation really
    // bottoms out on a perfect stem in -u.
    let perfect = rule! {
        name: "perfect syncopation",
        level: 0,
        metadata: RuleInfo {
            in_key: "<perf>".into(),
            out_key: "<syncopated perf>".into(),
            out_parsing: None,
        },
        propose: |step: &StepView<'_, Latin>| {
            let form = step.form();
            let mut proposals = Vec::new();
            for vowel in regex!("[aeiou]").find_iter(form) {
                if vowel.end() == form.len() {
                    continue;
                }
                for restored in ["ui", "ue", "u"] {
                    let replaced =
                        format!("{}{restored}{}", &form[..vowel.end()], &form[vowel.end()..]);
                    proposals.push(vec![Segment::new(replaced).stem_constraint(
                        StemConstraint::new(Arc::new(|stem: &Stem<Latin>| {
                            is_perfect_form(stem.metadata().parsing)
                        })),
                    )]);
                }
            }
            (!proposals.is_empty()).then_some(proposals)
        },
        verify: |generation: &Generation<Latin>| {
            perfect_stem_form(generation).is_some_and(|form| form.ends_with('u'))
        },
        predecessors: |rule: &Rule<Latin>| {
            rule.metadata.out_key == "<general syncopation>"
                || rule.metadata.out_parsing.is_some_and(is_perfect_form)
        },
        expects_predecessors: true,
    };
    lemmatizer.add_rule(perfect)?;

    // General syncopation: portauere for portauerunt, amare for amaris.
    let general = rule! {
        name: "general syncopation",
        level: 0,
        metadata: RuleInfo {
            in_key: "<any>".into(),
            out_key: "<general syncopation>".into(),
            out_parsing: None,
        },
        propose: |step: &StepView<'_, Latin>| {
            let form = step.form();
            let mut proposals = Vec::new();
            for (uncontracted, contracted) in [("ris", "re"), ("erunt", "ere")] {
                if let Some(base) = form.strip_suffix(contracted) {
                    proposals.push(vec![
                        Segment::new(format!("{base}{uncontracted}")).stem_constraint(
                            StemConstraint::new(Arc::new(|stem: &Stem<Latin>| {
                                let parsing = stem.metadata().parsing;
                                !parsing.is_stem && parsing.word_type == Some(WordType::Verb)
                            })),
                        ),
                    ]);
                }
            }
            (!proposals.is_empty()).then_some(proposals)
        },
        verify: |_: &Generation<Latin>| true,
        predecessors: |rule: &Rule<Latin>| {
            rule.metadata.out_parsing.is_some_and(|parsing| {
                !parsing.is_stem && parsing.word_type == Some(WordType::Verb)
            })
        },
        expects_predecessors: true,
    };
    lemmatizer.add_rule(general)?;

    Ok(())
}

fn add_test_dictionary(lemmatizer: &mut Lemmatizer<Latin>) -> Result<()> {
    let verbs: [(&str, &str, &str, &str); 2] = [
        ("amo, amare, amaui, amatus", "to love", "am", "amau"),
        ("porto, portare, portaui, portatus", "to carry", "port", "portau"),
    ];
    for (lemma, gloss, present, perfect) in verbs {
        let word = lemmatizer.add_word(WordInfo { lemma: lemma.into(), gloss: gloss.into() });
        lemmatizer.add_stem(word, present, verb_stem_1st(Tense::Present).into())?;
        lemmatizer.add_stem(word, perfect, verb_stem_1st(Tense::Perfect).into())?;
    }

    let nouns: [(&str, &str, &str); 2] =
        [("puella, puellae", "girl", "puell"), ("aqua, aquae", "water", "aqu")];
    for (lemma, gloss, stem) in nouns {
        let word = lemmatizer.add_word(WordInfo { lemma: lemma.into(), gloss: gloss.into() });
        lemmatizer.add_stem(word, stem, noun_stem_1st().into())?;
    }

    Ok(())
}
