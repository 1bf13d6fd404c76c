//! Latin morphology: parsing model, metadata types, and the demo rule table.
//!
//! Grammatical category naming follows William Whitaker's Words. The table
//! covers a deliberately small slice of the regular system: first-declension
//! nouns, the first-conjugation present system, perfect endings, enclitics,
//! and syncopation. Small as it is, it exercises every engine feature end
//! to end.

mod helpers;
mod rules;

pub use rules::latin_lemmatizer;

use crate::Morphology;

/// Marker type binding the Latin metadata bundle to the engine.
pub struct Latin;

impl Morphology for Latin {
    type WordMeta = WordInfo;
    type StemMeta = StemInfo;
    type RuleMeta = RuleInfo;
    type GenMeta = StemInfo;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordType {
    Noun,
    Verb,
    Adjective,
    Infinitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Masculine,
    Feminine,
    /// Masculine or feminine, undistinguished (dictionary convention).
    MascFem,
    Neuter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declension {
    First,
    Second,
    Third,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjugation {
    First,
    Second,
    Third,
    Fourth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Indicative,
    Subjunctive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    Active,
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tense {
    Present,
    Imperfect,
    Future,
    Perfect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Nominative,
    Genitive,
    Dative,
    Accusative,
    Ablative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    Singular,
    Plural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Person {
    First,
    Second,
    Third,
}

/// A (possibly partial) grammatical parsing: what a stem is, or what an
/// inflected form means. Unset fields are unconstrained/inapplicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Parsing {
    pub word_type: Option<WordType>,
    pub gender: Option<Gender>,
    pub declension: Option<Declension>,
    pub conjugation: Option<Conjugation>,
    pub mood: Option<Mood>,
    pub voice: Option<Voice>,
    pub tense: Option<Tense>,
    pub case: Option<Case>,
    pub number: Option<Number>,
    pub person: Option<Person>,
    pub is_stem: bool,
}

impl Parsing {
    /// Canonical short description, e.g. `v. 1st conj. pres. act. ind. 1st
    /// sg.`. Rule predicates compare these strings, so the rendering must be
    /// a function of the parsing alone.
    pub fn key(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(word_type) = self.word_type {
            parts.push(match word_type {
                WordType::Noun => "n.",
                WordType::Verb => "v.",
                WordType::Adjective => "adj.",
                WordType::Infinitive => "inf.",
            });
        }
        if let Some(declension) = self.declension {
            parts.push(match declension {
                Declension::First => "1st decl.",
                Declension::Second => "2nd decl.",
                Declension::Third => "3rd decl.",
            });
        }
        if let Some(conjugation) = self.conjugation {
            parts.push(match conjugation {
                Conjugation::First => "1st conj.",
                Conjugation::Second => "2nd conj.",
                Conjugation::Third => "3rd conj.",
                Conjugation::Fourth => "4th conj.",
            });
        }
        if let Some(gender) = self.gender {
            parts.push(match gender {
                Gender::Masculine => "m.",
                Gender::Feminine => "f.",
                Gender::MascFem => "m/f.",
                Gender::Neuter => "neut.",
            });
        }
        if let Some(tense) = self.tense {
            parts.push(match tense {
                Tense::Present => "pres.",
                Tense::Imperfect => "impf.",
                Tense::Future => "fut.",
                Tense::Perfect => "perf.",
            });
        }
        if let Some(voice) = self.voice {
            parts.push(match voice {
                Voice::Active => "act.",
                Voice::Passive => "pass.",
            });
        }
        if let Some(mood) = self.mood {
            parts.push(match mood {
                Mood::Indicative => "ind.",
                Mood::Subjunctive => "subj.",
            });
        }
        if let Some(person) = self.person {
            parts.push(match person {
                Person::First => "1st",
                Person::Second => "2nd",
                Person::Third => "3rd",
            });
        }
        if let Some(number) = self.number {
            parts.push(match number {
                Number::Singular => "sg.",
                Number::Plural => "pl.",
            });
        }
        if let Some(case) = self.case {
            parts.push(match case {
                Case::Nominative => "nom.",
                Case::Genitive => "gen.",
                Case::Dative => "dat.",
                Case::Accusative => "acc.",
                Case::Ablative => "abl.",
            });
        }
        if self.is_stem {
            parts.push("stem");
        }
        parts.join(" ")
    }
}

impl std::fmt::Display for Parsing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// Stem and derivation metadata: the parsing plus its cached key.
#[derive(Debug, Clone)]
pub struct StemInfo {
    pub parsing: Parsing,
    pub key: String,
}

impl From<Parsing> for StemInfo {
    fn from(parsing: Parsing) -> Self {
        StemInfo { key: parsing.key(), parsing }
    }
}

/// Rule metadata: the parsing transition the rule implements, as keys (for
/// cheap predicate comparison) and, when meaningful, the full output parsing.
/// `<any>` marks a slot the rule does not constrain.
#[derive(Debug, Clone)]
pub struct RuleInfo {
    pub in_key: String,
    pub out_key: String,
    pub out_parsing: Option<Parsing>,
}

/// Headword metadata, not consulted by the engine.
#[derive(Debug, Clone)]
pub struct WordInfo {
    pub lemma: String,
    pub gloss: String,
}
