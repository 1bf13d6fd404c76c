//! Error types for the engine.
//!
//! Only unrecoverable misuse is an error: setup-order violations, dictionary
//! ownership violations, and rule-definition defects. Search exhaustion and
//! empty lookups are normal `Ok` outcomes.

use thiserror::Error;

use crate::WordId;

/// The error type for all fallible engine operations.
#[derive(Error, Debug)]
pub enum Error {
    /// `add_rule` was called after `finish_rule_setup`.
    #[error("rules are frozen; add_rule must be called before finish_rule_setup")]
    RulesFrozen,

    /// `finish_rule_setup` was called more than once.
    #[error("rule setup already finished")]
    SetupFinished,

    /// `lookup` (or another search entry point) was called before
    /// `finish_rule_setup`.
    #[error("lookup before finish_rule_setup")]
    SetupNotFinished,

    /// A headword id that was never returned by `add_word`.
    #[error("unknown headword id {0}")]
    UnknownWord(WordId),

    /// Tried to attach a stem to a headword that does not own it.
    #[error("stem \"{form}\" belongs to a different headword")]
    ForeignStem { form: String },

    /// A rule proposed its own input form unchanged with no new constraints.
    /// Such a rule can never make progress and would recurse forever; this is
    /// a rule-table defect, not a runtime condition.
    #[error("likely cyclical rule \"{rule}\": proposed its own input \"{form}\" unchanged")]
    CyclicRule { rule: String, form: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
