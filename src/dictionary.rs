//! Dictionary storage: headwords and their stems.
//!
//! Headwords are addressed by dense [`WordId`]s; stems are reference-counted
//! so derivation trees handed back from a lookup stay valid without borrowing
//! the lemmatizer.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::{Generation, GenerationCheck, Morphology};

/// Headword identifier (index into the lemmatizer's headword vector).
pub type WordId = usize;

/// A dictionary entry: consumer metadata plus the stems registered under it.
pub struct Headword<M: Morphology> {
    metadata: M::WordMeta,
    stems: Vec<Arc<Stem<M>>>,
}

impl<M: Morphology> Headword<M> {
    pub(crate) fn new(metadata: M::WordMeta) -> Self {
        Headword { metadata, stems: Vec::new() }
    }

    pub(crate) fn push_stem(&mut self, stem: Arc<Stem<M>>) {
        self.stems.push(stem);
    }

    pub fn metadata(&self) -> &M::WordMeta {
        &self.metadata
    }

    pub fn stems(&self) -> &[Arc<Stem<M>>] {
        &self.stems
    }
}

/// A literal stem form belonging to one headword.
///
/// The generation-constraint list is behind a lock because constraints are
/// registered through the shared handle after the stem has been indexed
/// (principal-part reconciliation does this from search results).
pub struct Stem<M: Morphology> {
    form: String,
    word: WordId,
    metadata: M::StemMeta,
    generation_constraints: RwLock<Vec<GenerationCheck<M>>>,
}

impl<M: Morphology> Stem<M> {
    pub(crate) fn new(form: String, word: WordId, metadata: M::StemMeta) -> Arc<Self> {
        Arc::new(Stem {
            form,
            word,
            metadata,
            generation_constraints: RwLock::new(Vec::new()),
        })
    }

    pub fn form(&self) -> &str {
        &self.form
    }

    pub fn word(&self) -> WordId {
        self.word
    }

    pub fn metadata(&self) -> &M::StemMeta {
        &self.metadata
    }

    /// Requires every future derivation built directly on this stem to pass
    /// `check`. Takes effect for subsequent lookups only.
    pub fn add_generation_constraint(&self, check: GenerationCheck<M>) {
        self.generation_constraints.write().push(check);
    }

    /// Forward check: may `generation` be built directly on this stem?
    pub(crate) fn verify_forward(&self, generation: &Generation<M>) -> bool {
        self.generation_constraints.read().iter().all(|check| check(generation))
    }
}

impl<M: Morphology> std::fmt::Debug for Stem<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stem")
            .field("form", &self.form)
            .field("word", &self.word)
            .finish()
    }
}
