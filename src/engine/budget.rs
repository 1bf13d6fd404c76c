//! Per-lookup search budget.
//!
//! Rule tables are open-ended compositions; a pathological table (or a
//! pathological input) can make the backward search explode combinatorially.
//! Every lookup carries its own budget, spent once per reduction attempt.
//! Exhaustion is not an error: the search returns whatever it has grounded so
//! far, which keeps a bad corner of the rule table from taking the whole
//! lookup down with it.

/// Default number of reduction attempts per lookup.
pub(crate) const DEFAULT_SEARCH_BUDGET: usize = 10_000;

#[derive(Debug)]
pub(crate) struct SearchBudget {
    remaining: usize,
    spent: usize,
    warned: bool,
}

impl SearchBudget {
    pub(crate) fn new(limit: usize) -> Self {
        SearchBudget { remaining: limit, spent: 0, warned: false }
    }

    /// Spends one unit. Returns `false` once the budget is exhausted; the
    /// first refusal is logged.
    pub(crate) fn spend(&mut self) -> bool {
        if self.remaining == 0 {
            if !self.warned {
                log::warn!("search budget exhausted after {} reduction attempts", self.spent);
                self.warned = true;
            }
            return false;
        }
        self.remaining -= 1;
        self.spent += 1;
        true
    }

    /// Units consumed so far.
    pub(crate) fn spent(&self) -> usize {
        self.spent
    }
}
