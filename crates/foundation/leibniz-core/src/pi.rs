//! Accumulated approximation of pi.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Term, TermIndex};

/// The singleton accumulator record.
///
/// `sum` is the sum of the values of every index in `contributors`, each
/// added exactly once in the order it was committed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PiState {
    pub sum: f64,
    pub contributors: BTreeSet<TermIndex>,
}

impl PiState {
    pub fn contains(&self, index: TermIndex) -> bool {
        self.contributors.contains(&index)
    }

    /// Fold a term into the sum. Returns `false` if the index was already
    /// a contributor, leaving the state untouched.
    pub fn add(&mut self, term: Term) -> bool {
        if !self.contributors.insert(term.index) {
            return false;
        }
        self.sum += term.value;
        true
    }

    pub fn report(&self) -> PiReport {
        PiReport::from(self)
    }
}

/// What `GET /pi` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiReport {
    pub pi: f64,
    pub terms_indexes: Vec<TermIndex>,
}

impl From<&PiState> for PiReport {
    fn from(state: &PiState) -> Self {
        Self {
            pi: state.sum,
            terms_indexes: state.contributors.iter().copied().collect(),
        }
    }
}
