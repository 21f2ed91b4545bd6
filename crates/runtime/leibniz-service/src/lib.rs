//! Term service: memoized get-or-compute for Gregory-Leibniz terms.
//!
//! ```text
//!   get_term_by_index(n)
//!     ├─ acquire "term:n"
//!     ├─ TermStore::get(n) ── hit ──> return
//!     ├─ miss: compute, TermStore::insert
//!     ├─ PiAccumulator::add_term   (acquires "pi")
//!     └─ release "term:n"
//! ```
//!
//! Lock order is always a term key before the pi key, and the pi key is
//! never held while waiting on a term key.

pub mod accumulator;

pub use accumulator::{Accumulation, PiAccumulator};

use std::fmt;
use std::sync::Arc;

use leibniz_core::{validate_index, Error, PiReport, Result, Term, TermIndex};
use leibniz_lock::{term_key, KeyedLocks};
use leibniz_store::{MemoryPiStore, MemoryTermStore, PiStore, TermStore};

#[derive(Clone)]
pub struct TermService {
    terms: Arc<dyn TermStore>,
    accumulator: PiAccumulator,
    locks: Arc<KeyedLocks>,
}

impl TermService {
    pub fn new(terms: Arc<dyn TermStore>, pi: Arc<dyn PiStore>) -> Self {
        let locks = Arc::new(KeyedLocks::new());
        Self {
            terms,
            accumulator: PiAccumulator::new(pi, Arc::clone(&locks)),
            locks,
        }
    }

    /// Service backed by fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryTermStore::new()),
            Arc::new(MemoryPiStore::new()),
        )
    }

    pub fn accumulator(&self) -> &PiAccumulator {
        &self.accumulator
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Return the term at `index`, computing and accumulating it on first use.
    ///
    /// Negative indexes are rejected before any lock or storage access. The
    /// work runs on its own task, so dropping the returned future (a client
    /// hanging up, a caller-side timeout) leaves the operation in flight
    /// rather than aborting it between the store write and the accumulation.
    pub async fn get_term_by_index<I>(&self, index: I) -> Result<Term>
    where
        I: TryInto<TermIndex> + fmt::Display + Copy,
    {
        let index = validate_index(index)?;
        let service = self.clone();
        tokio::spawn(async move { service.get_or_compute(index).await })
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    async fn get_or_compute(&self, index: TermIndex) -> Result<Term> {
        let _guard = self.locks.acquire(&term_key(index)).await;

        if let Some(term) = self.terms.get(index).await.inspect_err(|e| {
            tracing::error!(index, error = %e, "failed to read term");
        })? {
            tracing::debug!(index, value = term.value, "term retrieved from store");
            // A stored term whose accumulation failed earlier is counted now.
            if !self.accumulator.read().await?.contains(index) {
                self.accumulate(term).await?;
            }
            return Ok(term);
        }

        let term = Term::compute(index);
        self.terms.insert(term).await.inspect_err(|e| {
            tracing::error!(index, error = %e, "failed to save term");
        })?;
        tracing::info!(index, value = term.value, "term computed and saved");

        self.accumulate(term).await?;
        Ok(term)
    }

    async fn accumulate(&self, term: Term) -> Result<Accumulation> {
        self.accumulator.add_term(term).await.inspect_err(|e| {
            tracing::error!(index = term.index, error = %e, "failed to add term to pi");
        })
    }

    /// Every stored term, ascending by index. Takes no lock.
    pub async fn get_terms(&self) -> Result<Vec<Term>> {
        Ok(self.terms.list_all().await?)
    }

    /// Current pi approximation. Takes no lock.
    pub async fn get_pi(&self) -> Result<PiReport> {
        Ok(self.accumulator.read().await?.report())
    }

    /// Fold stored terms that never reached the accumulator into pi.
    ///
    /// A crash between saving a term and accumulating it leaves the term
    /// stored but uncounted until someone requests it again. Run this once
    /// at startup so pi reflects it without waiting. Returns how many terms
    /// were folded in.
    pub async fn reconcile(&self) -> Result<usize> {
        let state = self.accumulator.read().await?;
        let missing: Vec<Term> = self
            .terms
            .list_all()
            .await?
            .into_iter()
            .filter(|term| !state.contains(term.index))
            .collect();

        let mut folded = 0;
        for term in missing {
            let _guard = self.locks.acquire(&term_key(term.index)).await;
            if self.accumulator.add_term(term).await?.changed() {
                folded += 1;
            }
        }

        if folded > 0 {
            tracing::warn!(folded, "reconciled terms missing from pi");
        }
        Ok(folded)
    }
}
