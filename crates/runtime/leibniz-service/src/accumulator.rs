//! Running pi sum.

use std::sync::Arc;

use leibniz_core::{PiState, Result, Term};
use leibniz_lock::{KeyedLocks, PI_KEY};
use leibniz_store::PiStore;

/// Outcome of [`PiAccumulator::add_term`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulation {
    /// First term ever; the pi record was created.
    Created,
    Added,
    /// The index was already a contributor. Nothing changed.
    AlreadyPresent,
}

impl Accumulation {
    pub fn changed(self) -> bool {
        !matches!(self, Accumulation::AlreadyPresent)
    }
}

#[derive(Clone)]
pub struct PiAccumulator {
    store: Arc<dyn PiStore>,
    locks: Arc<KeyedLocks>,
}

impl PiAccumulator {
    pub fn new(store: Arc<dyn PiStore>, locks: Arc<KeyedLocks>) -> Self {
        Self { store, locks }
    }

    /// Current committed state, without taking any lock.
    pub async fn read(&self) -> Result<PiState> {
        Ok(self.store.load().await?.unwrap_or_default())
    }

    /// Fold `term` into the sum exactly once.
    ///
    /// The load, the membership check and the save form one critical section
    /// under the `pi` key.
    pub async fn add_term(&self, term: Term) -> Result<Accumulation> {
        let _guard = self.locks.acquire(PI_KEY).await;

        let existing = self.store.load().await?;
        let outcome = if existing.is_some() {
            Accumulation::Added
        } else {
            Accumulation::Created
        };

        let mut state = existing.unwrap_or_default();
        if !state.add(term) {
            tracing::info!(index = term.index, "pi already contains term");
            return Ok(Accumulation::AlreadyPresent);
        }

        self.store.save(&state).await?;
        match outcome {
            Accumulation::Created => {
                tracing::info!(index = term.index, "added term, pi record created")
            }
            _ => tracing::info!(index = term.index, pi = state.sum, "added term to pi"),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leibniz_store::MemoryPiStore;

    fn accumulator() -> PiAccumulator {
        PiAccumulator::new(Arc::new(MemoryPiStore::new()), Arc::new(KeyedLocks::new()))
    }

    #[tokio::test]
    async fn test_read_defaults_to_empty() {
        let state = accumulator().read().await.unwrap();
        assert_eq!(state.sum, 0.0);
        assert!(state.contributors.is_empty());
    }

    #[tokio::test]
    async fn test_add_term_outcomes() {
        let acc = accumulator();
        assert_eq!(acc.add_term(Term::compute(0)).await.unwrap(), Accumulation::Created);
        assert_eq!(acc.add_term(Term::compute(1)).await.unwrap(), Accumulation::Added);
        assert_eq!(
            acc.add_term(Term::compute(0)).await.unwrap(),
            Accumulation::AlreadyPresent
        );
        assert!(!Accumulation::AlreadyPresent.changed());

        let state = acc.read().await.unwrap();
        assert_eq!(state.sum, 4.0 + -4.0 / 3.0);
        assert_eq!(state.contributors.into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_count_once() {
        let acc = accumulator();
        let tasks: Vec<_> = (0..40u64)
            .map(|i| {
                let acc = acc.clone();
                tokio::spawn(async move { acc.add_term(Term::compute(i % 10)).await })
            })
            .collect();

        let mut changed = 0;
        for result in futures::future::join_all(tasks).await {
            if result.unwrap().unwrap().changed() {
                changed += 1;
            }
        }
        assert_eq!(changed, 10);

        let state = acc.read().await.unwrap();
        assert_eq!(state.contributors.len(), 10);
        let expected: f64 = (0..10).map(|n| Term::compute(n).value).sum();
        assert!((state.sum - expected).abs() < 1e-12);
    }
}
