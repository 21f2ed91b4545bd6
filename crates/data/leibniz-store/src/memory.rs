//! In-memory stores for tests and ephemeral runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use leibniz_core::{PiState, StoreError, StoreResult, Term, TermIndex};
use tokio::sync::RwLock;

use crate::{PiStore, TermStore};

#[derive(Debug, Default)]
pub struct MemoryTermStore {
    terms: RwLock<BTreeMap<TermIndex, Term>>,
}

impl MemoryTermStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TermStore for MemoryTermStore {
    async fn get(&self, index: TermIndex) -> StoreResult<Option<Term>> {
        Ok(self.terms.read().await.get(&index).copied())
    }

    async fn insert(&self, term: Term) -> StoreResult<()> {
        let mut terms = self.terms.write().await;
        if terms.contains_key(&term.index) {
            return Err(StoreError::AlreadyExists(term.index));
        }
        terms.insert(term.index, term);
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Term>> {
        Ok(self.terms.read().await.values().copied().collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPiStore {
    state: RwLock<Option<PiState>>,
}

impl MemoryPiStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PiStore for MemoryPiStore {
    async fn load(&self) -> StoreResult<Option<PiState>> {
        Ok(self.state.read().await.clone())
    }

    async fn save(&self, state: &PiState) -> StoreResult<()> {
        *self.state.write().await = Some(state.clone());
        Ok(())
    }
}
