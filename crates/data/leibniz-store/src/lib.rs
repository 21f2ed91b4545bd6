//! Durable storage for memoized terms and the pi accumulator.
//!
//! Both stores are pluggable through async traits. File-backed stores keep
//! an in-memory copy of what has been committed to disk; the copy is only
//! updated after the write reaches the file, so readers never observe a
//! record that a crash could lose.
//!
//! These stores do not enforce the accumulator invariants. Callers serialize
//! writers per key through the lock manager.

pub mod memory;
pub mod pi_file;
pub mod terms_file;

pub use memory::{MemoryPiStore, MemoryTermStore};
pub use pi_file::FilePiStore;
pub use terms_file::FileTermStore;

use async_trait::async_trait;
use leibniz_core::{PiState, StoreResult, Term, TermIndex};

/// Index -> value mapping of computed terms.
#[async_trait]
pub trait TermStore: Send + Sync {
    /// Read whatever is committed for `index` right now.
    async fn get(&self, index: TermIndex) -> StoreResult<Option<Term>>;

    /// Commit a new term. Fails with `AlreadyExists` if the index is taken.
    async fn insert(&self, term: Term) -> StoreResult<()>;

    /// Snapshot of every committed term, ascending by index.
    async fn list_all(&self) -> StoreResult<Vec<Term>>;
}

/// Holder of the single `PiState` record.
#[async_trait]
pub trait PiStore: Send + Sync {
    /// `None` until the first term has ever been accumulated.
    async fn load(&self) -> StoreResult<Option<PiState>>;

    /// Replace the record. Visible to `load` only once fully committed.
    async fn save(&self, state: &PiState) -> StoreResult<()>;
}
