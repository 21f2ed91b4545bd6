//! # Leibniz Core
//!
//! Shared vocabulary for the Leibniz workspace.
//!
//! ```text
//!   pi = 4/1 - 4/3 + 4/5 - 4/7 + ...
//!        ^^^   ^^^   ^^^   ^^^
//!      term 0  1     2     3
//! ```
//!
//! - [`Term`]: one memoized element of the Gregory-Leibniz series
//! - [`PiState`]: the running sum and the set of indexes folded into it
//! - [`PiReport`]: the wire view of a `PiState`
//! - [`Error`] / [`StoreError`]: the error taxonomy shared by every tier

pub mod pi;
pub mod term;

pub use pi::{PiReport, PiState};
pub use term::{parse_index, validate_index, Term, TermIndex};

/// Result type for leibniz operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the term service
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller contract violation: the index is negative or not an integer.
    #[error("Invalid term index: {0}")]
    InvalidIndex(String),

    /// A well-formed non-negative integer too large to be a term index.
    #[error("Term index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Reserved. Locks wait indefinitely unless a bound is configured.
    #[error("Timed out waiting for lock {0}")]
    LockTimeout(String),

    /// The spawned get-or-compute task did not run to completion.
    #[error("Task failed: {0}")]
    Task(String),
}

impl Error {
    pub fn is_invalid_index(&self) -> bool {
        matches!(self, Error::InvalidIndex(_))
    }
}

/// Errors raised by durable storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Term {0} already exists")]
    AlreadyExists(TermIndex),

    #[error("Corrupt record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
