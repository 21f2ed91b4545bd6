//! Append-only JSON-lines term store.
//!
//! Each committed term is one line: `{"index":10,"value":0.19047619047619047}`.
//! A crash mid-append can leave a torn final line; it is dropped (and the
//! file truncated back to the last complete record) when the store reopens.
//! A failed write in a running store is cut off the same way, and every
//! append starts at the end of the last committed record, so bytes from a
//! failed write never prefix a later one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use leibniz_core::{StoreError, StoreResult, Term, TermIndex};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};

use crate::TermStore;

pub struct FileTermStore {
    path: PathBuf,
    /// Serializes appends so concurrent inserts for different indexes
    /// never interleave bytes within a line.
    log: Mutex<TermLog>,
    committed: RwLock<BTreeMap<TermIndex, Term>>,
}

impl FileTermStore {
    /// Open (or create) the store at `path`, replaying every committed line.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let (committed, valid_len) = replay(&path, &content)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .await?;
        let committed_len = valid_len as u64;
        if valid_len < content.len() {
            file.set_len(committed_len).await?;
        }

        tracing::debug!(path = %path.display(), terms = committed.len(), "term store opened");
        Ok(Self {
            path,
            log: Mutex::new(TermLog {
                file,
                committed_len,
            }),
            committed: RwLock::new(committed),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

struct TermLog {
    file: File,
    /// End of the last record known to be on disk.
    committed_len: u64,
}

impl TermLog {
    async fn append(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.file
            .seek(std::io::SeekFrom::Start(self.committed_len))
            .await?;
        self.file.write_all(line).await?;
        self.file.flush().await?;
        self.file.sync_data().await?;
        self.committed_len += line.len() as u64;
        Ok(())
    }

    /// Cut off whatever part of a failed append reached the file.
    async fn rollback(&mut self) {
        if let Err(e) = self.file.set_len(self.committed_len).await {
            // The next append still starts at `committed_len`.
            tracing::warn!(error = %e, "failed to truncate partial term record");
        }
    }
}

/// Parse every complete line. Returns the terms and the byte length of the
/// prefix that holds only complete records.
fn replay(path: &Path, content: &str) -> StoreResult<(BTreeMap<TermIndex, Term>, usize)> {
    let mut committed = BTreeMap::new();
    let mut offset = 0;
    let mut valid_len = 0;

    for (n, line) in content.split_inclusive('\n').enumerate() {
        offset += line.len();
        let complete = line.ends_with('\n');
        let record = line.trim();
        if record.is_empty() {
            if complete {
                valid_len = offset;
            }
            continue;
        }

        if !complete {
            tracing::warn!(
                path = %path.display(),
                line = n + 1,
                "dropping torn record at end of term store"
            );
            break;
        }

        let term = serde_json::from_str::<Term>(record).map_err(|e| StoreError::Corrupt {
            line: n + 1,
            reason: e.to_string(),
        })?;
        // First write wins; a later duplicate is never authoritative.
        committed.entry(term.index).or_insert(term);
        valid_len = offset;
    }

    Ok((committed, valid_len))
}

#[async_trait]
impl TermStore for FileTermStore {
    async fn get(&self, index: TermIndex) -> StoreResult<Option<Term>> {
        Ok(self.committed.read().await.get(&index).copied())
    }

    async fn insert(&self, term: Term) -> StoreResult<()> {
        let mut log = self.log.lock().await;
        if self.committed.read().await.contains_key(&term.index) {
            return Err(StoreError::AlreadyExists(term.index));
        }

        let mut line = serde_json::to_vec(&term)?;
        line.push(b'\n');
        if let Err(e) = log.append(&line).await {
            log.rollback().await;
            return Err(e.into());
        }

        self.committed.write().await.insert(term.index, term);
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Term>> {
        Ok(self.committed.read().await.values().copied().collect())
    }
}
