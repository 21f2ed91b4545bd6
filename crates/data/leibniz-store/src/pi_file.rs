//! Single-record pi store.
//!
//! The record is rewritten whole on every save: temp file, fsync, rename.
//! A reader (or a restart) sees either the previous record or the new one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use leibniz_core::{PiState, StoreResult};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::PiStore;

pub struct FilePiStore {
    path: PathBuf,
    committed: RwLock<Option<PiState>>,
}

impl FilePiStore {
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let committed = match tokio::fs::read(&path).await {
            Ok(bytes) => Some(serde_json::from_slice::<PiState>(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            path = %path.display(),
            contributors = committed.as_ref().map_or(0, |s| s.contributors.len()),
            "pi store opened"
        );
        Ok(Self {
            path,
            committed: RwLock::new(committed),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("db.tmp")
    }
}

#[async_trait]
impl PiStore for FilePiStore {
    async fn load(&self) -> StoreResult<Option<PiState>> {
        Ok(self.committed.read().await.clone())
    }

    async fn save(&self, state: &PiState) -> StoreResult<()> {
        // Held across the write so two saves cannot race on the temp file.
        let mut committed = self.committed.write().await;

        let content = serde_json::to_vec_pretty(state)?;
        let temp_path = self.temp_path();
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&content).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, &self.path).await?;

        *committed = Some(state.clone());
        Ok(())
    }
}
