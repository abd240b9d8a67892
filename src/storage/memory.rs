use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use bytes::Bytes;
use futures::{stream, StreamExt};
use tokio::sync::RwLock;

use super::{checked_segments, ByteStream, StorageBackend};
use crate::StorageError;

#[derive(Debug, Default)]
struct Entries {
    files: HashMap<String, Bytes>,
    directories: BTreeSet<String>,
}

/// In-memory disk keyed by normalized relative paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryDisk {
    entries: Arc<RwLock<Entries>>,
}

impl MemoryDisk {
    /// Creates an empty in-memory disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns stored bytes for `path`.
    pub async fn get(&self, path: &str) -> Option<Bytes> {
        let key = normalize(path).ok()?;
        self.entries.read().await.files.get(&key).cloned()
    }

    /// Returns `true` when a file is stored at `path`.
    pub async fn exists(&self, path: &str) -> bool {
        self.get(path).await.is_some()
    }

    /// Returns `true` when `path` was created as a directory or holds files.
    pub async fn directory_exists(&self, path: &str) -> bool {
        let Ok(key) = normalize(path) else {
            return false;
        };
        let prefix = format!("{key}/");
        let entries = self.entries.read().await;
        entries.directories.contains(&key)
            || entries.files.keys().any(|file| file.starts_with(&prefix))
    }

    /// Returns every stored file path, sorted.
    pub async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.read().await.files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Returns the current number of stored files.
    pub async fn len(&self) -> usize {
        self.entries.read().await.files.len()
    }

    /// Returns `true` when no files are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.files.is_empty()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryDisk {
    async fn put(&self, path: &str, mut stream: ByteStream<'_>) -> Result<u64, StorageError> {
        let key = normalize(path)?;

        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }
        let size = body.len() as u64;

        self.entries.write().await.files.insert(key, Bytes::from(body));

        #[cfg(feature = "tracing")]
        tracing::debug!(path = path, size = size, "memory disk: completed put");

        Ok(size)
    }

    async fn read_stream(&self, path: &str) -> Result<ByteStream<'static>, StorageError> {
        let key = normalize(path)?;
        let body = self
            .entries
            .read()
            .await
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path))?;

        Ok(Box::pin(stream::once(async move { Ok(body) })))
    }

    async fn delete_directory(&self, path: &str) -> Result<(), StorageError> {
        let key = normalize(path)?;
        let prefix = format!("{key}/");

        let mut entries = self.entries.write().await;
        entries.files.retain(|file, _| !file.starts_with(&prefix));
        entries
            .directories
            .retain(|directory| directory != &key && !directory.starts_with(&prefix));
        Ok(())
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = normalize(from)?;
        let destination = normalize(to)?;

        let mut entries = self.entries.write().await;
        let body = entries
            .files
            .remove(&source)
            .ok_or_else(|| StorageError::not_found(from))?;
        entries.files.insert(destination, body);
        Ok(())
    }

    async fn move_directory(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = normalize(from)?;
        let destination = normalize(to)?;
        let prefix = format!("{source}/");
        let rekey = |key: &str| format!("{destination}{}", &key[source.len()..]);

        let mut entries = self.entries.write().await;
        let files: Vec<String> = entries
            .files
            .keys()
            .filter(|file| file.starts_with(&prefix))
            .cloned()
            .collect();
        let directories: Vec<String> = entries
            .directories
            .iter()
            .filter(|directory| **directory == source || directory.starts_with(&prefix))
            .cloned()
            .collect();
        if files.is_empty() && directories.is_empty() {
            return Err(StorageError::not_found(from));
        }

        for file in files {
            if let Some(body) = entries.files.remove(&file) {
                entries.files.insert(rekey(&file), body);
            }
        }
        for directory in directories {
            entries.directories.remove(&directory);
            entries.directories.insert(rekey(&directory));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(from = from, to = to, "memory disk: moved directory");

        Ok(())
    }

    async fn make_directory(&self, path: &str) -> Result<(), StorageError> {
        let key = normalize(path)?;
        self.entries.write().await.directories.insert(key);
        Ok(())
    }
}

fn normalize(path: &str) -> Result<String, StorageError> {
    Ok(checked_segments(path)?.join("/"))
}
