use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::{checked_segments, ByteStream, StorageBackend};
use crate::StorageError;

/// Builder for [`LocalDisk`].
#[derive(Debug, Clone)]
pub struct LocalDiskBuilder {
    root: PathBuf,
}

impl LocalDiskBuilder {
    /// Sets the directory every relative path resolves against.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Builds a validated local disk.
    pub fn build(self) -> Result<LocalDisk, StorageError> {
        if self.root.as_os_str().is_empty() {
            return Err(StorageError::new("local disk root path cannot be empty"));
        }

        Ok(LocalDisk { root: self.root })
    }
}

impl Default for LocalDiskBuilder {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("mediashelf"),
        }
    }
}

/// Disk backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    /// Creates a local disk builder.
    pub fn builder() -> LocalDiskBuilder {
        LocalDiskBuilder::default()
    }

    /// Returns the root directory of this disk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative storage path to an absolute filesystem path.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let mut resolved = self.root.clone();
        for segment in checked_segments(path)? {
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalDisk {
    async fn put(&self, path: &str, mut stream: ByteStream<'_>) -> Result<u64, StorageError> {
        let output_path = self.resolve(path)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            path = path,
            root = %self.root.display(),
            "local disk: begin streaming put"
        );

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::new(format!("failed to create directory: {err}")))?;
        }

        let staging_path = staging_path_for(&output_path);
        let written = match write_stream(&staging_path, &mut stream).await {
            Ok(written) => written,
            Err(err) => {
                let _ = tokio::fs::remove_file(&staging_path).await;
                return Err(err);
            }
        };

        if let Err(err) = tokio::fs::rename(&staging_path, &output_path).await {
            let _ = tokio::fs::remove_file(&staging_path).await;
            return Err(StorageError::new(format!(
                "failed to move output file into place: {err}"
            )));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(path = path, size = written, "local disk: completed put");

        Ok(written)
    }

    async fn read_stream(&self, path: &str) -> Result<ByteStream<'static>, StorageError> {
        let source_path = self.resolve(path)?;

        let file = match tokio::fs::File::open(&source_path).await {
            Ok(file) => file,
            Err(ref err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::not_found(path));
            }
            Err(err) => {
                return Err(StorageError::new(format!("failed to open `{path}`: {err}")));
            }
        };

        let stream = ReaderStream::new(file).map(|chunk| {
            chunk.map_err(|err| StorageError::new(format!("failed to read stored file: {err}")))
        });
        Ok(Box::pin(stream))
    }

    async fn delete_directory(&self, path: &str) -> Result<(), StorageError> {
        let directory = self.resolve(path)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(path = path, "local disk: deleting directory");

        match tokio::fs::remove_dir_all(&directory).await {
            Ok(()) => Ok(()),
            Err(ref err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::new(format!(
                "failed to delete directory `{path}`: {err}"
            ))),
        }
    }

    async fn move_file(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = self.resolve(from)?;
        let destination = self.resolve(to)?;

        if !tokio::fs::try_exists(&source)
            .await
            .map_err(|err| StorageError::new(format!("failed to inspect `{from}`: {err}")))?
        {
            return Err(StorageError::not_found(from));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::new(format!("failed to create directory: {err}")))?;
        }

        tokio::fs::rename(&source, &destination)
            .await
            .map_err(|err| StorageError::new(format!("failed to move `{from}` to `{to}`: {err}")))
    }

    async fn move_directory(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = self.resolve(from)?;
        let destination = self.resolve(to)?;

        if !tokio::fs::try_exists(&source)
            .await
            .map_err(|err| StorageError::new(format!("failed to inspect `{from}`: {err}")))?
        {
            return Err(StorageError::not_found(from));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::new(format!("failed to create directory: {err}")))?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(from = from, to = to, "local disk: moving directory");

        // Succeeds onto a missing or empty destination only.
        tokio::fs::rename(&source, &destination)
            .await
            .map_err(|err| StorageError::new(format!("failed to move `{from}` to `{to}`: {err}")))
    }

    async fn make_directory(&self, path: &str) -> Result<(), StorageError> {
        let directory = self.resolve(path)?;
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|err| StorageError::new(format!("failed to create directory `{path}`: {err}")))
    }
}

async fn write_stream(path: &Path, stream: &mut ByteStream<'_>) -> Result<u64, StorageError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|err| StorageError::new(format!("failed to create output file: {err}")))?;

    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        file.write_all(&bytes)
            .await
            .map_err(|err| StorageError::new(format!("failed to write output file: {err}")))?;
        written = written.saturating_add(bytes.len() as u64);
    }

    file.flush()
        .await
        .map_err(|err| StorageError::new(format!("failed to flush output file: {err}")))?;

    Ok(written)
}

fn staging_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("file");
    path.with_file_name(format!(".{name}.{}.part", Uuid::new_v4().simple()))
}
