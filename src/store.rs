use std::{fmt, io::ErrorKind, path::Path, sync::Arc};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::{
    builder::MediaFileStoreBuilder,
    config::MediaConfig,
    derived::{DerivedFiles, NoopDerivedFiles},
    layout::{self, join_segments},
    media::MediaRecord,
    storage::{ByteStream, DiskRegistry},
    ConfigError, MediaError, StorageError,
};

/// Metadata describing a file written into the media library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Disk the file was written to.
    pub disk: String,
    /// Path relative to the disk root.
    pub path: String,
    /// Stored file name, the last segment of `path`.
    pub file_name: String,
    /// Bytes written.
    pub size: u64,
}

/// Moves media files in and out of their storage disks.
///
/// All path decisions go through [`layout`]; the store keeps no state besides
/// the disk registry and the derived-file trigger, so it is safe to share.
/// Operations on the same record are not serialized here.
#[derive(Clone)]
pub struct MediaFileStore {
    disks: DiskRegistry,
    derived_files: Arc<dyn DerivedFiles>,
}

impl fmt::Debug for MediaFileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFileStore")
            .field("disks", &self.disks)
            .field("derived_files", &"<dyn DerivedFiles>")
            .finish()
    }
}

impl MediaFileStore {
    /// Creates a store over `disks` that generates no derived files.
    pub fn new(disks: DiskRegistry) -> Self {
        Self::with_derived_files(disks, Arc::new(NoopDerivedFiles))
    }

    /// Creates a store over `disks` using `derived_files` after each add.
    pub fn with_derived_files(disks: DiskRegistry, derived_files: Arc<dyn DerivedFiles>) -> Self {
        Self {
            disks,
            derived_files,
        }
    }

    /// Creates a store from a validated configuration.
    pub fn from_config(config: &MediaConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(DiskRegistry::from_config(config)?))
    }

    /// Creates a fluent builder.
    pub fn builder() -> MediaFileStoreBuilder {
        MediaFileStoreBuilder::default()
    }

    /// Returns the disk registry.
    pub fn disks(&self) -> &DiskRegistry {
        &self.disks
    }

    /// Copies `source` into the media directory and generates derived files.
    ///
    /// The stored name is the base name of `target_file_name` when given,
    /// otherwise [`layout::render_file_name`] of `source`.
    pub async fn add(
        &self,
        source: impl AsRef<Path>,
        media: &MediaRecord,
        target_file_name: Option<&str>,
    ) -> Result<StoredFile, MediaError> {
        let stored = self
            .copy_to_media_library(source, media, "", target_file_name)
            .await?;

        self.derived_files.generate_derived_files(media).await;

        Ok(stored)
    }

    /// Copies `source` into `sub_directory` of the media directory.
    ///
    /// An empty `sub_directory` targets the media directory itself.
    pub async fn copy_to_media_library(
        &self,
        source: impl AsRef<Path>,
        media: &MediaRecord,
        sub_directory: &str,
        target_file_name: Option<&str>,
    ) -> Result<StoredFile, MediaError> {
        let source = source.as_ref();
        let file_name = match target_file_name.filter(|name| !name.is_empty()) {
            Some(target) => target_basename(target)?,
            None => layout::render_file_name(source),
        };

        let directory = layout::directory_for(media);
        let destination = join_segments([
            directory.as_str(),
            sub_directory.trim_matches('/'),
            file_name.as_str(),
        ]);
        let disk = self.disks.disk(&media.disk)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            disk = media.disk.as_str(),
            source = %source.display(),
            destination = destination.as_str(),
            "media store: copying into library"
        );

        let file = tokio::fs::File::open(source)
            .await
            .map_err(|err| MediaError::StorageRead {
                path: source.display().to_string(),
                source: io_error(&source.display().to_string(), err),
            })?;
        let stream: ByteStream<'static> = Box::pin(ReaderStream::new(file).map(|chunk| {
            chunk.map_err(|err| StorageError::new(format!("failed to read source file: {err}")))
        }));

        let size = disk
            .put(&destination, stream)
            .await
            .map_err(|source| MediaError::StorageWrite {
                path: destination.clone(),
                source,
            })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            disk = media.disk.as_str(),
            path = destination.as_str(),
            size = size,
            "media store: stored file"
        );

        Ok(StoredFile {
            disk: media.disk.clone(),
            path: destination,
            file_name,
            size,
        })
    }

    /// Appends the stored original of `media` to `target`, creating it first.
    ///
    /// Existing content of `target` is kept; truncate it beforehand when a
    /// plain copy is wanted. Returns the number of bytes appended.
    pub async fn copy_from_media_library(
        &self,
        media: &MediaRecord,
        target: impl AsRef<Path>,
    ) -> Result<u64, MediaError> {
        let target = target.as_ref();
        let source = layout::storage_path_for(media, None);
        let disk = self.disks.disk(&media.disk)?;

        let mut output = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(target)
            .await
            .map_err(|err| MediaError::StorageWrite {
                path: target.display().to_string(),
                source: io_error(&target.display().to_string(), err),
            })?;

        let mut stream = disk
            .read_stream(&source)
            .await
            .map_err(|err| MediaError::StorageRead {
                path: source.clone(),
                source: err,
            })?;

        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|err| MediaError::StorageRead {
                path: source.clone(),
                source: err,
            })?;
            output
                .write_all(&bytes)
                .await
                .map_err(|err| MediaError::StorageWrite {
                    path: target.display().to_string(),
                    source: StorageError::new(format!("failed to append: {err}")),
                })?;
            written = written.saturating_add(bytes.len() as u64);
        }

        output.flush().await.map_err(|err| MediaError::StorageWrite {
            path: target.display().to_string(),
            source: StorageError::new(format!("failed to flush: {err}")),
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            disk = media.disk.as_str(),
            path = source.as_str(),
            target = %target.display(),
            size = written,
            "media store: copied out of library"
        );

        Ok(written)
    }

    /// Deletes the media directory with the original, conversions and any
    /// other artifacts. Succeeds when nothing is stored.
    pub async fn remove_files(&self, media: &MediaRecord) -> Result<(), MediaError> {
        let directory = layout::directory_for(media);
        let disk = self.disks.disk(&media.disk)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            disk = media.disk.as_str(),
            path = directory.as_str(),
            "media store: removing media directory"
        );

        disk.delete_directory(&directory)
            .await
            .map_err(|source| MediaError::StorageDirectory {
                path: directory,
                source,
            })
    }

    /// Moves the original stored as `old_file_name` to `media.file_name`.
    ///
    /// `media` must already carry the new name. The record is not touched;
    /// persist the new name only after this returns `Ok`. When the new name
    /// lands in another bucket directory the whole media directory moves with
    /// it, so conversions stay next to the original.
    pub async fn rename_file(
        &self,
        media: &MediaRecord,
        old_file_name: &str,
    ) -> Result<(), MediaError> {
        let old_media = media.with_file_name(target_basename(old_file_name)?);
        let old_directory = layout::directory_for(&old_media);
        let new_directory = layout::directory_for(media);
        let disk = self.disks.disk(&media.disk)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            disk = media.disk.as_str(),
            from = old_media.file_name.as_str(),
            to = media.file_name.as_str(),
            "media store: renaming original"
        );

        let moved_directory = old_directory != new_directory;
        if moved_directory {
            disk.move_directory(&old_directory, &new_directory)
                .await
                .map_err(|source| move_failed(&old_directory, &new_directory, source))?;
        }

        let from = join_segments([new_directory.as_str(), old_media.file_name.as_str()]);
        let to = layout::storage_path_for(media, None);
        if from == to {
            return Ok(());
        }

        if let Err(source) = disk.move_file(&from, &to).await {
            if moved_directory {
                let _ = disk.move_directory(&new_directory, &old_directory).await;
            }
            return Err(move_failed(&from, &to, source));
        }

        Ok(())
    }

    /// Creates the media directory when absent and returns its path.
    pub async fn ensure_media_directory(&self, media: &MediaRecord) -> Result<String, MediaError> {
        let directory = layout::directory_for(media);
        let disk = self.disks.disk(&media.disk)?;

        disk.make_directory(&directory)
            .await
            .map_err(|source| MediaError::StorageDirectory {
                path: directory.clone(),
                source,
            })?;

        Ok(directory)
    }
}

fn target_basename(target: &str) -> Result<String, MediaError> {
    Path::new(target)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| MediaError::InvalidPathInput {
            input: target.to_owned(),
            reason: "file name is empty after taking its base name",
        })
}

fn move_failed(from: &str, to: &str, source: StorageError) -> MediaError {
    #[cfg(feature = "tracing")]
    tracing::warn!(from = from, to = to, error = %source, "media store: rename failed");

    MediaError::StorageMove {
        from: from.to_owned(),
        to: to.to_owned(),
        source,
    }
}

fn io_error(path: &str, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::not_found(path)
    } else {
        StorageError::new(format!("`{path}`: {err}"))
    }
}
