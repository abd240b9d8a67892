//! Storage backend abstractions and built-in implementations.

use std::{collections::HashMap, fmt, pin::Pin, sync::Arc};

use bytes::Bytes;
use futures::Stream;

use crate::{
    config::{DiskKind, MediaConfig},
    ConfigError, MediaError, StorageError,
};

/// Local filesystem backend.
pub mod disk;
/// In-memory backend.
pub mod memory;
pub use disk::{LocalDisk, LocalDiskBuilder};
pub use memory::MemoryDisk;

/// Boxed stream type used by storage backends.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Byte stream flowing into or out of a backend.
pub type ByteStream<'a> = BoxStream<'a, Result<Bytes, StorageError>>;

/// Async trait abstraction for a named storage disk.
///
/// Paths are relative to the disk root and use `/` as separator.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Writes `stream` to `path`, replacing any existing object, and returns
    /// the number of bytes written. Missing parent directories are created.
    ///
    /// A stream that fails part way leaves the previous object untouched.
    async fn put(&self, path: &str, stream: ByteStream<'_>) -> Result<u64, StorageError>;

    /// Opens the object at `path` for reading.
    ///
    /// Fails with [`StorageError::NotFound`] when nothing is stored there.
    async fn read_stream(&self, path: &str) -> Result<ByteStream<'static>, StorageError>;

    /// Recursively deletes `path`. Deleting a missing directory succeeds.
    async fn delete_directory(&self, path: &str) -> Result<(), StorageError>;

    /// Moves the object at `from` to `to`.
    async fn move_file(&self, from: &str, to: &str) -> Result<(), StorageError>;

    /// Moves the directory `from`, with everything beneath it, to `to`.
    ///
    /// Fails with [`StorageError::NotFound`] when `from` does not exist.
    async fn move_directory(&self, from: &str, to: &str) -> Result<(), StorageError>;

    /// Creates `path` and its parents when absent.
    async fn make_directory(&self, path: &str) -> Result<(), StorageError>;
}

/// Named set of storage backends.
#[derive(Clone, Default)]
pub struct DiskRegistry {
    disks: HashMap<String, Arc<dyn StorageBackend>>,
    default_disk: Option<String>,
}

impl fmt::Debug for DiskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.disks.keys().collect();
        names.sort();
        f.debug_struct("DiskRegistry")
            .field("disks", &names)
            .field("default_disk", &self.default_disk)
            .finish()
    }
}

impl DiskRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every disk described by a validated configuration.
    pub fn from_config(config: &MediaConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut registry = Self::new();
        for disk in &config.disks {
            let backend: Arc<dyn StorageBackend> = match &disk.kind {
                DiskKind::Local { root } => Arc::new(
                    LocalDisk::builder()
                        .root(root)
                        .build()
                        .map_err(|_| ConfigError::EmptyRoot {
                            name: disk.name.clone(),
                        })?,
                ),
                DiskKind::Memory => Arc::new(MemoryDisk::new()),
            };
            registry.insert(disk.name.clone(), backend)?;
        }
        registry.default_disk = config.default_disk.clone();

        Ok(registry)
    }

    /// Registers `backend` under `name`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        backend: Arc<dyn StorageBackend>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyDiskName);
        }
        if self.disks.contains_key(&name) {
            return Err(ConfigError::DuplicateDisk { name });
        }
        self.disks.insert(name, backend);
        Ok(())
    }

    /// Sets the disk returned by [`DiskRegistry::default_disk`].
    pub fn set_default_disk(&mut self, name: impl Into<String>) -> Result<(), ConfigError> {
        let name = name.into();
        if !self.disks.contains_key(&name) {
            return Err(ConfigError::UnknownDefaultDisk { name });
        }
        self.default_disk = Some(name);
        Ok(())
    }

    /// Returns the name new records should use when the caller has no preference.
    ///
    /// This is a hint for code that creates [`MediaRecord`](crate::MediaRecord)s.
    /// Store operations never read it: every record names its own disk.
    pub fn default_disk(&self) -> Option<&str> {
        self.default_disk.as_deref()
    }

    /// Returns the backend registered as `name`.
    pub fn disk(&self, name: &str) -> Result<&Arc<dyn StorageBackend>, MediaError> {
        self.disks.get(name).ok_or_else(|| MediaError::UnknownDisk {
            disk: name.to_owned(),
        })
    }

    /// Returns `true` when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.disks.contains_key(name)
    }

    /// Returns the number of registered disks.
    pub fn len(&self) -> usize {
        self.disks.len()
    }

    /// Returns `true` when no disk is registered.
    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }
}

/// Splits a relative storage path into segments, rejecting traversal.
pub(crate) fn checked_segments(path: &str) -> Result<Vec<&str>, StorageError> {
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(StorageError::new(format!(
            "storage path `{path}` must be relative"
        )));
    }

    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        return Err(StorageError::new("storage path cannot be empty"));
    }
    if segments.iter().any(|segment| {
        *segment == "." || *segment == ".." || segment.contains(['\\', '\0'])
    }) {
        return Err(StorageError::new(format!(
            "storage path `{path}` contains an unsafe segment"
        )));
    }

    Ok(segments)
}
