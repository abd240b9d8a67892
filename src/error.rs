use thiserror::Error;

/// Configuration-time validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// No disk was configured.
    #[error("at least one disk must be configured")]
    NoDisks,
    /// A disk name was empty or whitespace.
    #[error("disk name cannot be empty")]
    EmptyDiskName,
    /// The same disk name was registered twice.
    #[error("duplicate disk `{name}`")]
    DuplicateDisk {
        /// Duplicated disk name.
        name: String,
    },
    /// A local disk was configured without a root directory.
    #[error("local disk `{name}` has an empty root path")]
    EmptyRoot {
        /// Name of the disk with an empty root.
        name: String,
    },
    /// The default disk does not name a configured disk.
    #[error("default disk `{name}` is not configured")]
    UnknownDefaultDisk {
        /// Configured default disk name.
        name: String,
    },
}

/// Storage backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The requested object or directory does not exist.
    #[error("`{path}` does not exist")]
    NotFound {
        /// Path relative to the disk root.
        path: String,
    },
    /// Generic storage failure with message context.
    #[error("{message}")]
    Message {
        /// Storage failure message.
        message: String,
    },
}

impl StorageError {
    /// Creates a storage error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Creates a not-found error for `path`.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Returns `true` when this error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Runtime error type used by `mediashelf`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MediaError {
    /// Configuration error surfaced at runtime.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The backend refused a write.
    #[error("failed to write `{path}`: {source}")]
    StorageWrite {
        /// Destination path relative to the disk root.
        path: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },
    /// The source object is missing or could not be read.
    #[error("failed to read `{path}`: {source}")]
    StorageRead {
        /// Source path relative to the disk root, or a local path.
        path: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },
    /// The move backing a rename failed.
    #[error("failed to move `{from}` to `{to}`: {source}")]
    StorageMove {
        /// Original path.
        from: String,
        /// Requested path.
        to: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },
    /// Deleting or creating a media directory failed.
    #[error("failed to update directory `{path}`: {source}")]
    StorageDirectory {
        /// Directory path relative to the disk root.
        path: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },
    /// A filename or path argument could not be used.
    #[error("invalid path input `{input}`: {reason}")]
    InvalidPathInput {
        /// Rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// A media record references a disk that is not registered.
    #[error("disk `{disk}` is not registered")]
    UnknownDisk {
        /// Requested disk name.
        disk: String,
    },
}
