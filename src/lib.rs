#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Deterministic storage layout and pluggable storage disks for uploaded media.
//!
//! [`layout`] maps a [`MediaRecord`] to the paths of its original and its
//! conversions. [`MediaFileStore`] uses those paths to move files in and out
//! of the [`StorageBackend`] selected by the record's disk name.

/// Fluent builder API.
pub mod builder;
/// Storage configuration models.
pub mod config;
/// Conversion descriptors.
pub mod conversion;
/// Derived-file generation trigger.
pub mod derived;
/// Error types exposed by this crate.
pub mod error;
/// Deterministic path layout for originals and conversions.
pub mod layout;
/// Media record model.
pub mod media;
/// Storage backend traits and implementations.
pub mod storage;
/// File store orchestrating layout and disks.
pub mod store;
/// Public URL building.
pub mod url;

pub use builder::MediaFileStoreBuilder;
pub use config::{DiskConfig, DiskKind, MediaConfig};
pub use conversion::{Conversion, ConversionSpec};
pub use derived::{DerivedFiles, NoopDerivedFiles};
pub use error::{ConfigError, MediaError, StorageError};
pub use layout::{directory_for, path_relative_to_root, render_file_name, storage_path_for};
pub use media::{MediaId, MediaKind, MediaRecord};
pub use storage::{
    BoxStream, ByteStream, DiskRegistry, LocalDisk, LocalDiskBuilder, MemoryDisk, StorageBackend,
};
pub use store::{MediaFileStore, StoredFile};
pub use url::UrlGenerator;
