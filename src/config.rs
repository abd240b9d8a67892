use std::{collections::HashSet, path::PathBuf};

use crate::error::ConfigError;

/// Backend kind of a configured disk.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase", tag = "driver"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskKind {
    /// Files under a directory on the local filesystem.
    Local {
        /// Root directory of the disk.
        root: PathBuf,
    },
    /// Files held in process memory.
    Memory,
}

/// One named disk.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskConfig {
    /// Name media records use to select this disk.
    pub name: String,
    /// Backend kind and its settings.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: DiskKind,
}

impl DiskConfig {
    /// Describes a local disk rooted at `root`.
    pub fn local(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: DiskKind::Local { root: root.into() },
        }
    }

    /// Describes an in-memory disk.
    pub fn memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DiskKind::Memory,
        }
    }
}

/// Top-level storage configuration model.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaConfig {
    /// Disk new records should use when the caller does not pick one.
    ///
    /// Only code creating records reads this; the store always follows the
    /// disk named by each record.
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_disk: Option<String>,
    /// Every disk available to the file store.
    #[cfg_attr(feature = "serde", serde(default))]
    pub disks: Vec<DiskConfig>,
}

impl MediaConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a disk.
    pub fn with_disk(mut self, disk: DiskConfig) -> Self {
        self.disks.push(disk);
        self
    }

    /// Sets the default disk.
    pub fn with_default_disk(mut self, name: impl Into<String>) -> Self {
        self.default_disk = Some(name.into());
        self
    }

    /// Validates disk names, roots and the default disk.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.disks.is_empty() {
            return Err(ConfigError::NoDisks);
        }

        let mut seen = HashSet::with_capacity(self.disks.len());
        for disk in &self.disks {
            if disk.name.trim().is_empty() {
                return Err(ConfigError::EmptyDiskName);
            }
            if !seen.insert(disk.name.as_str()) {
                return Err(ConfigError::DuplicateDisk {
                    name: disk.name.clone(),
                });
            }
            if let DiskKind::Local { root } = &disk.kind {
                if root.as_os_str().is_empty() {
                    return Err(ConfigError::EmptyRoot {
                        name: disk.name.clone(),
                    });
                }
            }
        }

        if let Some(name) = &self.default_disk {
            if !seen.contains(name.as_str()) {
                return Err(ConfigError::UnknownDefaultDisk { name: name.clone() });
            }
        }

        Ok(())
    }
}
