use std::sync::Arc;

use crate::{
    derived::{DerivedFiles, NoopDerivedFiles},
    error::ConfigError,
    storage::{DiskRegistry, StorageBackend},
    store::MediaFileStore,
};

/// Builder for configuring a [`MediaFileStore`].
///
/// Registration errors are deferred to [`MediaFileStoreBuilder::build`] so
/// calls can be chained.
#[derive(Clone, Default)]
pub struct MediaFileStoreBuilder {
    disks: Vec<(String, Arc<dyn StorageBackend>)>,
    default_disk: Option<String>,
    derived_files: Option<Arc<dyn DerivedFiles>>,
}

impl std::fmt::Debug for MediaFileStoreBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaFileStoreBuilder")
            .field(
                "disks",
                &self.disks.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
            )
            .field("default_disk", &self.default_disk)
            .field("derived_files", &self.derived_files.as_ref().map(|_| "<dyn DerivedFiles>"))
            .finish()
    }
}

impl MediaFileStoreBuilder {
    /// Creates a builder with no disks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` under `name`.
    pub fn disk<B>(mut self, name: impl Into<String>, backend: B) -> Self
    where
        B: StorageBackend,
    {
        self.disks.push((name.into(), Arc::new(backend)));
        self
    }

    /// Registers an already shared backend under `name`.
    pub fn shared_disk(
        mut self,
        name: impl Into<String>,
        backend: Arc<dyn StorageBackend>,
    ) -> Self {
        self.disks.push((name.into(), backend));
        self
    }

    /// Sets the default disk name exposed through [`DiskRegistry::default_disk`].
    pub fn default_disk(mut self, name: impl Into<String>) -> Self {
        self.default_disk = Some(name.into());
        self
    }

    /// Sets the collaborator invoked after each successful add.
    pub fn derived_files<D>(mut self, derived_files: D) -> Self
    where
        D: DerivedFiles,
    {
        self.derived_files = Some(Arc::new(derived_files));
        self
    }

    /// Validates the registered disks and builds the store.
    pub fn build(self) -> Result<MediaFileStore, ConfigError> {
        if self.disks.is_empty() {
            return Err(ConfigError::NoDisks);
        }

        let mut registry = DiskRegistry::new();
        for (name, backend) in self.disks {
            registry.insert(name, backend)?;
        }
        if let Some(name) = self.default_disk {
            registry.set_default_disk(name)?;
        }

        let derived_files: Arc<dyn DerivedFiles> = match self.derived_files {
            Some(derived_files) => derived_files,
            None => Arc::new(NoopDerivedFiles),
        };
        Ok(MediaFileStore::with_derived_files(registry, derived_files))
    }
}
