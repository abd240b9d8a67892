use crate::media::MediaRecord;

/// Collaborator that generates derived files after an original is stored.
///
/// Called exactly once per successful [`MediaFileStore::add`](crate::MediaFileStore::add).
/// Implementations report their own failures; the stored original is never
/// rolled back.
#[async_trait::async_trait]
pub trait DerivedFiles: Send + Sync + 'static {
    /// Generates conversions and other derived artifacts for `media`.
    async fn generate_derived_files(&self, media: &MediaRecord);
}

/// Trigger that generates nothing. Used when no generator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDerivedFiles;

#[async_trait::async_trait]
impl DerivedFiles for NoopDerivedFiles {
    async fn generate_derived_files(&self, _media: &MediaRecord) {}
}
