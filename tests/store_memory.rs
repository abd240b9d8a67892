#![allow(missing_docs)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use mediashelf::{
    directory_for, layout::CONVERSIONS_DIRECTORY, storage_path_for, ByteStream, ConversionSpec,
    DerivedFiles, MediaError, MediaFileStore, MediaRecord, MemoryDisk, StorageBackend,
    StorageError,
};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct RecordingDerivedFiles {
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl DerivedFiles for RecordingDerivedFiles {
    async fn generate_derived_files(&self, media: &MediaRecord) {
        self.calls
            .lock()
            .expect("lock should succeed")
            .push(media.file_name.clone());
    }
}

struct RefusingDisk;

#[async_trait::async_trait]
impl StorageBackend for RefusingDisk {
    async fn put(&self, _path: &str, _stream: ByteStream<'_>) -> Result<u64, StorageError> {
        Err(StorageError::new("disk is full"))
    }

    async fn read_stream(&self, path: &str) -> Result<ByteStream<'static>, StorageError> {
        Err(StorageError::not_found(path))
    }

    async fn delete_directory(&self, _path: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn move_file(&self, from: &str, _to: &str) -> Result<(), StorageError> {
        Err(StorageError::not_found(from))
    }

    async fn move_directory(&self, from: &str, _to: &str) -> Result<(), StorageError> {
        Err(StorageError::not_found(from))
    }

    async fn make_directory(&self, _path: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

fn store_with(disk: &MemoryDisk, derived: &RecordingDerivedFiles) -> MediaFileStore {
    MediaFileStore::builder()
        .disk("memory", disk.clone())
        .derived_files(derived.clone())
        .build()
        .expect("builder should succeed")
}

fn photo(file_name: &str) -> MediaRecord {
    MediaRecord::new(9, "memory", "App\\Models\\Post", "gallery", file_name)
}

#[tokio::test]
async fn add_stores_original_where_layout_points_and_triggers_once() {
    let disk = MemoryDisk::new();
    let derived = RecordingDerivedFiles::default();
    let store = store_with(&disk, &derived);
    let root = temp_root();
    let source = write_source(&root, "upload.png", b"PNGDATA").await;

    let media = photo("sunset.png");
    let stored = store
        .add(&source, &media, Some("sunset.png"))
        .await
        .expect("add should succeed");

    assert_eq!(stored.path, storage_path_for(&media, None));
    assert_eq!(stored.file_name, "sunset.png");
    assert_eq!(stored.disk, "memory");
    assert_eq!(stored.size, 7);
    assert_eq!(
        disk.get(&stored.path).await,
        Some(Bytes::from_static(b"PNGDATA"))
    );
    assert_eq!(
        derived.calls.lock().expect("lock should succeed").clone(),
        vec!["sunset.png".to_owned()]
    );

    cleanup(root).await;
}

#[tokio::test]
async fn add_without_target_uses_rendered_name() {
    let disk = MemoryDisk::new();
    let derived = RecordingDerivedFiles::default();
    let store = store_with(&disk, &derived);
    let root = temp_root();
    let source = write_source(&root, "upload.jpg", b"JPEG").await;

    let rendered = mediashelf::render_file_name(&source);
    let media = photo(&rendered);
    let stored = store
        .add(&source, &media, None)
        .await
        .expect("add should succeed");

    assert_eq!(stored.file_name, rendered);
    assert!(stored.file_name.ends_with(".jpg"));
    assert_eq!(stored.path, storage_path_for(&media, None));

    cleanup(root).await;
}

#[tokio::test]
async fn target_file_name_is_reduced_to_its_base_name() {
    let disk = MemoryDisk::new();
    let store = store_with(&disk, &RecordingDerivedFiles::default());
    let root = temp_root();
    let source = write_source(&root, "upload.txt", b"hello").await;

    let media = photo("notes.txt");
    let stored = store
        .add(&source, &media, Some("../../elsewhere/notes.txt"))
        .await
        .expect("add should succeed");

    assert_eq!(stored.path, storage_path_for(&media, None));

    cleanup(root).await;
}

#[tokio::test]
async fn empty_base_name_is_rejected_without_triggering() {
    let disk = MemoryDisk::new();
    let derived = RecordingDerivedFiles::default();
    let store = store_with(&disk, &derived);
    let root = temp_root();
    let source = write_source(&root, "upload.txt", b"hello").await;

    let err = store
        .add(&source, &photo("notes.txt"), Some("folder/.."))
        .await
        .expect_err("empty base name should fail");

    assert!(matches!(err, MediaError::InvalidPathInput { .. }));
    assert!(disk.is_empty().await);
    assert!(derived.calls.lock().expect("lock should succeed").is_empty());

    cleanup(root).await;
}

#[tokio::test]
async fn refused_write_is_reported_without_triggering() {
    let derived = RecordingDerivedFiles::default();
    let store = MediaFileStore::builder()
        .disk("memory", RefusingDisk)
        .derived_files(derived.clone())
        .build()
        .expect("builder should succeed");
    let root = temp_root();
    let source = write_source(&root, "upload.png", b"PNGDATA").await;

    let media = photo("sunset.png");
    let err = store
        .add(&source, &media, Some("sunset.png"))
        .await
        .expect_err("refused write should fail");

    match err {
        MediaError::StorageWrite { path, source } => {
            assert_eq!(path, storage_path_for(&media, None));
            assert!(source.to_string().contains("disk is full"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(derived.calls.lock().expect("lock should succeed").is_empty());

    cleanup(root).await;
}

#[tokio::test]
async fn copy_to_media_library_writes_into_sub_directory_without_trigger() {
    let disk = MemoryDisk::new();
    let derived = RecordingDerivedFiles::default();
    let store = store_with(&disk, &derived);
    let root = temp_root();
    let source = write_source(&root, "thumb.tmp", b"THUMB").await;

    let media = photo("sunset.png");
    let conversion = ConversionSpec::new("thumb").format("jpg");
    let stored = store
        .copy_to_media_library(&source, &media, CONVERSIONS_DIRECTORY, Some("thumb.jpg"))
        .await
        .expect("copy should succeed");

    assert_eq!(stored.path, storage_path_for(&media, Some(&conversion)));
    assert_eq!(disk.get(&stored.path).await, Some(Bytes::from_static(b"THUMB")));
    assert!(derived.calls.lock().expect("lock should succeed").is_empty());

    cleanup(root).await;
}

#[tokio::test]
async fn copy_from_media_library_round_trips_bytes() {
    let disk = MemoryDisk::new();
    let store = store_with(&disk, &RecordingDerivedFiles::default());
    let root = temp_root();
    let payload: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
    let source = write_source(&root, "big.bin", &payload).await;

    let media = photo("archive.bin");
    store
        .add(&source, &media, Some("archive.bin"))
        .await
        .expect("add should succeed");

    let target = root.join("copy.bin");
    let copied = store
        .copy_from_media_library(&media, &target)
        .await
        .expect("copy out should succeed");

    assert_eq!(copied, payload.len() as u64);
    assert_eq!(tokio::fs::read(&target).await.expect("read target"), payload);

    cleanup(root).await;
}

#[tokio::test]
async fn copy_from_media_library_appends_to_existing_target() {
    let disk = MemoryDisk::new();
    let store = store_with(&disk, &RecordingDerivedFiles::default());
    let root = temp_root();
    let source = write_source(&root, "part.txt", b"world").await;

    let media = photo("greeting.txt");
    store
        .add(&source, &media, Some("greeting.txt"))
        .await
        .expect("add should succeed");

    let target = root.join("out.txt");
    tokio::fs::write(&target, b"hello ").await.expect("seed target");
    store
        .copy_from_media_library(&media, &target)
        .await
        .expect("copy out should succeed");

    assert_eq!(tokio::fs::read(&target).await.expect("read target"), b"hello world");

    cleanup(root).await;
}

#[tokio::test]
async fn copy_from_missing_original_is_a_read_error() {
    let disk = MemoryDisk::new();
    let store = store_with(&disk, &RecordingDerivedFiles::default());
    let root = temp_root();
    tokio::fs::create_dir_all(&root).await.expect("create root");

    let err = store
        .copy_from_media_library(&photo("missing.png"), root.join("out.png"))
        .await
        .expect_err("missing original should fail");

    match err {
        MediaError::StorageRead { source, .. } => {
            assert!(matches!(source, StorageError::NotFound { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    cleanup(root).await;
}

#[tokio::test]
async fn remove_files_deletes_original_and_conversions_and_is_idempotent() {
    let disk = MemoryDisk::new();
    let store = store_with(&disk, &RecordingDerivedFiles::default());
    let root = temp_root();
    let source = write_source(&root, "a.png", b"A").await;

    let media = photo("sunset.png");
    let neighbour = MediaRecord::new(10, "memory", "App\\Models\\Post", "gallery", "sunset.png");
    store
        .add(&source, &media, Some("sunset.png"))
        .await
        .expect("add should succeed");
    store
        .copy_to_media_library(&source, &media, CONVERSIONS_DIRECTORY, Some("thumb.png"))
        .await
        .expect("conversion copy should succeed");
    store
        .add(&source, &neighbour, Some("sunset.png"))
        .await
        .expect("neighbour add should succeed");

    store.remove_files(&media).await.expect("first remove should succeed");
    store.remove_files(&media).await.expect("second remove should succeed");

    assert_eq!(disk.paths().await, vec![storage_path_for(&neighbour, None)]);

    cleanup(root).await;
}

#[tokio::test]
async fn rename_moves_the_original_to_the_current_name() {
    let disk = MemoryDisk::new();
    let store = store_with(&disk, &RecordingDerivedFiles::default());
    let root = temp_root();
    let source = write_source(&root, "a.jpg", b"JPEG").await;

    let before = photo("old.jpg");
    store
        .add(&source, &before, Some("old.jpg"))
        .await
        .expect("add should succeed");

    let after = before.with_file_name("new.jpg");
    store
        .rename_file(&after, "old.jpg")
        .await
        .expect("rename should succeed");

    assert_eq!(
        disk.get(&storage_path_for(&after, None)).await,
        Some(Bytes::from_static(b"JPEG"))
    );
    assert!(!disk.exists(&storage_path_for(&before, None)).await);

    cleanup(root).await;
}

#[tokio::test]
async fn rename_across_buckets_keeps_conversions_with_the_original() {
    let disk = MemoryDisk::new();
    let store = store_with(&disk, &RecordingDerivedFiles::default());
    let root = temp_root();
    let source = write_source(&root, "a.jpg", b"JPEG").await;

    let before = photo("old.jpg");
    let thumb = ConversionSpec::new("thumb").format("jpg");
    store
        .add(&source, &before, Some("old.jpg"))
        .await
        .expect("add should succeed");
    store
        .copy_to_media_library(&source, &before, CONVERSIONS_DIRECTORY, Some("thumb.jpg"))
        .await
        .expect("conversion copy should succeed");

    let after = before.with_file_name("new.jpg");
    assert_ne!(directory_for(&before), directory_for(&after));
    store
        .rename_file(&after, "old.jpg")
        .await
        .expect("rename should succeed");

    assert_eq!(
        disk.paths().await,
        vec![
            storage_path_for(&after, Some(&thumb)),
            storage_path_for(&after, None),
        ]
    );

    store.remove_files(&after).await.expect("remove should succeed");
    assert!(disk.is_empty().await);

    cleanup(root).await;
}

#[tokio::test]
async fn rename_of_missing_file_is_a_move_error() {
    let store = store_with(&MemoryDisk::new(), &RecordingDerivedFiles::default());

    let err = store
        .rename_file(&photo("new.jpg"), "old.jpg")
        .await
        .expect_err("rename should fail");

    assert!(matches!(err, MediaError::StorageMove { .. }));
}

#[tokio::test]
async fn ensure_media_directory_is_idempotent() {
    let disk = MemoryDisk::new();
    let store = store_with(&disk, &RecordingDerivedFiles::default());
    let media = photo("sunset.png");

    let first = store
        .ensure_media_directory(&media)
        .await
        .expect("first ensure should succeed");
    let second = store
        .ensure_media_directory(&media)
        .await
        .expect("second ensure should succeed");

    assert_eq!(first, second);
    assert_eq!(first, directory_for(&media));
    assert!(disk.directory_exists(&first).await);
}

#[tokio::test]
async fn unknown_disk_is_reported() {
    let store = store_with(&MemoryDisk::new(), &RecordingDerivedFiles::default());
    let media = MediaRecord::new(1, "s3", "User", "avatars", "a.png");

    let err = store.remove_files(&media).await.expect_err("disk is not registered");
    assert!(matches!(err, MediaError::UnknownDisk { ref disk } if disk == "s3"));
}

fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("mediashelf-test-{}", Uuid::new_v4()))
}

async fn write_source(root: &PathBuf, name: &str, body: &[u8]) -> PathBuf {
    tokio::fs::create_dir_all(root).await.expect("create root");
    let path = root.join(name);
    tokio::fs::write(&path, body).await.expect("write source");
    path
}

async fn cleanup(path: PathBuf) {
    let _ = tokio::fs::remove_dir_all(path).await;
}
