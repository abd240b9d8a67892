//! Deterministic storage layout for media records.
//!
//! Every path produced here is relative to a disk root and joined with `/`.
//! A media directory has the shape
//!
//! ```text
//! {model}/{collection}/{b1}/{b2}/{b3}/{id}
//! ```
//!
//! where `model` is the lower-cased last segment of the owner type name,
//! `collection` the lower-cased collection name and `b1..b3` the first three
//! 3-byte chunks of the file stem. Empty segments are skipped. Originals live
//! directly in that directory, conversions under `conversions/`.
//!
//! These functions are pure: the same record always maps to the same path, so
//! URL builders can resolve locations without touching a storage backend.

use std::path::Path;

use md5::{Digest, Md5};

use crate::{
    conversion::Conversion,
    media::{split_extension, MediaRecord},
};

/// Name of the sub-directory holding conversions of an original.
pub const CONVERSIONS_DIRECTORY: &str = "conversions";

/// Separator used by every path in this module, on all platforms.
pub const SEPARATOR: &str = "/";

const BUCKET_WIDTH: usize = 3;
const BUCKET_DEPTH: usize = 3;

/// Returns the directory holding every file of `media`.
pub fn directory_for(media: &MediaRecord) -> String {
    let model = model_basename(&media.model_type).to_lowercase();
    let collection = media.collection_name.to_lowercase();
    let buckets = bucket_path(media.file_stem());
    let id = media.id.to_string();

    join_segments([
        model.as_str(),
        collection.as_str(),
        buckets.as_str(),
        id.as_str(),
    ])
}

/// Returns the conversions directory of `media`.
pub fn conversion_directory_for(media: &MediaRecord) -> String {
    join_segments([directory_for(media).as_str(), CONVERSIONS_DIRECTORY])
}

/// Returns the path of the original file, or of `conversion` when given.
///
/// Without a conversion this is exactly where
/// [`MediaFileStore::add`](crate::MediaFileStore::add) stored the original.
pub fn storage_path_for(media: &MediaRecord, conversion: Option<&dyn Conversion>) -> String {
    match conversion {
        None => join_segments([directory_for(media).as_str(), media.file_name.as_str()]),
        Some(conversion) => {
            let file_name = format!(
                "{}.{}",
                conversion.name(),
                conversion.result_extension(media.extension())
            );
            join_segments([
                conversion_directory_for(media).as_str(),
                file_name.as_str(),
            ])
        }
    }
}

/// Returns the path used to build a public URL for `media`.
///
/// Alias of [`storage_path_for`]; kept separate so URL builders depend on the
/// layout contract only.
pub fn path_relative_to_root(media: &MediaRecord, conversion: Option<&dyn Conversion>) -> String {
    storage_path_for(media, conversion)
}

/// Renders the stored name for an upload read from `source`.
///
/// The name is the hex MD5 of the source path string followed by the source
/// extension. File contents are not hashed: the same bytes uploaded from two
/// paths get two names, and two uploads from the same temporary path get the
/// same name. The latter is harmless because the media directory ends with the
/// record id.
pub fn render_file_name(source: impl AsRef<Path>) -> String {
    let source = source.as_ref();
    let digest = hex::encode(Md5::digest(source.to_string_lossy().as_bytes()));

    let extension = source
        .file_name()
        .map(|name| name.to_string_lossy())
        .map(|name| split_extension(&name).1.to_owned())
        .unwrap_or_default();

    if extension.is_empty() {
        digest
    } else {
        format!("{digest}.{extension}")
    }
}

/// Splits `stem` into at most three leading 3-byte chunks joined by `/`.
///
/// A cut that would land inside a multi-byte character moves forward to the
/// next character boundary.
pub fn bucket_path(stem: &str) -> String {
    let mut chunks = Vec::with_capacity(BUCKET_DEPTH);
    let mut rest = stem;

    while !rest.is_empty() && chunks.len() < BUCKET_DEPTH {
        let mut cut = BUCKET_WIDTH.min(rest.len());
        while !rest.is_char_boundary(cut) {
            cut += 1;
        }
        let (chunk, tail) = rest.split_at(cut);
        chunks.push(chunk);
        rest = tail;
    }

    chunks.join(SEPARATOR)
}

/// Joins non-empty segments with [`SEPARATOR`].
pub(crate) fn join_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

// `App\Models\User`, `app::models::User` and `models/User` all give `User`.
fn model_basename(model_type: &str) -> &str {
    model_type
        .rsplit(['\\', '/', ':'])
        .next()
        .unwrap_or(model_type)
}
