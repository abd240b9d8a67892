use std::fmt;

use uuid::Uuid;

/// Stable identifier of a media record.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaId {
    /// Numeric identifier, typically a database row id.
    Int(u64),
    /// Textual identifier such as a UUID or ULID.
    Str(String),
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl From<u64> for MediaId {
    fn from(id: u64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for MediaId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_owned())
    }
}

impl From<String> for MediaId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

impl From<Uuid> for MediaId {
    fn from(id: Uuid) -> Self {
        Self::Str(id.to_string())
    }
}

/// Coarse classification used by derived-file generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Raster or vector image.
    Image,
    /// PDF document.
    Pdf,
    /// Anything else.
    Other,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "svg",
];

/// Media record owned by an external persistence layer.
///
/// The file store only reads records. Renaming produces a new snapshot through
/// [`MediaRecord::with_file_name`]; callers should persist it only after
/// [`MediaFileStore::rename_file`](crate::MediaFileStore::rename_file) succeeds.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRecord {
    /// Stable identifier, immutable once assigned.
    pub id: MediaId,
    /// Name of the disk holding the files.
    pub disk: String,
    /// Fully-qualified type name of the owning entity.
    pub model_type: String,
    /// Logical grouping label, for example `avatars`.
    pub collection_name: String,
    /// Stored base file name including extension.
    pub file_name: String,
    /// Mime type recorded at upload time, when known.
    #[cfg_attr(feature = "serde", serde(default, with = "mime_serde"))]
    pub mime_type: Option<mime::Mime>,
    /// Size of the original file in bytes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub size: u64,
}

impl MediaRecord {
    /// Creates a record with no mime type and zero size.
    pub fn new(
        id: impl Into<MediaId>,
        disk: impl Into<String>,
        model_type: impl Into<String>,
        collection_name: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            disk: disk.into(),
            model_type: model_type.into(),
            collection_name: collection_name.into(),
            file_name: file_name.into(),
            mime_type: None,
            size: 0,
        }
    }

    /// Sets the recorded mime type.
    pub fn with_mime_type(mut self, mime_type: mime::Mime) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    /// Sets the recorded size in bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Returns a snapshot of this record carrying `file_name`.
    pub fn with_file_name(&self, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..self.clone()
        }
    }

    /// Returns the extension of [`MediaRecord::file_name`], or `""`.
    pub fn extension(&self) -> &str {
        split_extension(&self.file_name).1
    }

    /// Returns the file name without its extension.
    pub fn file_stem(&self) -> &str {
        split_extension(&self.file_name).0
    }

    /// Classifies the record by mime type, falling back to the extension.
    pub fn kind(&self) -> MediaKind {
        if let Some(mime_type) = &self.mime_type {
            if mime_type.type_() == mime::IMAGE {
                return MediaKind::Image;
            }
            if mime_type.essence_str() == mime::APPLICATION_PDF.essence_str() {
                return MediaKind::Pdf;
            }
            return MediaKind::Other;
        }

        let extension = self.extension().to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            MediaKind::Image
        } else if extension == "pdf" {
            MediaKind::Pdf
        } else {
            MediaKind::Other
        }
    }
}

/// Splits a file name into `(stem, extension)` at the last dot.
///
/// `"archive.tar.gz"` gives `("archive.tar", "gz")`, `"README"` gives
/// `("README", "")` and `".env"` gives `("", "env")`.
pub(crate) fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) => (&file_name[..index], &file_name[index + 1..]),
        None => (file_name, ""),
    }
}

#[cfg(feature = "serde")]
mod mime_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Option<mime::Mime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(mime_type) => serializer.serialize_some(mime_type.essence_str()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<mime::Mime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|value| value.parse::<mime::Mime>().map_err(serde::de::Error::custom))
            .transpose()
    }
}
