use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::{conversion::Conversion, layout, media::MediaRecord};

// Reserved in a path segment, plus space and `%` itself.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

/// Builds public URLs for media stored under a common base URL.
///
/// Only the layout is consulted; no backend is touched and nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlGenerator {
    base_url: String,
}

impl UrlGenerator {
    /// Creates a generator for files served below `base_url`, e.g. `/media`
    /// or `https://cdn.example.com/media`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Returns the configured base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the URL of the original, or of `conversion` when given.
    pub fn url_for(&self, media: &MediaRecord, conversion: Option<&dyn Conversion>) -> String {
        let path = layout::path_relative_to_root(media, conversion);
        let encoded = path
            .split(layout::SEPARATOR)
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join(layout::SEPARATOR);

        format!("{}/{encoded}", self.base_url)
    }
}
