/// Named derivation of an original media file, such as a thumbnail.
///
/// Only the name and the output extension matter for path layout; how the
/// derived file is produced belongs to the [`DerivedFiles`](crate::DerivedFiles)
/// collaborator.
pub trait Conversion {
    /// Conversion name, used as the derived file's stem.
    fn name(&self) -> &str;

    /// Extension of the derived file for a source with `source_extension`.
    fn result_extension(&self, source_extension: &str) -> String;
}

/// Plain conversion descriptor with an optional output format.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSpec {
    /// Conversion name.
    pub name: String,
    /// Output extension; `None` keeps the source extension.
    pub format: Option<String>,
}

impl ConversionSpec {
    /// Creates a conversion that keeps the source extension.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: None,
        }
    }

    /// Sets the output extension, for example `jpg`.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

impl Conversion for ConversionSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn result_extension(&self, source_extension: &str) -> String {
        match &self.format {
            Some(format) => format.trim_start_matches('.').to_owned(),
            None => source_extension.to_owned(),
        }
    }
}
