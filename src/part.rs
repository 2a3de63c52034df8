use crate::options::ParseOptions;

/// The metadata of one part, parsed from its header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescriptor {
    pub(crate) name: String,
    pub(crate) file_name: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) content_disposition: String,
    pub(crate) additional_properties: Vec<(String, String)>,
}

impl PartDescriptor {
    /// The `name` attribute of the `Content-Disposition` header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `filename` attribute of the `Content-Disposition` header.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The `Content-Type` header, verbatim.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The disposition type, `form-data` for well-formed clients.
    pub fn content_disposition(&self) -> &str {
        &self.content_disposition
    }

    /// Every header other than `Content-Disposition` and `Content-Type`, and
    /// every `Content-Disposition` parameter other than `name` and `filename`,
    /// in the order they appeared.
    pub fn additional_properties(&self) -> &[(String, String)] {
        &self.additional_properties
    }

    /// Looks up one of the [`additional_properties`](Self::additional_properties).
    pub fn additional_property(&self, key: &str) -> Option<&str> {
        self.additional_properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn insert_property(&mut self, key: String, value: String) {
        match self.additional_properties.iter_mut().find(|(name, _)| *name == key) {
            Some(entry) => entry.1 = value,
            None => self.additional_properties.push((key, value)),
        }
    }
}

/// How a part's body is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// Buffered and delivered whole as decoded text.
    Parameter,
    /// Streamed as raw chunks.
    File,
}

impl PartKind {
    /// A part with a `filename` is a file whatever its content type. Otherwise
    /// it is a file only when its content type is one of the configured binary
    /// types.
    pub(crate) fn classify(descriptor: &PartDescriptor, options: &ParseOptions) -> PartKind {
        if descriptor.file_name.is_some() {
            return PartKind::File;
        }

        match descriptor.content_type.as_deref() {
            Some(content_type) if options.is_binary_mime_type(content_type) => PartKind::File,
            _ => PartKind::Parameter,
        }
    }
}
