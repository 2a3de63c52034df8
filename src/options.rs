use std::collections::HashSet;

use encoding_rs::{Encoding, UTF_8};

use crate::constants;
use crate::helpers;

/// Represents the configuration of a single multipart parse.
///
/// The options are validated once, when a [`StreamingParser`](crate::StreamingParser)
/// is constructed, and are immutable for the duration of the parse.
///
/// # Examples
///
/// ```
/// use partwise::ParseOptions;
///
/// let options = ParseOptions::new("X-BOUNDARY")
///     .buffer_size(16 * 1024)
///     .binary_mime_types(vec!["application/octet-stream", "image/png"])
///     .ignore_invalid_parts(true);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub(crate) boundary: String,
    pub(crate) encoding: &'static Encoding,
    pub(crate) buffer_size: usize,
    pub(crate) binary_mime_types: HashSet<String>,
    pub(crate) ignore_invalid_parts: bool,
    pub(crate) max_header_size: usize,
    pub(crate) parameter_size_limit: u64,
}

impl ParseOptions {
    /// Creates the default options for the given boundary.
    pub fn new<B: Into<String>>(boundary: B) -> ParseOptions {
        ParseOptions {
            boundary: boundary.into(),
            encoding: UTF_8,
            buffer_size: constants::DEFAULT_BUFFER_SIZE,
            binary_mime_types: HashSet::new(),
            ignore_invalid_parts: false,
            max_header_size: constants::DEFAULT_MAX_HEADER_SIZE,
            parameter_size_limit: constants::DEFAULT_PARAMETER_SIZE_LIMIT,
        }
    }

    /// Creates the default options with the boundary taken from a
    /// `multipart/form-data` `Content-Type` header value.
    pub fn from_content_type<T: AsRef<str>>(content_type: T) -> crate::Result<ParseOptions> {
        crate::parse_boundary(content_type).map(ParseOptions::new)
    }

    /// Sets the encoding used to decode header values and parameter values.
    ///
    /// A parameter that declares its own `charset` is decoded with that
    /// charset instead. File bodies are never decoded.
    pub fn encoding(mut self, encoding: &'static Encoding) -> ParseOptions {
        self.encoding = encoding;
        self
    }

    /// Sets how many bytes are read from the underlying stream per read.
    pub fn buffer_size(mut self, size: usize) -> ParseOptions {
        self.buffer_size = size;
        self
    }

    /// Adds content types that force a part to be treated as a file even when
    /// it carries no `filename` attribute.
    pub fn binary_mime_types<I, T>(mut self, mime_types: I) -> ParseOptions
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.binary_mime_types.extend(
            mime_types
                .into_iter()
                .map(|mime_type| helpers::mime_essence(mime_type.as_ref())),
        );
        self
    }

    /// Skips parts with invalid headers instead of failing the whole parse.
    pub fn ignore_invalid_parts(mut self, ignore: bool) -> ParseOptions {
        self.ignore_invalid_parts = ignore;
        self
    }

    /// Sets the maximum size of one part's header block.
    pub fn max_header_size(mut self, size: usize) -> ParseOptions {
        self.max_header_size = size;
        self
    }

    /// Sets the maximum size of a parameter value, which is buffered in memory
    /// until its part ends.
    pub fn parameter_size_limit(mut self, limit: u64) -> ParseOptions {
        self.parameter_size_limit = limit;
        self
    }

    /// Returns the boundary.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub(crate) fn is_binary_mime_type(&self, content_type: &str) -> bool {
        !self.binary_mime_types.is_empty() && self.binary_mime_types.contains(&helpers::mime_essence(content_type))
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.boundary.is_empty() || self.boundary.bytes().any(|b| b == b'\r' || b == b'\n') {
            return Err(crate::Error::InvalidBoundary {
                boundary: self.boundary.clone(),
            });
        }

        let required = self.boundary.len() + constants::DELIMITER_OVERHEAD + constants::CRLF.len() + 1;
        if self.buffer_size < required {
            return Err(crate::Error::BufferTooSmall {
                buffer_size: self.buffer_size,
                required,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_validate_buffer_size() {
        // "XYZ" needs 3 + 4 + 2 = 9 bytes, the buffer must exceed that.
        let options = ParseOptions::new("XYZ").buffer_size(9);
        assert_eq!(
            options.validate(),
            Err(crate::Error::BufferTooSmall {
                buffer_size: 9,
                required: 10
            })
        );

        assert!(ParseOptions::new("XYZ").buffer_size(10).validate().is_ok());
        assert!(ParseOptions::new("XYZ").validate().is_ok());
    }

    #[test]
    fn test_validate_boundary() {
        let err = ParseOptions::new("").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = ParseOptions::new("AB\r\nCD").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_binary_mime_types() {
        let options = ParseOptions::new("XYZ").binary_mime_types(vec!["Application/Octet-Stream", "image/png"]);

        assert!(options.is_binary_mime_type("application/octet-stream"));
        assert!(options.is_binary_mime_type("IMAGE/PNG; name=a.png"));
        assert!(!options.is_binary_mime_type("text/plain"));
        assert!(!ParseOptions::new("XYZ").is_binary_mime_type("image/png"));
    }

    #[test]
    fn test_from_content_type() {
        let options = ParseOptions::from_content_type("multipart/form-data; boundary=ABCDEFG").unwrap();
        assert_eq!(options.boundary(), "ABCDEFG");

        assert_eq!(
            ParseOptions::from_content_type("text/plain").unwrap_err(),
            crate::Error::NoMultipart
        );
    }
}
