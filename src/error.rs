use std::fmt::{self, Debug, Display, Formatter};

use derive_more::Display;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while configuring a parser or decoding a
/// multipart stream.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// The boundary is empty or contains a line break.
    #[display(fmt = "invalid multipart boundary: {:?}", boundary)]
    InvalidBoundary { boundary: String },

    /// The configured buffer cannot hold a complete delimiter.
    #[display(
        fmt = "buffer size {} is too small for the boundary, it must be at least {} bytes",
        buffer_size,
        required
    )]
    BufferTooSmall { buffer_size: usize, required: usize },

    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "Failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// The part's header block was not terminated within the size bound.
    #[display(fmt = "part headers exceeded the maximum size limit: {} bytes", limit)]
    HeadersTooLarge { limit: usize },

    /// Failed to read headers.
    #[display(fmt = "failed to read headers: {}", _0)]
    ReadHeaderFailed(httparse::Error),

    /// Failed to decode the part's raw header name to
    /// [`HeaderName`](http::header::HeaderName) type.
    #[display(fmt = "failed to decode part's raw header name: {:?} {}", name, cause)]
    DecodeHeaderName { name: String, cause: BoxError },

    /// The part has no `Content-Disposition` header.
    #[display(fmt = "part has no Content-Disposition header")]
    MissingContentDisposition,

    /// The part's `Content-Disposition` header has no `name` attribute.
    #[display(fmt = "part's Content-Disposition has no name attribute")]
    MissingFieldName,

    /// Multipart stream ended before the terminal boundary.
    #[display(fmt = "incomplete multipart stream")]
    IncompleteStream,

    /// The incoming parameter size exceeded the maximum limit.
    #[display(fmt = "field '{}' exceeded the maximum size limit: {} bytes", field_name, limit)]
    FieldSizeExceeded { limit: u64, field_name: String },

    /// Stream read failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(std::io::Error),

    /// A [`PartHandler`](crate::PartHandler) rejected an event.
    #[display(fmt = "part handler failed: {}", _0)]
    Handler(BoxError),

    /// Failed to decode the parameter value as `JSON` in
    /// [`parameter.json()`](crate::Parameter::json) method.
    #[cfg(feature = "json")]
    #[display(fmt = "failed to decode field data as JSON: {}", _0)]
    DecodeJson(serde_json::Error),
}

/// The broad category an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The parser was given unusable options. Raised at construction.
    Configuration,
    /// One part's headers are invalid. Skippable with
    /// [`ignore_invalid_parts`](crate::ParseOptions::ignore_invalid_parts).
    MalformedPart,
    /// The stream ended before the terminal boundary.
    UnexpectedEndOfStream,
    /// The underlying reader failed.
    Io,
    /// A configured size limit was exceeded.
    Limit,
    /// The event consumer returned an error.
    Handler,
    /// A finished value could not be decoded.
    Decode,
}

impl Error {
    /// Wraps an error raised by a [`PartHandler`](crate::PartHandler).
    pub fn handler<E: Into<BoxError>>(err: E) -> Error {
        Error::Handler(err.into())
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidBoundary { .. }
            | Error::BufferTooSmall { .. }
            | Error::NoMultipart
            | Error::DecodeContentType(_)
            | Error::NoBoundary => ErrorKind::Configuration,
            Error::HeadersTooLarge { .. }
            | Error::ReadHeaderFailed(_)
            | Error::DecodeHeaderName { .. }
            | Error::MissingContentDisposition
            | Error::MissingFieldName => ErrorKind::MalformedPart,
            Error::IncompleteStream => ErrorKind::UnexpectedEndOfStream,
            Error::StreamReadFailed(_) => ErrorKind::Io,
            Error::FieldSizeExceeded { .. } => ErrorKind::Limit,
            Error::Handler(_) => ErrorKind::Handler,
            #[cfg(feature = "json")]
            Error::DecodeJson(_) => ErrorKind::Decode,
        }
    }

    pub(crate) fn is_malformed_part(&self) -> bool {
        self.kind() == ErrorKind::MalformedPart
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::StreamReadFailed(err) => Some(err),
            Error::DecodeContentType(err) => Some(err),
            Error::ReadHeaderFailed(err) => Some(err),
            Error::Handler(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}
