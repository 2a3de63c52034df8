//! An event-based, streaming parser for `multipart/form-data` bodies in Rust.
//!
//! It reads the body in fixed-size chunks, finds boundaries even when they are
//! split across reads, and hands body bytes to the consumer as soon as they are
//! decoded. Form fields arrive whole as [`Parameter`]s. File uploads arrive as
//! a sequence of [`FileChunk`]s, so a file of any size is decoded in bounded
//! memory.
//!
//! A part is a file when its `Content-Disposition` carries a `filename`, or when
//! its `Content-Type` is one of the
//! [`binary_mime_types`](ParseOptions::binary_mime_types).
//!
//! # Examples
//!
//! ```
//! use partwise::{Event, ParseOptions, StreamingParser};
//!
//! # fn run() -> partwise::Result<()> {
//! let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_file_field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\r\n--X-BOUNDARY--\r\n";
//! let options = ParseOptions::from_content_type("multipart/form-data; boundary=X-BOUNDARY")?;
//! let mut parser = StreamingParser::with_options(data.as_bytes(), options)?;
//!
//! while let Some(event) = parser.next_event()? {
//!     match event {
//!         Event::Parameter(parameter) => {
//!             println!("Field: {} = {}", parameter.name(), parameter.value());
//!         }
//!         Event::FileChunk(chunk) => {
//!             if chunk.is_first() {
//!                 println!("File: {} ({})", chunk.file_name(), chunk.content_type());
//!             }
//!             println!("  {} bytes", chunk.len());
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! ## Optional features
//!
//! - `tokio-io` (default): async entry points for `tokio::io::AsyncRead`
//!   inputs and [`reader_from_stream`] for byte streams.
//! - `json`: [`Parameter::json`].
//! - `log`: logs parsing progress through the `log` crate.

#![forbid(unsafe_code)]

#[cfg(feature = "log")]
macro_rules! trace {
    ($($t:tt)*) => (::log::trace!($($t)*););
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($t:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($t:tt)*) => (::log::debug!($($t)*););
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($t:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! warn {
    ($($t:tt)*) => (::log::warn!($($t)*););
}

#[cfg(not(feature = "log"))]
macro_rules! warn {
    ($($t:tt)*) => {};
}

pub use bytes;
pub use encoding_rs;
pub use error::{Error, ErrorKind};
pub use event::{handler_fn, Event, FileChunk, HandlerFn, Parameter, PartHandler};
#[cfg(feature = "tokio-io")]
pub use multipart::reader_from_stream;
pub use multipart::StreamingParser;
pub use options::ParseOptions;
pub use part::{PartDescriptor, PartKind};

mod boundary;
mod buffer;
mod constants;
mod content_disposition;
mod decoder;
mod error;
mod event;
mod headers;
mod helpers;
mod multipart;
mod options;
mod part;
mod state;

/// A Result type often returned from methods that can have `partwise` errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// # Examples
///
/// ```
/// # fn run() {
/// let content_type = "multipart/form-data; boundary=ABCDEFG";
///
/// assert_eq!(partwise::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// # }
/// # run();
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(Error::NoBoundary)
}
