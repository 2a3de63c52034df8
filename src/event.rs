use std::sync::Arc;

use bytes::Bytes;
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;

use crate::constants;
use crate::part::PartDescriptor;

/// One unit of decoded output.
#[derive(Debug, Clone)]
pub enum Event {
    /// A complete, decoded form field.
    Parameter(Parameter),
    /// A slice of a file part's body.
    FileChunk(FileChunk),
}

/// A form field whose whole value has been read and decoded.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub(crate) part: PartDescriptor,
    pub(crate) index: usize,
    pub(crate) value: String,
}

impl Parameter {
    /// The field name.
    pub fn name(&self) -> &str {
        self.part.name()
    }

    /// The decoded field value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Takes the decoded field value.
    pub fn into_value(self) -> String {
        self.value
    }

    /// The `Content-Type` header, if the part had one.
    pub fn content_type(&self) -> Option<&str> {
        self.part.content_type()
    }

    /// The disposition type.
    pub fn content_disposition(&self) -> &str {
        self.part.content_disposition()
    }

    /// See [`PartDescriptor::additional_properties`].
    pub fn additional_properties(&self) -> &[(String, String)] {
        self.part.additional_properties()
    }

    /// Position of the part in the stream, counting from 0.
    pub fn part_index(&self) -> usize {
        self.index
    }

    /// The part's header metadata.
    pub fn descriptor(&self) -> &PartDescriptor {
        &self.part
    }

    /// Deserializes the value as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_str(&self.value).map_err(crate::Error::DecodeJson)
    }
}

/// A slice of a file part's body, delivered as soon as it is known not to be
/// part of a boundary.
///
/// All chunks of one part share a [`part_index`](Self::part_index). The first
/// chunk has a [`chunk_index`](Self::chunk_index) of 0, so a consumer creates
/// its destination on that chunk and appends on the following ones. A file
/// with an empty body still produces one empty first chunk.
#[derive(Debug, Clone)]
pub struct FileChunk {
    pub(crate) part: Arc<PartDescriptor>,
    pub(crate) part_index: usize,
    pub(crate) chunk_index: usize,
    pub(crate) bytes: Bytes,
}

impl FileChunk {
    /// The field name.
    pub fn name(&self) -> &str {
        self.part.name()
    }

    /// The `filename` attribute, or an empty string for parts that were
    /// classified as files by their content type alone.
    pub fn file_name(&self) -> &str {
        self.part.file_name().unwrap_or_default()
    }

    /// The `Content-Type` header, `text/plain` when the part has none.
    pub fn content_type(&self) -> &str {
        self.part
            .content_type()
            .unwrap_or(constants::DEFAULT_FILE_CONTENT_TYPE)
    }

    /// The disposition type.
    pub fn content_disposition(&self) -> &str {
        self.part.content_disposition()
    }

    /// See [`PartDescriptor::additional_properties`].
    pub fn additional_properties(&self) -> &[(String, String)] {
        self.part.additional_properties()
    }

    /// The raw body bytes of this chunk.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Takes the raw body bytes of this chunk.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Number of body bytes in this chunk.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this chunk carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Position of the part in the stream, counting from 0.
    pub fn part_index(&self) -> usize {
        self.part_index
    }

    /// Position of this chunk within its part, counting from 0.
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    /// Whether this is the first chunk of its part.
    pub fn is_first(&self) -> bool {
        self.chunk_index == 0
    }

    /// The part's header metadata.
    pub fn descriptor(&self) -> &PartDescriptor {
        &self.part
    }
}

/// Receives events from [`StreamingParser::run`](crate::StreamingParser::run)
/// and [`StreamingParser::run_async`](crate::StreamingParser::run_async).
///
/// Handlers are called inline with decoding, so a slow handler slows the
/// reads down with it. Returning an error aborts the parse with that error.
pub trait PartHandler {
    /// Called once per parameter part, after its whole value has been read.
    fn on_parameter(&mut self, parameter: Parameter) -> crate::Result<()> {
        let _ = parameter;
        Ok(())
    }

    /// Called for every chunk of every file part, in stream order.
    fn on_file_chunk(&mut self, chunk: FileChunk) -> crate::Result<()> {
        let _ = chunk;
        Ok(())
    }

    /// Routes an event to the matching callback.
    fn on_event(&mut self, event: Event) -> crate::Result<()> {
        match event {
            Event::Parameter(parameter) => self.on_parameter(parameter),
            Event::FileChunk(chunk) => self.on_file_chunk(chunk),
        }
    }
}

impl<H: PartHandler + ?Sized> PartHandler for &mut H {
    fn on_parameter(&mut self, parameter: Parameter) -> crate::Result<()> {
        (**self).on_parameter(parameter)
    }

    fn on_file_chunk(&mut self, chunk: FileChunk) -> crate::Result<()> {
        (**self).on_file_chunk(chunk)
    }

    fn on_event(&mut self, event: Event) -> crate::Result<()> {
        (**self).on_event(event)
    }
}

/// A [`PartHandler`] built from a closure, see [`handler_fn`].
#[derive(Debug, Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps a closure receiving every [`Event`] into a [`PartHandler`].
///
/// # Examples
///
/// ```
/// use partwise::{handler_fn, Event, StreamingParser};
///
/// # fn run() -> partwise::Result<()> {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let parser = StreamingParser::new(data.as_bytes(), "X-BOUNDARY")?;
///
/// parser.run(handler_fn(|event| {
///     if let Event::Parameter(parameter) = event {
///         println!("{} = {}", parameter.name(), parameter.value());
///     }
///     Ok(())
/// }))
/// # }
/// # run().unwrap();
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: FnMut(Event) -> crate::Result<()>,
{
    HandlerFn { f }
}

impl<F> PartHandler for HandlerFn<F>
where
    F: FnMut(Event) -> crate::Result<()>,
{
    fn on_parameter(&mut self, parameter: Parameter) -> crate::Result<()> {
        (self.f)(Event::Parameter(parameter))
    }

    fn on_file_chunk(&mut self, chunk: FileChunk) -> crate::Result<()> {
        (self.f)(Event::FileChunk(chunk))
    }
}
