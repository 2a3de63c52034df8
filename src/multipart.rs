use std::io::Read;

#[cfg(feature = "tokio-io")]
use bytes::Bytes;
#[cfg(feature = "tokio-io")]
use futures_util::stream::{self, Stream, TryStreamExt};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::StreamReader;

use crate::buffer::StreamBuffer;
use crate::decoder::{Decoder, Progress};
use crate::event::{Event, PartHandler};
use crate::options::ParseOptions;

/// Decodes a `multipart/form-data` stream into [`Event`]s.
///
/// A parser is bound to one input and reads it in chunks of
/// [`buffer_size`](ParseOptions::buffer_size) bytes, never holding more than
/// one chunk plus a possible partial boundary, except for the header block
/// being parsed and parameter values, which are bounded by
/// [`max_header_size`](ParseOptions::max_header_size) and
/// [`parameter_size_limit`](ParseOptions::parameter_size_limit).
///
/// Events can be pulled one at a time with [`next_event`](Self::next_event),
/// or pushed into a [`PartHandler`] with [`run`](Self::run). Both have async
/// counterparts for [`AsyncRead`](tokio::io::AsyncRead) inputs.
///
/// # Examples
///
/// ```
/// use partwise::{Event, StreamingParser};
///
/// # fn run() -> partwise::Result<()> {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let mut parser = StreamingParser::new(data.as_bytes(), "X-BOUNDARY")?;
///
/// while let Some(event) = parser.next_event()? {
///     match event {
///         Event::Parameter(parameter) => println!("{}: {}", parameter.name(), parameter.value()),
///         Event::FileChunk(chunk) => println!("{}: {} bytes", chunk.file_name(), chunk.len()),
///     }
/// }
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
pub struct StreamingParser<R> {
    reader: R,
    buffer: StreamBuffer,
    decoder: Decoder,
}

impl<R> StreamingParser<R> {
    /// Constructs a parser with the default options for the given boundary.
    pub fn new<B: Into<String>>(reader: R, boundary: B) -> crate::Result<StreamingParser<R>> {
        StreamingParser::with_options(reader, ParseOptions::new(boundary))
    }

    /// Constructs a parser with the given options, failing if they are invalid.
    pub fn with_options(reader: R, options: ParseOptions) -> crate::Result<StreamingParser<R>> {
        let decoder = Decoder::new(options)?;
        let buffer = StreamBuffer::new(decoder.options().buffer_size);

        Ok(StreamingParser {
            reader,
            buffer,
            decoder,
        })
    }

    /// The options this parser was built with.
    pub fn options(&self) -> &ParseOptions {
        self.decoder.options()
    }

    /// Gives back the underlying reader. Bytes already read but not decoded are
    /// lost.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> StreamingParser<R> {
    /// Returns the next event, or `None` after the terminal boundary. Blocks
    /// on the reader whenever more bytes are needed.
    pub fn next_event(&mut self) -> crate::Result<Option<Event>> {
        loop {
            match self.decoder.poll(&mut self.buffer)? {
                Progress::Event(event) => return Ok(Some(event)),
                Progress::Done => return Ok(None),
                Progress::NeedMore => {
                    self.buffer.fill(&mut self.reader)?;
                }
            }
        }
    }

    /// Decodes the whole stream, handing every event to `handler` as soon as
    /// it is decoded.
    pub fn run<H: PartHandler>(mut self, mut handler: H) -> crate::Result<()> {
        while let Some(event) = self.next_event()? {
            handler.on_event(event)?;
        }
        Ok(())
    }
}

#[cfg(feature = "tokio-io")]
impl<R: AsyncRead + Unpin> StreamingParser<R> {
    /// Returns the next event, or `None` after the terminal boundary. Suspends
    /// on the reader whenever more bytes are needed, and nowhere else.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    pub async fn next_event_async(&mut self) -> crate::Result<Option<Event>> {
        loop {
            match self.decoder.poll(&mut self.buffer)? {
                Progress::Event(event) => return Ok(Some(event)),
                Progress::Done => return Ok(None),
                Progress::NeedMore => {
                    self.buffer.fill_async(&mut self.reader).await?;
                }
            }
        }
    }

    /// Decodes the whole stream, handing every event to `handler` as soon as
    /// it is decoded.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use partwise::{handler_fn, Event, StreamingParser};
    ///
    /// # async fn run() -> partwise::Result<()> {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"a.png\"\r\n\r\n\x01PNG\x02\r\n--X-BOUNDARY--\r\n";
    /// let parser = StreamingParser::new(data.as_bytes(), "X-BOUNDARY")?;
    ///
    /// let mut received = 0;
    /// parser
    ///     .run_async(handler_fn(|event| {
    ///         if let Event::FileChunk(chunk) = event {
    ///             received += chunk.len();
    ///         }
    ///         Ok(())
    ///     }))
    ///     .await?;
    ///
    /// assert_eq!(received, 5);
    /// # Ok(())
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run()).unwrap();
    /// ```
    pub async fn run_async<H: PartHandler>(mut self, mut handler: H) -> crate::Result<()> {
        while let Some(event) = self.next_event_async().await? {
            handler.on_event(event)?;
        }
        Ok(())
    }

    /// Turns the parser into a [`Stream`] of events.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    pub fn into_stream(self) -> impl Stream<Item = crate::Result<Event>> {
        stream::try_unfold(self, |mut parser| async move {
            let event = parser.next_event_async().await?;
            Ok::<_, crate::Error>(event.map(|event| (event, parser)))
        })
    }
}

/// Adapts a stream of byte chunks, such as an HTTP request body, into an
/// [`AsyncRead`] a [`StreamingParser`] can read from.
///
/// Stream errors surface as [`Error::StreamReadFailed`](crate::Error::StreamReadFailed).
///
/// # Optional
///
/// This requires the optional `tokio-io` feature to be enabled.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use futures_util::stream::once;
/// use partwise::{reader_from_stream, StreamingParser};
/// use std::convert::Infallible;
///
/// # async fn run() -> partwise::Result<()> {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
///
/// let mut parser = StreamingParser::new(reader_from_stream(stream), "X-BOUNDARY")?;
/// while let Some(event) = parser.next_event_async().await? {
///     println!("{:?}", event);
/// }
/// # Ok(())
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run()).unwrap();
/// ```
#[cfg(feature = "tokio-io")]
pub fn reader_from_stream<S, O, E>(stream: S) -> impl AsyncRead + Unpin
where
    S: Stream<Item = Result<O, E>>,
    O: Into<Bytes>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let stream = stream
        .map_ok(|chunk| -> Bytes { chunk.into() })
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err));

    StreamReader::new(Box::pin(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const DATA: &str = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    #[test]
    fn test_with_options_validates() {
        let options = ParseOptions::new("X-BOUNDARY").buffer_size(8);
        let err = StreamingParser::with_options(DATA.as_bytes(), options).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_next_event() {
        let mut parser = StreamingParser::new(DATA.as_bytes(), "X-BOUNDARY").unwrap();

        match parser.next_event().unwrap() {
            Some(Event::Parameter(parameter)) => {
                assert_eq!(parameter.name(), "My Field");
                assert_eq!(parameter.value(), "abcd");
                assert_eq!(parameter.content_type(), None);
                assert_eq!(parameter.content_disposition(), "form-data");
            }
            other => panic!("unexpected event {:?}", other),
        }

        match parser.next_event().unwrap() {
            Some(Event::FileChunk(chunk)) => {
                assert_eq!(chunk.name(), "File Field");
                assert_eq!(chunk.file_name(), "a-text-file.txt");
                assert_eq!(chunk.content_type(), "text/plain");
                assert_eq!(chunk.part_index(), 1);
                assert_eq!(chunk.chunk_index(), 0);
                assert_eq!(&chunk.bytes()[..], b"Hello world\nHello\r\nWorld\rAgain");
            }
            other => panic!("unexpected event {:?}", other),
        }

        assert!(parser.next_event().unwrap().is_none());
        assert!(parser.next_event().unwrap().is_none());
    }

    #[test]
    fn test_run_handler_error_aborts() {
        let parser = StreamingParser::new(DATA.as_bytes(), "X-BOUNDARY").unwrap();
        let mut calls = 0;

        let err = parser
            .run(crate::handler_fn(|_| {
                calls += 1;
                Err(crate::Error::handler("storage unavailable"))
            }))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Handler);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_run_through_borrowed_handler() {
        #[derive(Default)]
        struct EventCounter {
            events: usize,
        }

        impl PartHandler for EventCounter {
            fn on_event(&mut self, _event: Event) -> crate::Result<()> {
                self.events += 1;
                Ok(())
            }
        }

        let mut counter = EventCounter::default();
        StreamingParser::new(DATA.as_bytes(), "X-BOUNDARY")
            .unwrap()
            .run(&mut counter)
            .unwrap();

        assert_eq!(counter.events, 2);
    }

    #[cfg(feature = "tokio-io")]
    #[tokio::test]
    async fn test_into_stream() {
        let parser = StreamingParser::new(DATA.as_bytes(), "X-BOUNDARY").unwrap();
        let events: Vec<Event> = parser.into_stream().try_collect().await.unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::Parameter(p) if p.value() == "abcd"));
        assert!(matches!(&events[1], Event::FileChunk(c) if c.part_index() == 1));
    }
}
