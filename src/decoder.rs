use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};

use crate::boundary::{BoundaryKind, BoundaryMatcher, Match};
use crate::buffer::StreamBuffer;
use crate::event::{Event, FileChunk, Parameter};
use crate::headers::{self, HeaderBlock};
use crate::helpers;
use crate::options::ParseOptions;
use crate::part::{PartDescriptor, PartKind};
use crate::state::{CurrentPart, ParseStage};

#[derive(Debug)]
pub(crate) enum Progress {
    Event(Event),
    NeedMore,
    Done,
}

/// The multipart state machine. It never reads by itself: it decodes what the
/// [`StreamBuffer`] holds and asks for more when that is not enough, so the
/// blocking and the async entry points share it unchanged.
pub(crate) struct Decoder {
    options: ParseOptions,
    matcher: BoundaryMatcher,
    stage: ParseStage,
    part_index: usize,
    current: Option<CurrentPart>,
}

impl Decoder {
    pub fn new(options: ParseOptions) -> crate::Result<Self> {
        options.validate()?;

        let matcher = BoundaryMatcher::new(&options.boundary, options.buffer_size);

        Ok(Decoder {
            options,
            matcher,
            stage: ParseStage::Preamble,
            part_index: 0,
            current: None,
        })
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Decodes until an event is ready, the buffer runs dry, or the terminal
    /// boundary has been passed.
    pub fn poll(&mut self, buffer: &mut StreamBuffer) -> crate::Result<Progress> {
        loop {
            match self.stage {
                ParseStage::Preamble => match self.matcher.find(&buffer.buf) {
                    Match::Found { end, kind, .. } => {
                        buffer.buf.advance(end);
                        self.enter(kind);
                    }
                    Match::AmbiguousTail { offset } => {
                        buffer.buf.advance(offset);
                        return Self::need_more(buffer);
                    }
                    Match::NotFound => {
                        buffer.buf.clear();
                        return Self::need_more(buffer);
                    }
                },
                ParseStage::PartHeaders => match headers::parse_part_headers(&buffer.buf, &self.options) {
                    HeaderBlock::Complete { consumed, part } => {
                        buffer.buf.advance(consumed);
                        self.start_part(part);
                    }
                    HeaderBlock::Invalid { consumed, error } => {
                        buffer.buf.advance(consumed);
                        self.reject_part(error)?;
                    }
                    HeaderBlock::Partial => return Self::need_more(buffer),
                },
                ParseStage::PartBody | ParseStage::SkippingPart => match self.matcher.find(&buffer.buf) {
                    Match::Found { offset, end, kind } => {
                        let body = buffer.buf.split_to(offset).freeze();
                        buffer.buf.advance(end - offset);

                        let event = self.finish_part(body)?;
                        self.enter(kind);

                        if let Some(event) = event {
                            return Ok(Progress::Event(event));
                        }
                    }
                    partial => {
                        if buffer.eof {
                            return Err(crate::Error::IncompleteStream);
                        }

                        let body_len = match partial {
                            Match::AmbiguousTail { offset } => offset,
                            _ => buffer.buf.len(),
                        };
                        let body = buffer.buf.split_to(body_len).freeze();

                        return match self.push_body(body)? {
                            Some(event) => Ok(Progress::Event(event)),
                            None => Ok(Progress::NeedMore),
                        };
                    }
                },
                ParseStage::Terminal => {
                    // Epilogue.
                    buffer.buf.clear();
                    return Ok(Progress::Done);
                }
            }
        }
    }

    fn need_more(buffer: &StreamBuffer) -> crate::Result<Progress> {
        if buffer.eof {
            Err(crate::Error::IncompleteStream)
        } else {
            Ok(Progress::NeedMore)
        }
    }

    fn enter(&mut self, kind: BoundaryKind) {
        trace!("boundary found: {:?}", kind);

        self.stage = match kind {
            BoundaryKind::Intermediate => ParseStage::PartHeaders,
            BoundaryKind::Terminal => ParseStage::Terminal,
        };
    }

    fn start_part(&mut self, part: PartDescriptor) {
        let kind = PartKind::classify(&part, &self.options);

        debug!(
            "part {}: name={:?}, file_name={:?}, kind={:?}",
            self.part_index, part.name, part.file_name, kind
        );

        self.current = Some(match kind {
            PartKind::Parameter => CurrentPart::Parameter {
                part,
                value: BytesMut::new(),
            },
            PartKind::File => CurrentPart::File {
                part: Arc::new(part),
                next_chunk: 0,
            },
        });
        self.stage = ParseStage::PartBody;
    }

    fn reject_part(&mut self, error: crate::Error) -> crate::Result<()> {
        if !(self.options.ignore_invalid_parts && error.is_malformed_part()) {
            return Err(error);
        }

        warn!("skipping invalid part {}: {}", self.part_index, error);

        self.current = None;
        self.stage = ParseStage::SkippingPart;
        Ok(())
    }

    /// Handles body bytes of the current part that are followed by more data.
    fn push_body(&mut self, body: Bytes) -> crate::Result<Option<Event>> {
        let limit = self.options.parameter_size_limit;

        match &mut self.current {
            None => Ok(None),
            Some(CurrentPart::Parameter { part, value }) => {
                check_parameter_size(part, value.len() + body.len(), limit)?;
                value.extend_from_slice(&body);
                Ok(None)
            }
            Some(CurrentPart::File { .. }) if body.is_empty() => Ok(None),
            Some(CurrentPart::File { part, next_chunk }) => {
                let chunk = FileChunk {
                    part: Arc::clone(part),
                    part_index: self.part_index,
                    chunk_index: *next_chunk,
                    bytes: body,
                };
                *next_chunk += 1;
                Ok(Some(Event::FileChunk(chunk)))
            }
        }
    }

    /// Handles the last body bytes of the current part, right before a boundary.
    fn finish_part(&mut self, body: Bytes) -> crate::Result<Option<Event>> {
        let event = match self.current.take() {
            None => None,
            Some(CurrentPart::Parameter { part, mut value }) => {
                check_parameter_size(&part, value.len() + body.len(), self.options.parameter_size_limit)?;
                value.extend_from_slice(&body);

                let encoding = helpers::charset_or(part.content_type(), self.options.encoding);
                let value = helpers::decode_text(&value, encoding);

                Some(Event::Parameter(Parameter {
                    part,
                    index: self.part_index,
                    value,
                }))
            }
            // Already delivered everything, unless the file is empty.
            Some(CurrentPart::File { next_chunk, .. }) if body.is_empty() && next_chunk > 0 => None,
            Some(CurrentPart::File { part, next_chunk }) => Some(Event::FileChunk(FileChunk {
                part,
                part_index: self.part_index,
                chunk_index: next_chunk,
                bytes: body,
            })),
        };

        self.part_index += 1;
        Ok(event)
    }
}

fn check_parameter_size(part: &PartDescriptor, size: usize, limit: u64) -> crate::Result<()> {
    if size as u64 > limit {
        return Err(crate::Error::FieldSizeExceeded {
            limit,
            field_name: part.name.clone(),
        });
    }
    Ok(())
}
