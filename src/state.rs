use std::sync::Arc;

use bytes::BytesMut;

use crate::part::PartDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseStage {
    Preamble,
    PartHeaders,
    PartBody,
    SkippingPart,
    Terminal,
}

/// The part whose body is being decoded.
#[derive(Debug)]
pub(crate) enum CurrentPart {
    Parameter { part: PartDescriptor, value: BytesMut },
    File { part: Arc<PartDescriptor>, next_chunk: usize },
}
