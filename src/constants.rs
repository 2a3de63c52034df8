pub(crate) const DEFAULT_BUFFER_SIZE: usize = 4096;
pub(crate) const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024;
pub(crate) const DEFAULT_PARAMETER_SIZE_LIMIT: u64 = u64::MAX;

pub(crate) const MAX_HEADERS: usize = 32;
pub(crate) const BOUNDARY_EXT: &[u8] = b"--";
pub(crate) const CRLF: &[u8] = b"\r\n";

/// Content type assumed for file parts that do not declare one (RFC 7578, section 4.4).
pub(crate) const DEFAULT_FILE_CONTENT_TYPE: &str = "text/plain";

/// Bytes a delimiter needs on top of the boundary itself: the leading `--` and
/// the two-byte `--` or CRLF suffix.
pub(crate) const DELIMITER_OVERHEAD: usize = 4;
