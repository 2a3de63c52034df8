use memchr::memmem::Finder;

use crate::constants;

/// Whether a delimiter ends one part and starts another, or ends the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryKind {
    Intermediate,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Match {
    /// A complete delimiter starts at `offset`, the bytes up to `end` (exclusive)
    /// belong to it, including its trailing `--` or CRLF.
    Found {
        offset: usize,
        end: usize,
        kind: BoundaryKind,
    },
    /// The window ends inside what may be a delimiter starting at `offset`.
    /// Everything before `offset` is body data.
    AmbiguousTail { offset: usize },
    /// The whole window is body data.
    NotFound,
}

enum Suffix {
    Terminal,
    Intermediate(usize),
    Incomplete,
    Mismatch,
}

/// Finds `CRLF--boundary` delimiters in a byte window.
pub(crate) struct BoundaryMatcher {
    delimiter: Vec<u8>,
    finder: Finder<'static>,
    max_padding: usize,
}

impl BoundaryMatcher {
    /// A delimiter plus its padding and CRLF must fit in `buffer_size` bytes,
    /// longer padding runs are body data.
    pub fn new(boundary: &str, buffer_size: usize) -> Self {
        let mut delimiter = Vec::with_capacity(boundary.len() + constants::DELIMITER_OVERHEAD);
        delimiter.extend_from_slice(constants::CRLF);
        delimiter.extend_from_slice(constants::BOUNDARY_EXT);
        delimiter.extend_from_slice(boundary.as_bytes());

        let finder = Finder::new(&delimiter).into_owned();
        let max_padding = buffer_size.saturating_sub(delimiter.len() + constants::CRLF.len());

        BoundaryMatcher {
            delimiter,
            finder,
            max_padding,
        }
    }

    pub fn find(&self, window: &[u8]) -> Match {
        let mut from = 0;

        while let Some(idx) = self.finder.find(&window[from..]) {
            let offset = from + idx;
            let suffix_start = offset + self.delimiter.len();

            match self.suffix(&window[suffix_start..]) {
                Suffix::Terminal => {
                    return Match::Found {
                        offset,
                        end: suffix_start + constants::BOUNDARY_EXT.len(),
                        kind: BoundaryKind::Terminal,
                    };
                }
                Suffix::Intermediate(len) => {
                    return Match::Found {
                        offset,
                        end: suffix_start + len,
                        kind: BoundaryKind::Intermediate,
                    };
                }
                Suffix::Incomplete => return Match::AmbiguousTail { offset },
                // `CRLF--boundary` followed by anything else is body data.
                Suffix::Mismatch => from = offset + 1,
            }
        }

        match self.partial_tail(window, from) {
            Some(offset) => Match::AmbiguousTail { offset },
            None => Match::NotFound,
        }
    }

    /// Classifies the bytes right after a delimiter. Linear whitespace before
    /// the CRLF is transport padding (RFC 2046, section 5.1.1).
    fn suffix(&self, rest: &[u8]) -> Suffix {
        if rest.starts_with(constants::BOUNDARY_EXT) {
            return Suffix::Terminal;
        }
        if rest == b"-" {
            return Suffix::Incomplete;
        }

        let padding = rest
            .iter()
            .take(self.max_padding.saturating_add(1))
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count();
        if padding > self.max_padding {
            return Suffix::Mismatch;
        }
        let rest = &rest[padding..];

        if rest.starts_with(constants::CRLF) {
            Suffix::Intermediate(padding + constants::CRLF.len())
        } else if rest.is_empty() || rest == b"\r" {
            Suffix::Incomplete
        } else {
            Suffix::Mismatch
        }
    }

    /// Returns the first position at or after `from` where the rest of the
    /// window is a proper prefix of the delimiter.
    fn partial_tail(&self, window: &[u8], from: usize) -> Option<usize> {
        let start = window.len().saturating_sub(self.delimiter.len() - 1).max(from);

        memchr::memchr_iter(b'\r', &window[start..])
            .map(|idx| start + idx)
            .find(|&idx| self.delimiter.starts_with(&window[idx..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_intermediate() {
        let matcher = BoundaryMatcher::new("XYZ", 64);
        let window = b"hello\r\n--XYZ\r\nContent-Disposition";

        assert_eq!(
            matcher.find(window),
            Match::Found {
                offset: 5,
                end: 14,
                kind: BoundaryKind::Intermediate
            }
        );
    }

    #[test]
    fn test_find_terminal() {
        let matcher = BoundaryMatcher::new("XYZ", 64);

        assert_eq!(
            matcher.find(b"hello\r\n--XYZ--\r\n"),
            Match::Found {
                offset: 5,
                end: 14,
                kind: BoundaryKind::Terminal
            }
        );
        assert_eq!(
            matcher.find(b"\r\n--XYZ--"),
            Match::Found {
                offset: 0,
                end: 9,
                kind: BoundaryKind::Terminal
            }
        );
    }

    #[test]
    fn test_find_transport_padding() {
        let matcher = BoundaryMatcher::new("XYZ", 64);

        assert_eq!(
            matcher.find(b"a\r\n--XYZ \t \r\nnext"),
            Match::Found {
                offset: 1,
                end: 13,
                kind: BoundaryKind::Intermediate
            }
        );
        assert_eq!(matcher.find(b"a\r\n--XYZ  "), Match::AmbiguousTail { offset: 1 });
    }

    #[test]
    fn test_padding_is_bounded() {
        // 16 bytes leave room for 7 bytes of padding after `\r\n--XYZ`.
        let matcher = BoundaryMatcher::new("XYZ", 16);

        assert_eq!(matcher.find(b"a\r\n--XYZ       "), Match::AmbiguousTail { offset: 1 });
        assert_eq!(
            matcher.find(b"a\r\n--XYZ       \r\n"),
            Match::Found {
                offset: 1,
                end: 17,
                kind: BoundaryKind::Intermediate
            }
        );
        assert_eq!(matcher.find(b"a\r\n--XYZ        "), Match::NotFound);
        assert_eq!(matcher.find(b"a\r\n--XYZ        \r\nx"), Match::NotFound);
    }

    #[test]
    fn test_find_ambiguous_tail() {
        let matcher = BoundaryMatcher::new("XYZ", 64);

        assert_eq!(matcher.find(b"hello\r"), Match::AmbiguousTail { offset: 5 });
        assert_eq!(matcher.find(b"hello\r\n-"), Match::AmbiguousTail { offset: 5 });
        assert_eq!(matcher.find(b"hello\r\n--XY"), Match::AmbiguousTail { offset: 5 });
        // The delimiter is complete but its suffix has not arrived.
        assert_eq!(matcher.find(b"hello\r\n--XYZ"), Match::AmbiguousTail { offset: 5 });
        assert_eq!(matcher.find(b"hello\r\n--XYZ-"), Match::AmbiguousTail { offset: 5 });
        assert_eq!(matcher.find(b"hello\r\n--XYZ\r"), Match::AmbiguousTail { offset: 5 });
    }

    #[test]
    fn test_find_not_found() {
        let matcher = BoundaryMatcher::new("XYZ", 64);

        assert_eq!(matcher.find(b""), Match::NotFound);
        assert_eq!(matcher.find(b"hello world"), Match::NotFound);
        assert_eq!(matcher.find(b"a\rb\r\nc"), Match::NotFound);
        assert_eq!(matcher.find(b"\r\n--XYW"), Match::NotFound);
    }

    #[test]
    fn test_find_skips_lookalike() {
        let matcher = BoundaryMatcher::new("XYZ", 64);
        let window = b"\r\n--XYZabc\r\n--XYZ\r\n";

        assert_eq!(
            matcher.find(window),
            Match::Found {
                offset: 10,
                end: 19,
                kind: BoundaryKind::Intermediate
            }
        );
        assert_eq!(matcher.find(b"\r\n--XYZab"), Match::NotFound);
    }

    #[test]
    fn test_find_binary_window() {
        let matcher = BoundaryMatcher::new("XYZ", 64);
        let mut window: Vec<u8> = (0..=255).collect();
        window.extend_from_slice(b"\r\n--XYZ--");

        assert_eq!(
            matcher.find(&window),
            Match::Found {
                offset: 256,
                end: 265,
                kind: BoundaryKind::Terminal
            }
        );
    }
}
