use std::convert::TryFrom;

use http::header::{self, HeaderName};

use crate::constants;
use crate::content_disposition::ContentDisposition;
use crate::helpers;
use crate::options::ParseOptions;
use crate::part::PartDescriptor;

/// Outcome of parsing the header block at the front of a window.
#[derive(Debug)]
pub(crate) enum HeaderBlock {
    /// The block ends at `consumed`, the body starts right after.
    Complete { consumed: usize, part: PartDescriptor },
    /// The part is unusable. `consumed` is where its header block ends, or 0
    /// when the end could not be determined.
    Invalid { consumed: usize, error: crate::Error },
    /// The blank line ending the block has not been read yet.
    Partial,
}

pub(crate) fn parse_part_headers(window: &[u8], options: &ParseOptions) -> HeaderBlock {
    let mut headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

    match httparse::parse_headers(window, &mut headers) {
        Ok(httparse::Status::Complete((consumed, _))) if consumed > options.max_header_size => HeaderBlock::Invalid {
            consumed,
            error: crate::Error::HeadersTooLarge {
                limit: options.max_header_size,
            },
        },
        Ok(httparse::Status::Complete((consumed, raw_headers))) => match build_descriptor(raw_headers, options) {
            Ok(part) => HeaderBlock::Complete { consumed, part },
            Err(error) => HeaderBlock::Invalid { consumed, error },
        },
        Ok(httparse::Status::Partial) if window.len() > options.max_header_size => HeaderBlock::Invalid {
            consumed: 0,
            error: crate::Error::HeadersTooLarge {
                limit: options.max_header_size,
            },
        },
        Ok(httparse::Status::Partial) => HeaderBlock::Partial,
        Err(err) => HeaderBlock::Invalid {
            consumed: 0,
            error: crate::Error::ReadHeaderFailed(err),
        },
    }
}

fn build_descriptor(raw_headers: &[httparse::Header<'_>], options: &ParseOptions) -> crate::Result<PartDescriptor> {
    let mut content_disposition = None;
    let mut content_type = None;
    let mut others = Vec::new();

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name).map_err(|err| crate::Error::DecodeHeaderName {
            name: raw_header.name.to_owned(),
            cause: err.into(),
        })?;

        let value = helpers::decode_text(raw_header.value, options.encoding)
            .trim()
            .to_owned();

        if name == header::CONTENT_DISPOSITION {
            content_disposition.get_or_insert(value);
        } else if name == header::CONTENT_TYPE {
            content_type.get_or_insert(value);
        } else {
            others.push((name.as_str().to_owned(), value));
        }
    }

    let content_disposition = content_disposition
        .map(|value| ContentDisposition::parse(&value))
        .ok_or(crate::Error::MissingContentDisposition)?;

    let name = content_disposition
        .field_name()
        .ok_or(crate::Error::MissingFieldName)?
        .to_owned();

    let mut part = PartDescriptor {
        name,
        file_name: content_disposition.file_name().map(str::to_owned),
        content_type: content_type.filter(|value| !value.is_empty()),
        content_disposition: content_disposition.disposition,
        additional_properties: Vec::new(),
    };

    for (key, value) in content_disposition.params {
        if key != "name" && key != "filename" {
            part.insert_property(key, value);
        }
    }

    for (key, value) in others {
        part.insert_property(key, value);
    }

    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn complete(block: HeaderBlock) -> (usize, PartDescriptor) {
        match block {
            HeaderBlock::Complete { consumed, part } => (consumed, part),
            other => panic!("expected a complete header block, got {:?}", other),
        }
    }

    fn invalid(block: HeaderBlock) -> (usize, crate::Error) {
        match block {
            HeaderBlock::Invalid { consumed, error } => (consumed, error),
            other => panic!("expected an invalid header block, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_part_headers() {
        let options = ParseOptions::new("XYZ");
        let window = b"Content-Disposition: form-data; name=\"f\"; filename=\"a.png\"; size=3\r\nContent-Type: image/png\r\nX-Trace:  abc \r\n\r\nBODY";

        let (consumed, part) = complete(parse_part_headers(window, &options));

        assert_eq!(&window[consumed..], b"BODY");
        assert_eq!(part.name(), "f");
        assert_eq!(part.file_name(), Some("a.png"));
        assert_eq!(part.content_type(), Some("image/png"));
        assert_eq!(part.content_disposition(), "form-data");
        assert_eq!(
            part.additional_properties(),
            &[
                ("size".to_owned(), "3".to_owned()),
                ("x-trace".to_owned(), "abc".to_owned())
            ]
        );
    }

    #[test]
    fn test_parse_part_headers_partial() {
        let options = ParseOptions::new("XYZ");

        assert!(matches!(parse_part_headers(b"", &options), HeaderBlock::Partial));
        assert!(matches!(
            parse_part_headers(b"Content-Disposition: form-data; name=\"a\"\r\n", &options),
            HeaderBlock::Partial
        ));
        assert!(matches!(
            parse_part_headers(b"Content-Dispo", &options),
            HeaderBlock::Partial
        ));
    }

    #[test]
    fn test_parse_part_headers_missing_disposition() {
        let options = ParseOptions::new("XYZ");

        let (consumed, error) = invalid(parse_part_headers(b"Content-Type: text/plain\r\n\r\nabc", &options));
        assert_eq!(consumed, 28);
        assert_eq!(error, crate::Error::MissingContentDisposition);

        let (consumed, error) = invalid(parse_part_headers(b"\r\nabc", &options));
        assert_eq!(consumed, 2);
        assert_eq!(error, crate::Error::MissingContentDisposition);
    }

    #[test]
    fn test_parse_part_headers_missing_name() {
        let options = ParseOptions::new("XYZ");
        let (_, error) = invalid(parse_part_headers(
            b"Content-Disposition: form-data; filename=\"a.txt\"\r\n\r\n",
            &options,
        ));

        assert_eq!(error, crate::Error::MissingFieldName);
        assert_eq!(error.kind(), ErrorKind::MalformedPart);
    }

    #[test]
    fn test_parse_part_headers_invalid_syntax() {
        let options = ParseOptions::new("XYZ");
        let (consumed, error) = invalid(parse_part_headers(b"not a header line\r\n\r\n", &options));

        assert_eq!(consumed, 0);
        assert_eq!(error.kind(), ErrorKind::MalformedPart);
    }

    #[test]
    fn test_parse_part_headers_too_large() {
        let options = ParseOptions::new("XYZ").max_header_size(32);
        let mut window = b"Content-Disposition: form-data; name=\"".to_vec();
        window.extend_from_slice(&[b'a'; 64]);

        let (consumed, error) = invalid(parse_part_headers(&window, &options));
        assert_eq!(consumed, 0);
        assert_eq!(error, crate::Error::HeadersTooLarge { limit: 32 });

        window.extend_from_slice(b"\"\r\n\r\n");
        let (consumed, error) = invalid(parse_part_headers(&window, &options));
        assert_eq!(consumed, window.len());
        assert_eq!(error, crate::Error::HeadersTooLarge { limit: 32 });
    }

    #[test]
    fn test_parse_part_headers_encoding() {
        let options = ParseOptions::new("XYZ").encoding(encoding_rs::WINDOWS_1252);
        let window = b"Content-Disposition: form-data; name=\"f\"; filename=\"caf\xe9.txt\"\r\n\r\n";

        let (_, part) = complete(parse_part_headers(window, &options));
        assert_eq!(part.file_name(), Some("café.txt"));
    }
}
