use std::borrow::Cow;

use encoding_rs::Encoding;

/// Returns the lowercased `type/subtype` of a content type, without parameters.
pub(crate) fn mime_essence(content_type: &str) -> String {
    let content_type = content_type.trim();

    match content_type.parse::<mime::Mime>() {
        Ok(mime) => mime.essence_str().to_ascii_lowercase(),
        // Keep whatever precedes the parameters of an unparsable value.
        Err(_) => content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
    }
}

/// Picks the encoding named by the content type's `charset` parameter, if it
/// has one that `encoding_rs` knows, falling back to `default`.
pub(crate) fn charset_or(content_type: Option<&str>, default: &'static Encoding) -> &'static Encoding {
    content_type
        .and_then(|val| val.parse::<mime::Mime>().ok())
        .and_then(|mime| {
            mime.get_param(mime::CHARSET)
                .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
        })
        .unwrap_or(default)
}

pub(crate) fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _) = encoding.decode_without_bom_handling(bytes);

    match text {
        Cow::Owned(s) => s,
        Cow::Borrowed(s) => String::from(s),
    }
}
