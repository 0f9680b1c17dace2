//! Response body decoding
//!
//! Some hosts send gzip payloads without (or with a wrong) `Content-Encoding`
//! header, so the body is sniffed for the gzip magic bytes before any
//! charset decoding happens.

use flate2::read::GzDecoder;
use std::borrow::Cow;
use std::io::Read;

/// gzip member header: ID1, ID2, CM=deflate
const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

/// Whether `body` starts with a gzip member header
pub fn is_gzip(body: &[u8]) -> bool {
    body.starts_with(&GZIP_MAGIC)
}

/// Decompresses `body` if it is gzip, otherwise returns it unchanged
///
/// A payload that carries the magic bytes but fails to inflate is returned
/// as-is and left to charset decoding.
pub fn decompress_if_gzip(body: &[u8]) -> Cow<'_, [u8]> {
    if !is_gzip(body) {
        return Cow::Borrowed(body);
    }

    let mut decoder = GzDecoder::new(body);
    let mut inflated = Vec::new();
    match decoder.read_to_end(&mut inflated) {
        Ok(_) => Cow::Owned(inflated),
        Err(e) => {
            tracing::debug!(error = %e, "Body has gzip magic but failed to inflate");
            Cow::Borrowed(body)
        }
    }
}

/// Decodes body bytes to a String using the charset from the
/// Content-Type header, falling back to detection
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let body = decompress_if_gzip(body);

    if let Some(charset) = content_type.and_then(extract_charset) {
        if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
            let (decoded, _, _) = encoding.decode(&body);
            return decoded.into_owned();
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(&body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(&body);
    decoded.into_owned()
}

/// Extracts the charset value from a Content-Type header
fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .to_lowercase()
        .split(';')
        .find_map(|part| {
            part.trim()
                .strip_prefix("charset=")
                .map(|c| c.trim_matches('"').trim_matches('\'').to_string())
        })
        .filter(|c| !c.is_empty())
}
