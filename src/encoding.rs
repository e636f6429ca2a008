//! Payload encoding for share URIs
//!
//! Payloads are re-encoded through the configured charset before being
//! appended to a URI prefix. By default the re-encoded text is appended
//! as-is, so reserved characters such as `?`, `&` and `#` pass through
//! unescaped. Percent-encoding is opt-in.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::PathBuf;

use crate::models::{Payload, PayloadKind};

/// Charset used when none is configured
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Everything except RFC 3986 unreserved characters
const TEXT_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Same as text, but path separators stay literal
const PATH_ESCAPE: &AsciiSet = &TEXT_ESCAPE.remove(b'/');

/// Encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    #[error("Path is not valid Unicode: {0:?}")]
    NotUnicode(PathBuf),
}

/// Check whether a charset label names UTF-8
pub fn is_utf8_label(label: &str) -> bool {
    let normalized: String = label
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    normalized == "utf8"
}

/// Round-trip text through the bytes of the given charset
pub fn reencode(text: &str, charset: &str) -> Result<String, EncodingError> {
    if !is_utf8_label(charset) {
        return Err(EncodingError::UnsupportedCharset(charset.to_string()));
    }

    // &str is already UTF-8, so the byte round-trip cannot fail here
    String::from_utf8(text.as_bytes().to_vec())
        .map_err(|_| EncodingError::UnsupportedCharset(charset.to_string()))
}

/// Turns payloads into the string appended to a share URI prefix
#[derive(Debug, Clone)]
pub struct PayloadEncoder {
    charset: String,
    percent_encode: bool,
}

impl PayloadEncoder {
    pub fn new(charset: impl Into<String>, percent_encode: bool) -> Self {
        PayloadEncoder {
            charset: charset.into(),
            percent_encode,
        }
    }

    /// Encode a payload for inclusion in a URI
    pub fn encode(&self, payload: &Payload) -> Result<String, EncodingError> {
        let text = match payload {
            Payload::Text(text) => text.as_str(),
            Payload::ImagePath(path) => path
                .to_str()
                .ok_or_else(|| EncodingError::NotUnicode(path.clone()))?,
        };

        let encoded = reencode(text, &self.charset)?;

        if !self.percent_encode {
            return Ok(encoded);
        }

        let set = match payload.kind() {
            PayloadKind::Text => TEXT_ESCAPE,
            PayloadKind::Image => PATH_ESCAPE,
        };
        Ok(utf8_percent_encode(&encoded, set).to_string())
    }
}

impl Default for PayloadEncoder {
    fn default() -> Self {
        PayloadEncoder::new(DEFAULT_CHARSET, false)
    }
}
