//! Deflate plus URL-safe base64 text codec.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::error::{DecodeError, Result};

/// Largest text a token may inflate to.
pub const MAX_DECODED_BYTES: u64 = 4 * 1024 * 1024;

/// Compress `text` and encode it as an unpadded URL-safe base64 token.
#[must_use]
pub fn encode_text(text: &str) -> String {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    // Writing into a Vec cannot fail
    let compressed = encoder
        .write_all(text.as_bytes())
        .and_then(|()| encoder.finish())
        .unwrap_or_default();
    URL_SAFE_NO_PAD.encode(compressed)
}

/// Inverse of [`encode_text`].
pub fn decode_text(token: &str) -> Result<String> {
    let compressed = URL_SAFE_NO_PAD.decode(token.trim())?;
    let mut decoder = DeflateDecoder::new(compressed.as_slice()).take(MAX_DECODED_BYTES + 1);
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(DecodeError::Inflate)?;
    if bytes.len() as u64 > MAX_DECODED_BYTES {
        return Err(DecodeError::TooLarge {
            limit: MAX_DECODED_BYTES,
        });
    }
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_url_safe() {
        let token = encode_text("z.object({\n    key: z.string()\n})");
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert!(!token.contains('='));
    }

    #[test]
    fn test_round_trip() {
        for text in ["", "{}", "ünïcödé ✓", "a\nb\tc"] {
            assert_eq!(decode_text(&encode_text(text)).unwrap(), text);
        }
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(matches!(decode_text("not base64!"), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn test_rejects_corrupt_payload() {
        let token = URL_SAFE_NO_PAD.encode([0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(decode_text(&token), Err(DecodeError::Inflate(_))));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[0xc3, 0x28]).unwrap();
        let token = URL_SAFE_NO_PAD.encode(encoder.finish().unwrap());
        assert!(matches!(decode_text(&token), Err(DecodeError::Utf8(_))));
    }
}
