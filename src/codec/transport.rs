//! The binary-safe text transport used by the contents API.
//!
//! Stored file bytes travel as base64(utf8(text)). GitHub wraps the base64
//! payload at 60 columns, so embedded ASCII whitespace is stripped before
//! decoding. Encoding reproduces the exact double-encoding so a round trip
//! through the codec is byte-faithful to what the API expects.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::CodecError;

/// Decodes a transport payload into text.
pub fn decode(transport: &str) -> Result<String, CodecError> {
    let compact: String = transport
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}

/// Encodes text into a transport payload.
pub fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_identity_on_text() {
        let text = "---\ntitle: héllo\n---\n\nBody with accents: café\n";
        assert_eq!(decode(&encode(text)).unwrap(), text);
    }

    #[test]
    fn decodes_line_wrapped_base64() {
        // The API wraps payloads with newlines; decode must tolerate them.
        let encoded = encode("some longer piece of text that would be wrapped");
        let wrapped: String = encoded
            .as_bytes()
            .chunks(16)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(
            decode(&wrapped).unwrap(),
            "some longer piece of text that would be wrapped"
        );
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(decode("!!not-base64!!"), Err(CodecError::Base64(_))));
    }

    #[test]
    fn rejects_non_utf8_payload() {
        let bad = STANDARD.encode([0xff, 0xfe, 0x00]);
        assert!(matches!(decode(&bad), Err(CodecError::Utf8(_))));
    }
}
