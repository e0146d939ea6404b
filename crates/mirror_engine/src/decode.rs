use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDocument {
    pub text: String,
    pub encoding: &'static Encoding,
}

impl DecodedDocument {
    /// Encode `text` back into the encoding this document was read in.
    ///
    /// Characters the encoding cannot represent become numeric character
    /// references. UTF-16 input is written as UTF-8.
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        let (bytes, _, _) = self.encoding.encode(text);
        bytes
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode bytes with {encoding}: {message}")]
    DecodeFailure { encoding: String, message: String },
}

/// Decode raw document bytes into UTF-8 using: BOM -> valid UTF-8 -> chardetng fallback.
pub fn decode_document(bytes: &[u8]) -> Result<DecodedDocument, DecodeError> {
    // 1) BOM aware decode using encoding_rs helper
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    // 2) Already UTF-8: the common case, no guessing needed
    if std::str::from_utf8(bytes).is_ok() {
        return decode_with(bytes, UTF_8);
    }

    // 3) chardetng detection over the full document
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_with(bytes, enc)
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> Result<DecodedDocument, DecodeError> {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: enc.name().to_string(),
            message: "decoding error".into(),
        });
    }
    Ok(DecodedDocument {
        text: text.into_owned(),
        encoding: enc,
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_document, DecodedDocument};

    #[test]
    fn utf8_passes_through() {
        let decoded = decode_document("<p>naïve</p>".as_bytes()).unwrap();
        assert_eq!(decoded.text, "<p>naïve</p>");
        assert_eq!(decoded.encoding.name(), "UTF-8");
    }

    #[test]
    fn bom_selects_encoding_and_is_stripped() {
        let bytes = [0xFF, 0xFE, b'<', 0, b'p', 0, b'>', 0];
        let decoded = decode_document(&bytes).unwrap();
        assert_eq!(decoded.text, "<p>");
        assert_eq!(decoded.encoding.name(), "UTF-16LE");
    }

    #[test]
    fn legacy_single_byte_text_is_detected() {
        let bytes = b"<html><body><p>Le caf\xe9 est tr\xe8s cher \xe0 Paris, d\xe9j\xe0 vu, \xe9t\xe9 comme hiver.</p></body></html>";
        let decoded = decode_document(bytes).unwrap();
        assert!(decoded.text.contains("caf\u{e9}"));
        assert_eq!(&*decoded.encode(&decoded.text), bytes.as_slice());
    }

    #[test]
    fn unmappable_characters_become_character_references() {
        let decoded = DecodedDocument {
            text: String::new(),
            encoding: encoding_rs::WINDOWS_1252,
        };
        assert_eq!(&*decoded.encode("caf\u{e9} \u{65e5}"), b"caf\xe9 &#26085;");
    }
}
