use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Label reported for pure 7-bit input.
pub const ASCII_LABEL: &str = "ascii";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    pub text: String,
    pub charset: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("can not find charset: {reason}")]
    NoCharset { reason: String },
    #[error("failed to decode bytes with {encoding}: {message}")]
    DecodeFailure { encoding: String, message: String },
}

/// Detect the charset of a raw first line, then decode it.
///
/// Detection order: BOM -> binary rejection -> 7-bit ASCII -> valid UTF-8 ->
/// chardetng guess. Detection never looks at decoded text.
pub fn decode_line(bytes: &[u8]) -> Result<DecodedLine, DecodeError> {
    let (encoding, label) = detect_charset(bytes)?;
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: label,
            message: "decoding error".into(),
        });
    }
    Ok(DecodedLine {
        text: text.into_owned(),
        charset: label,
    })
}

pub fn detect_charset(bytes: &[u8]) -> Result<(&'static Encoding, String), DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::NoCharset {
            reason: "empty sample".into(),
        });
    }

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Ok((encoding, encoding.name().to_string()));
    }

    if let Some(reason) = binary_signature(bytes) {
        return Err(DecodeError::NoCharset {
            reason: reason.into(),
        });
    }

    if bytes.is_ascii() {
        return Ok((UTF_8, ASCII_LABEL.to_string()));
    }
    if std::str::from_utf8(bytes).is_ok() {
        return Ok((UTF_8, UTF_8.name().to_string()));
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    Ok((encoding, encoding.name().to_string()))
}

/// Recognize payloads that are clearly not text (compressed archives, binaries).
fn binary_signature(bytes: &[u8]) -> Option<&'static str> {
    const MAGIC: &[(&[u8], &str)] = &[
        (b"\x1f\x8b", "gzip payload"),
        (b"PK\x03\x04", "zip payload"),
        (b"\xfd7zXZ\x00", "xz payload"),
        (b"%PDF-", "pdf payload"),
    ];
    if let Some((_, name)) = MAGIC.iter().find(|(magic, _)| bytes.starts_with(magic)) {
        return Some(*name);
    }
    if let [b'B', b'Z', b'h', level, ..] = bytes {
        if (b'1'..=b'9').contains(level) {
            return Some("bzip2 payload");
        }
    }
    let is_control = |b: &u8| *b < 0x20 && !matches!(*b, b'\t' | b'\x0c');
    if bytes.iter().any(is_control) {
        return Some("control bytes in text sample");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_line_is_reported_as_ascii() {
        let decoded = decode_line(b"id,name,value").unwrap();
        assert_eq!(decoded.charset, "ascii");
        assert_eq!(decoded.text, "id,name,value");
    }

    #[test]
    fn utf8_line_is_detected() {
        let decoded = decode_line("date;région;qté".as_bytes()).unwrap();
        assert_eq!(decoded.charset, "UTF-8");
        assert_eq!(decoded.text, "date;région;qté");
    }

    #[test]
    fn bom_wins_and_is_stripped() {
        let decoded = decode_line(b"\xEF\xBB\xBFa,b").unwrap();
        assert_eq!(decoded.charset, "UTF-8");
        assert_eq!(decoded.text, "a,b");
    }

    #[test]
    fn latin1_line_falls_back_to_detector() {
        let decoded = decode_line(b"commune;d\xe9partement;r\xe9gion;ann\xe9e").unwrap();
        assert_eq!(decoded.charset, "windows-1252");
        assert_eq!(decoded.text, "commune;département;région;année");
    }

    #[test]
    fn gzip_payload_has_no_charset() {
        let err = decode_line(b"\x1f\x8b\x08\x00\x00\x00\x00\x00").unwrap_err();
        assert!(matches!(err, DecodeError::NoCharset { .. }));
    }

    #[test]
    fn bzip2_needs_a_block_size_digit() {
        let err = decode_line(b"BZh91AY&SY").unwrap_err();
        assert!(matches!(err, DecodeError::NoCharset { .. }));

        let decoded = decode_line(b"BZh_code;libelle").unwrap();
        assert_eq!(decoded.charset, "ascii");
        assert_eq!(decoded.text, "BZh_code;libelle");
    }

    #[test]
    fn nul_bytes_have_no_charset() {
        let err = decode_line(b"a\x00b\x00c").unwrap_err();
        assert!(matches!(err, DecodeError::NoCharset { .. }));
    }
}
