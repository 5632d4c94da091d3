//! Reading source files as text.
//!
//! Decoding walks a fixed chain and stops at the first strategy that
//! accepts the bytes:
//!
//! 1. UTF-8, strict. A BOM is kept as content so round trips stay exact.
//! 2. Windows-1252, strict: bytes with no cp1252 assignment (0x81, 0x8D,
//!    0x8F, 0x90, 0x9D) reject the input.
//! 3. Latin-1, one char per byte. Accepts any input.
//!
//! Only I/O can fail; decoding cannot.

use std::fmt;
use std::path::Path;

use encoding_rs::{UTF_8, WINDOWS_1252};
use serde::Serialize;

/// Bytes left unassigned by the cp1252 code page. The WHATWG decoder maps
/// them to C1 controls instead of failing.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// The strategy that produced a [`DecodedText`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    Windows1252,
    Latin1,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "utf-8"),
            Self::Windows1252 => write!(f, "windows-1252"),
            Self::Latin1 => write!(f, "latin-1"),
        }
    }
}

/// Text plus the encoding it was decoded with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Decode `bytes` with the first strategy in the chain that accepts them.
#[must_use]
pub fn decode_bytes(bytes: &[u8]) -> DecodedText {
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return DecodedText {
            text: text.into_owned(),
            encoding: TextEncoding::Utf8,
        };
    }
    if !bytes.iter().any(|b| CP1252_UNDEFINED.contains(b))
        && let Some(text) = WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
    {
        return DecodedText {
            text: text.into_owned(),
            encoding: TextEncoding::Windows1252,
        };
    }
    DecodedText {
        text: bytes.iter().copied().map(char::from).collect(),
        encoding: TextEncoding::Latin1,
    }
}

/// Read a file and decode it.
///
/// # Errors
/// Propagates the I/O error if the file cannot be read (vanished,
/// permission denied, is a directory).
pub fn read_text(path: &Path) -> std::io::Result<DecodedText> {
    let bytes = std::fs::read(path)?;
    Ok(decode_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_tried_first() {
        let d = decode_bytes("héllo → wörld\n".as_bytes());
        assert_eq!(d.encoding, TextEncoding::Utf8);
        assert_eq!(d.text, "héllo → wörld\n");
    }

    #[test]
    fn utf8_bom_is_preserved() {
        let d = decode_bytes(b"\xEF\xBB\xBFx");
        assert_eq!(d.encoding, TextEncoding::Utf8);
        assert_eq!(d.text, "\u{feff}x");
    }

    #[test]
    fn invalid_utf8_falls_back_to_windows_1252() {
        // 0xE9 is 'é' and 0x80 is '€' in Windows-1252.
        let d = decode_bytes(b"caf\xE9 \x80\r\n");
        assert_eq!(d.encoding, TextEncoding::Windows1252);
        assert_eq!(d.text, "café €\r\n");
    }

    #[test]
    fn empty_input_is_utf8() {
        let d = decode_bytes(b"");
        assert_eq!(d.encoding, TextEncoding::Utf8);
        assert!(d.text.is_empty());
    }

    #[test]
    fn every_byte_value_decodes() {
        let all: Vec<u8> = (0..=255).collect();
        let d = decode_bytes(&all);
        assert_eq!(d.encoding, TextEncoding::Latin1);
        assert_eq!(d.text.chars().count(), 256);
    }

    #[test]
    fn unassigned_cp1252_bytes_fall_through_to_latin1() {
        for b in CP1252_UNDEFINED {
            let d = decode_bytes(&[b'a', 0xE9, b]);
            assert_eq!(d.encoding, TextEncoding::Latin1, "byte {b:#04x}");
            assert_eq!(d.text, format!("a\u{e9}{}", char::from(b)));
        }
    }

    #[test]
    fn assigned_cp1252_bytes_stay_windows_1252() {
        let d = decode_bytes(b"\x93quoted\x94 \x80");
        assert_eq!(d.encoding, TextEncoding::Windows1252);
        assert_eq!(d.text, "\u{201c}quoted\u{201d} \u{20ac}");
    }

    #[test]
    fn read_text_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text(&dir.path().join("gone.cs")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn read_text_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "line\r\n").unwrap();
        assert_eq!(read_text(&path).unwrap().text, "line\r\n");
    }

    #[test]
    fn display_names() {
        assert_eq!(TextEncoding::Utf8.to_string(), "utf-8");
        assert_eq!(TextEncoding::Windows1252.to_string(), "windows-1252");
        assert_eq!(TextEncoding::Latin1.to_string(), "latin-1");
    }
}
