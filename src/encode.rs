//! PlantUML URL text encoding.
//!
//! The rendering service accepts diagram source embedded directly in the URL
//! path. The canonical scheme compresses the UTF-8 text with raw DEFLATE and
//! packs the compressed bytes with a 6-bit alphabet of `0-9A-Za-z-_`. Two
//! alternative schemes are kept for servers where the canonical one fails:
//! URL-safe base64 of the same compressed bytes (prefix `~1`) and plain hex
//! of the uncompressed bytes (prefix `~h`).

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use std::io::{Read, Write};

/// 6-bit value → symbol table: 0-9, A-Z, a-z, `-`, `_`.
const ENCODE_TABLE: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// Encoding scheme used to embed diagram source into a request URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingMethod {
    /// Raw DEFLATE + custom 6-bit alphabet (canonical, no URL prefix).
    Deflate,
    /// Raw DEFLATE + URL-safe base64 without padding (prefix `~1`).
    Base64,
    /// Hex of the uncompressed UTF-8 bytes (prefix `~h`).
    Hex,
}

impl EncodingMethod {
    /// All methods in fallback order: the canonical scheme first, hex last.
    pub const ALL: [Self; 3] = [Self::Deflate, Self::Base64, Self::Hex];

    /// Returns the URL prefix that selects this decode mode on the server.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Deflate => "",
            Self::Base64 => "~1",
            Self::Hex => "~h",
        }
    }

    /// Returns a short human-readable name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deflate => "deflate",
            Self::Base64 => "base64",
            Self::Hex => "hex",
        }
    }

    /// Encodes diagram text with this scheme.
    ///
    /// The text is trimmed before encoding. Empty trimmed input yields an
    /// empty token for every scheme.
    #[must_use]
    pub fn encode(self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        match self {
            Self::Deflate => encode_bytes(&deflate(trimmed.as_bytes())),
            Self::Base64 => URL_SAFE_NO_PAD.encode(deflate(trimmed.as_bytes())),
            Self::Hex => hex_lower(trimmed.as_bytes()),
        }
    }
}

/// Encodes diagram text with the canonical scheme (deflate + 6-bit alphabet).
///
/// Pure function: trims the input, compresses the UTF-8 bytes with raw
/// DEFLATE at maximum level, then packs them with the 6-bit alphabet. An
/// empty (post-trim) input produces an empty token.
#[must_use]
pub fn encode(text: &str) -> String {
    EncodingMethod::Deflate.encode(text)
}

/// Decodes a canonical token back to the original diagram bytes.
///
/// Reference inverse of [`encode`]: maps symbols back to 6-bit values,
/// reassembles the byte stream, and raw-inflates it. The zero-padded tail
/// bytes past the end of the DEFLATE stream are ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidToken`] if the token contains symbols outside the
/// alphabet, has a partial 4-symbol group, or the compressed data is corrupt.
pub fn decode(token: &str) -> Result<Vec<u8>> {
    if token.is_empty() {
        return Ok(Vec::new());
    }
    let packed = decode_bytes(token)?;
    let mut out = Vec::new();
    DeflateDecoder::new(packed.as_slice())
        .read_to_end(&mut out)
        .map_err(|e| Error::invalid_token(format!("inflate failed: {e}")))?;
    Ok(out)
}

/// Packs bytes with the 6-bit alphabet, 3 bytes → 4 symbols.
///
/// A final partial group is zero-padded before splitting into sextets and
/// still emits 4 symbols, so the output length is always a multiple of 4.
/// No `=` padding characters are used.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for group in bytes.chunks(3) {
        let b1 = group[0];
        let b2 = group.get(1).copied().unwrap_or(0);
        let b3 = group.get(2).copied().unwrap_or(0);
        append_3_bytes(&mut out, b1, b2, b3);
    }
    out
}

/// Unpacks a 6-bit alphabet string back into bytes.
///
/// Every 4-symbol group yields 3 bytes, including any zero padding the
/// encoder appended to the final group.
///
/// # Errors
///
/// Returns [`Error::InvalidToken`] on symbols outside the alphabet or a
/// token length that is not a multiple of 4.
pub fn decode_bytes(token: &str) -> Result<Vec<u8>> {
    if token.len() % 4 != 0 {
        return Err(Error::invalid_token(format!(
            "token length {} is not a multiple of 4",
            token.len()
        )));
    }
    let mut out = Vec::with_capacity(token.len() / 4 * 3);
    let symbols = token.as_bytes();
    for group in symbols.chunks(4) {
        let c1 = decode_6bit(group[0])?;
        let c2 = decode_6bit(group[1])?;
        let c3 = decode_6bit(group[2])?;
        let c4 = decode_6bit(group[3])?;
        out.push((c1 << 2) | (c2 >> 4));
        out.push((c2 << 4) | (c3 >> 2));
        out.push((c3 << 6) | c4);
    }
    Ok(out)
}

/// Compresses bytes with raw DEFLATE (no zlib framing) at maximum level.
fn deflate(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(bytes)
        .expect("writing to a Vec-backed encoder is infallible");
    encoder
        .finish()
        .expect("finishing a Vec-backed encoder is infallible")
}

/// Splits 3 bytes into 4 sextets and appends their symbols.
fn append_3_bytes(out: &mut String, b1: u8, b2: u8, b3: u8) {
    let c1 = b1 >> 2;
    let c2 = ((b1 & 0x3) << 4) | (b2 >> 4);
    let c3 = ((b2 & 0xF) << 2) | (b3 >> 6);
    let c4 = b3 & 0x3F;
    for c in [c1, c2, c3, c4] {
        out.push(char::from(ENCODE_TABLE[usize::from(c & 0x3F)]));
    }
}

/// Maps a symbol back to its 6-bit value.
fn decode_6bit(symbol: u8) -> Result<u8> {
    match symbol {
        b'0'..=b'9' => Ok(symbol - b'0'),
        b'A'..=b'Z' => Ok(symbol - b'A' + 10),
        b'a'..=b'z' => Ok(symbol - b'a' + 36),
        b'-' => Ok(62),
        b'_' => Ok(63),
        other => Err(Error::invalid_token(format!(
            "symbol '{}' (0x{other:02x}) is outside the alphabet",
            char::from(other)
        ))),
    }
}

/// Lowercase hex of a byte slice.
fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_alphabet(token: &str) -> bool {
        token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    #[test]
    fn test_empty_input_yields_empty_token() {
        assert_eq!(encode(""), "");
        assert_eq!(encode("   \n\t  "), "");
        assert_eq!(EncodingMethod::Base64.encode(""), "");
        assert_eq!(EncodingMethod::Hex.encode("  "), "");
    }

    #[test]
    fn test_token_uses_only_alphabet_symbols() {
        let token = encode("@startuml\nclass A\n@enduml");
        assert!(!token.is_empty());
        assert!(is_alphabet(&token));
    }

    #[test]
    fn test_token_length_is_padded_to_groups_of_four() {
        let text = "@startuml\nAlice -> Bob: hello\n@enduml";
        let compressed = deflate(text.trim().as_bytes());
        let token = encode(text);
        assert_eq!(token.len(), compressed.len().div_ceil(3) * 4);
        assert_eq!(token.len() % 4, 0);
    }

    #[test]
    fn test_encode_bytes_partial_groups() {
        // 1 byte → one full group of 4 symbols, two zero-padded bytes
        assert_eq!(encode_bytes(&[0xFF]).len(), 4);
        // 2 bytes → still one group
        assert_eq!(encode_bytes(&[0xFF, 0x00]).len(), 4);
        // 3 bytes → exactly one group, no padding artifacts
        assert_eq!(encode_bytes(&[1, 2, 3]).len(), 4);
        // 4 bytes → two groups
        assert_eq!(encode_bytes(&[1, 2, 3, 4]).len(), 8);
        assert_eq!(encode_bytes(&[]), "");
    }

    #[test]
    fn test_encode_bytes_known_values() {
        // 0x00 0x00 0x00 → four zero sextets → "0000"
        assert_eq!(encode_bytes(&[0, 0, 0]), "0000");
        // 0xFF 0xFF 0xFF → four 63-valued sextets → "____"
        assert_eq!(encode_bytes(&[0xFF, 0xFF, 0xFF]), "____");
        // Single 0xFF → sextets 63, 48, 0, 0 → "_m00"
        let token = encode_bytes(&[0xFF]);
        assert_eq!(token, "_m00");
        assert_eq!(token.as_bytes()[0], b'_');
        assert_eq!(token.as_bytes()[2], b'0');
        assert_eq!(token.as_bytes()[3], b'0');
    }

    #[test]
    fn test_decode_bytes_round_trip_with_padding() {
        let bytes = [7u8, 200, 13, 99, 42];
        let decoded = decode_bytes(&encode_bytes(&bytes)).unwrap();
        // Decoded stream carries the zero padding up to a 3-byte boundary.
        assert_eq!(&decoded[..bytes.len()], &bytes);
        assert!(decoded[bytes.len()..].iter().all(|&b| b == 0));
        assert_eq!(decoded.len(), bytes.len().div_ceil(3) * 3);
    }

    #[test]
    fn test_decode_rejects_bad_tokens() {
        assert!(decode_bytes("abc").is_err());
        assert!(decode_bytes("ab=+").is_err());
        assert!(decode("not deflate!").is_err());
    }

    #[test]
    fn test_round_trip_recovers_trimmed_source() {
        let source = "  @startuml\nclass Paciente {\n  +nome: string\n}\n@enduml  \n";
        let decoded = decode(&encode(source)).unwrap();
        assert_eq!(decoded, source.trim().as_bytes());
    }

    #[test]
    fn test_round_trip_multibyte_utf8() {
        let source = "@startuml\nnote \"Pacientes não encontrados\"\n@enduml";
        let decoded = decode(&encode(source)).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), source);
    }

    #[test]
    fn test_empty_token_decodes_to_empty() {
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_base64_variant_differs_from_canonical() {
        let source = "@startuml\nclass A\n@enduml";
        let canonical = EncodingMethod::Deflate.encode(source);
        let base64 = EncodingMethod::Base64.encode(source);
        assert_ne!(canonical, base64);
        // The base64 variant is URL-safe and unpadded.
        assert!(is_alphabet(&base64));
    }

    #[test]
    fn test_hex_variant_is_uncompressed() {
        let source = "@startuml";
        let token = EncodingMethod::Hex.encode(source);
        assert_eq!(token, "407374617274756d6c");
        assert_eq!(token.len(), source.len() * 2);
    }

    #[test]
    fn test_method_prefixes() {
        assert_eq!(EncodingMethod::Deflate.prefix(), "");
        assert_eq!(EncodingMethod::Base64.prefix(), "~1");
        assert_eq!(EncodingMethod::Hex.prefix(), "~h");
    }

    #[test]
    fn test_fallback_order_puts_hex_last() {
        assert_eq!(
            EncodingMethod::ALL,
            [
                EncodingMethod::Deflate,
                EncodingMethod::Base64,
                EncodingMethod::Hex
            ]
        );
    }
}
