//! MIME encoding utilities.
//!
//! Supports Base64 (wrapped for bodies, URL-safe for the envelope),
//! Quoted-Printable, and RFC 2047 header encoding.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use std::fmt::Write as _;

/// Maximum encoded line length for Base64 and Quoted-Printable bodies.
const MAX_LINE_LENGTH: usize = 76;

/// Maximum length of a line in a 7bit body (RFC 5322 §2.1.1).
const MAX_SEVEN_BIT_LINE: usize = 998;

/// Maximum length of a single RFC 2047 encoded word.
const MAX_ENCODED_WORD: usize = 75;

/// Encodes data as Base64, wrapped at 76 columns with CRLF.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);

    for (i, chunk) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        // Base64 output is ASCII, so every chunk boundary is a char boundary.
        result.push_str(&String::from_utf8_lossy(chunk));
    }

    result
}

/// Encodes data as unpadded URL-safe Base64 (RFC 4648 §5).
#[must_use]
pub fn encode_base64url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decodes URL-safe Base64, with or without trailing padding.
///
/// # Errors
///
/// Returns an error if the input is not valid URL-safe Base64.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .map_err(Into::into)
}

/// Returns true if `data` can travel as a `7bit` body: ASCII only, no NUL,
/// no bare CR, and no line longer than 998 octets.
#[must_use]
pub fn is_seven_bit(data: &[u8]) -> bool {
    if data.iter().any(|&b| b == 0 || !b.is_ascii()) {
        return false;
    }

    lines(data).all(|line| line.len() <= MAX_SEVEN_BIT_LINE && !line.contains(&b'\r'))
}

/// Splits on LF, dropping the CR of each CRLF pair. A CR that ends the
/// data is not followed by LF and stays part of the last line.
fn lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut segments = data.split(|&b| b == b'\n').peekable();
    std::iter::from_fn(move || {
        let segment = segments.next()?;
        if segments.peek().is_some() {
            Some(segment.strip_suffix(b"\r").unwrap_or(segment))
        } else {
            Some(segment)
        }
    })
}

/// Converts bare LF line endings to CRLF.
#[must_use]
pub fn normalize_crlf(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut previous = None;

    for &byte in data {
        if byte == b'\n' && previous != Some(b'\r') {
            result.push(b'\r');
        }
        result.push(byte);
        previous = Some(byte);
    }

    result
}

/// Encodes bytes using Quoted-Printable encoding (RFC 2045 §6.7).
///
/// Line breaks in the input are kept as hard CRLF breaks; longer lines get
/// soft breaks so no output line exceeds 76 characters. Whitespace at the
/// end of a line is always escaped.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    let mut result = String::new();

    for (i, line) in lines(data).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        let mut line_length = 0;

        for (j, &byte) in line.iter().enumerate() {
            let at_end = j + 1 == line.len();
            let literal = matches!(byte, b'!'..=b'<' | b'>'..=b'~')
                || (matches!(byte, b' ' | b'\t') && !at_end);
            let width = if literal { 1 } else { 3 };

            // Leave room for the trailing '=' of a soft break.
            if line_length + width > MAX_LINE_LENGTH - 1 {
                result.push_str("=\r\n");
                line_length = 0;
            }

            if literal {
                result.push(char::from(byte));
            } else {
                let _ = write!(result, "={byte:02X}");
            }
            line_length += width;
        }
    }

    result
}

/// Returns true if a header text needs RFC 2047 encoding.
#[must_use]
pub fn needs_rfc2047(text: &str) -> bool {
    !text.is_ascii() || text.contains("=?")
}

/// Encodes header text using RFC 2047 `B` encoded words.
///
/// Text that is plain ASCII is returned unchanged. Otherwise the text is
/// split on character boundaries into as many encoded words as needed to
/// keep each under 75 characters; the words are separated by a single space,
/// which decoders drop between adjacent encoded words.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_rfc2047(text) {
        return text.to_string();
    }

    // "=?" charset "?B?" ... "?="
    let overhead = charset.len() + 7;
    let max_bytes = MAX_ENCODED_WORD.saturating_sub(overhead) / 4 * 3;

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if !chunk.is_empty() && chunk.len() + ch.len_utf8() > max_bytes {
            words.push(encoded_word(&chunk, charset));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk, charset));
    }

    words.join(" ")
}

fn encoded_word(text: &str, charset: &str) -> String {
    format!("=?{charset}?B?{}?=", STANDARD.encode(text.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_lines_wrap_at_76() {
        let data = vec![b'x'; 200];
        let encoded = encode_base64_lines(&data);
        let lines: Vec<&str> = encoded.split("\r\n").collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= 76));
        assert_eq!(STANDARD.decode(lines.concat()).unwrap(), data);
    }

    #[test]
    fn test_base64url_alphabet() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet.
        let encoded = encode_base64url(&[0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
        assert_eq!(decode_base64url(&encoded).unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_base64url("-_8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_base64url_rejects_standard_alphabet() {
        assert!(decode_base64url("+/8").is_err());
    }

    #[test]
    fn test_seven_bit_detection() {
        assert!(is_seven_bit(b"<p>Hello</p>\r\n<p>World</p>"));
        assert!(!is_seven_bit("<p>Héllo</p>".as_bytes()));
        assert!(!is_seven_bit(b"bare\rcarriage"));
        assert!(!is_seven_bit(&vec![b'a'; 1000]));
        assert!(!is_seven_bit(b"abc\r"));
        assert!(is_seven_bit(b"abc\r\n"));
    }

    #[test]
    fn test_normalize_crlf() {
        assert_eq!(normalize_crlf(b"a\nb\r\nc"), b"a\r\nb\r\nc".to_vec());
    }

    #[test]
    fn test_quoted_printable_encode() {
        assert_eq!(encode_quoted_printable(b"Hello, World!"), "Hello, World!");

        let encoded = encode_quoted_printable("Héllo = Wørld".as_bytes());
        assert_eq!(encoded, "H=C3=A9llo =3D W=C3=B8rld");
    }

    #[test]
    fn test_quoted_printable_keeps_hard_breaks_and_escapes_trailing_space() {
        let encoded = encode_quoted_printable(b"line one \nline two");
        assert_eq!(encoded, "line one=20\r\nline two");
    }

    #[test]
    fn test_quoted_printable_escapes_trailing_carriage_return() {
        assert_eq!(encode_quoted_printable(b"abc\r"), "abc=0D");
        assert_eq!(encode_quoted_printable(b"abc\r\n"), "abc\r\n");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        let encoded = encode_quoted_printable("é".repeat(40).as_bytes());
        for line in encoded.split("\r\n") {
            assert!(line.len() <= 76, "line too long: {line}");
        }
        assert!(encoded.contains("=\r\n"));
    }

    #[test]
    fn test_rfc2047_encode() {
        assert_eq!(encode_rfc2047("Hello?", "UTF-8"), "Hello?");

        let encoded = encode_rfc2047("Héllo", "UTF-8");
        assert_eq!(encoded, "=?UTF-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_rfc2047_encodes_lookalike_words() {
        assert!(encode_rfc2047("=?x?", "UTF-8").starts_with("=?UTF-8?B?"));
    }

    #[test]
    fn test_rfc2047_splits_long_text_on_char_boundaries() {
        let text = "日本語のテキスト".repeat(6);
        let encoded = encode_rfc2047(&text, "UTF-8");
        let words: Vec<&str> = encoded.split(' ').collect();
        assert!(words.len() > 1);

        let mut decoded = Vec::new();
        for word in words {
            assert!(word.len() <= 75);
            let inner = word
                .strip_prefix("=?UTF-8?B?")
                .and_then(|w| w.strip_suffix("?="))
                .unwrap();
            let bytes = STANDARD.decode(inner).unwrap();
            // Every word must be valid UTF-8 on its own.
            assert!(String::from_utf8(bytes.clone()).is_ok());
            decoded.extend(bytes);
        }
        assert_eq!(String::from_utf8(decoded).unwrap(), text);
    }
}
