use encoding_rs::EncoderResult;

use super::{estimate, Charset};
use crate::buffer::{double_capacity, Buffer};
use crate::error::{Error, ErrorKind, Result};

/// Substituted for characters the target charset cannot represent.
const REPLACEMENT: &str = "?";

/// Encodes `text` into a new buffer.
///
/// The buffer starts at the charset's average size and doubles whenever the
/// encoder runs out of room, resuming exactly where it stopped. Stateful
/// charsets (ISO-2022-JP) get their closing shift sequence on the final call.
/// The result is trimmed to the bytes written.
pub fn encode(text: &str, charset: Charset) -> Result<Buffer> {
    if !charset.can_encode() {
        return Err(Error::with_message(
            ErrorKind::UnsupportedCharset,
            format!("cannot encode to {}", charset),
        ));
    }

    let mut encoder = charset.encoding().new_encoder();
    let mut out = Buffer::with_capacity(estimate(text.len(), charset.average_bytes_per_char()));
    let dst = out.storage_mut();
    let mut src = text;

    loop {
        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(src, dst, true);
        src = &src[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => double_capacity(dst),
            EncoderResult::Unmappable(c) => {
                log::trace!("unmappable {:?} in {}, substituting", c, charset);
                // Goes through the encoder so stateful charsets shift back first.
                while let (EncoderResult::OutputFull, _) = encoder
                    .encode_from_utf8_to_vec_without_replacement(REPLACEMENT, dst, false)
                {
                    double_capacity(dst);
                }
            }
        }
    }

    out.shrink_to_fit();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ascii() {
        let buf = encode("hello", Charset::utf8()).unwrap();
        assert_eq!(buf.as_slice(), b"hello");
    }

    #[test]
    fn test_encode_grows_past_estimate() {
        // Four-byte characters overrun the 1.1 bytes/char estimate many times over.
        let text = "\u{1F600}".repeat(100);
        let buf = encode(&text, Charset::utf8()).unwrap();
        assert_eq!(buf.len(), 400);
        assert_eq!(buf.as_slice(), text.as_bytes());
    }

    #[test]
    fn test_encode_empty() {
        let buf = encode("", Charset::utf8()).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_unmappable_becomes_question_mark() {
        let latin1 = Charset::for_label("latin1").unwrap();
        let buf = encode("a\u{4E2D}b", latin1).unwrap();
        assert_eq!(buf.as_slice(), b"a?b");
    }

    #[test]
    fn test_stateful_charset_closes_shift() {
        let jis = Charset::for_label("iso-2022-jp").unwrap();
        let buf = encode("\u{3042}", jis).unwrap();
        // ESC $ B, two bytes, ESC ( B
        assert_eq!(buf.as_slice(), b"\x1b$B\x24\x22\x1b(B");
    }

    #[test]
    fn test_decode_only_charset_rejected() {
        let utf16 = Charset::for_label("utf-16be").unwrap();
        let err = encode("x", utf16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedCharset);
    }
}
