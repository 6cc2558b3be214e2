use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::Buf;
use encoding_rs::{CoderResult, Decoder};

use super::{estimate, Charset};
use crate::buffer::double_string_capacity;
use crate::error::{Error, Result};

const READ_CHUNK: usize = 4096;

/// Feeds one chunk to `decoder`, doubling `out` until the chunk is consumed.
///
/// With `last` set this also flushes whatever the decoder still holds; a
/// partial sequence at the very end then decodes to U+FFFD.
fn decode_into(decoder: &mut Decoder, mut src: &[u8], out: &mut String, last: bool) {
    loop {
        let (result, read, _) = decoder.decode_to_string(src, out, last);
        src = &src[read..];
        match result {
            CoderResult::InputEmpty => return,
            CoderResult::OutputFull => double_string_capacity(out),
        }
    }
}

fn new_decoder(charset: Charset) -> Decoder {
    charset.encoding().new_decoder_without_bom_handling()
}

/// Decodes a complete byte sequence.
///
/// Malformed input becomes U+FFFD rather than an error.
pub fn decode(bytes: &[u8], charset: Charset) -> String {
    decode_chunks(&[bytes], charset)
}

/// Decodes and consumes every unread byte of `buf`.
pub fn decode_buf<B: Buf>(buf: &mut B, charset: Charset) -> String {
    let mut decoder = ChunkDecoder::with_capacity(
        charset,
        estimate(buf.remaining(), charset.average_chars_per_byte()),
    );
    while buf.has_remaining() {
        let n = buf.chunk().len();
        decoder.push(buf.chunk());
        buf.advance(n);
    }
    decoder.finish()
}

/// Decodes several chunks as one stream.
///
/// Only the last chunk is final, so a character split across two chunks
/// decodes exactly as if the bytes had arrived together.
pub fn decode_chunks<C: AsRef<[u8]>>(chunks: &[C], charset: Charset) -> String {
    let total: usize = chunks.iter().map(|c| c.as_ref().len()).sum();
    let mut decoder = new_decoder(charset);
    let mut out = String::with_capacity(estimate(total, charset.average_chars_per_byte()));

    let last = chunks.len().saturating_sub(1);
    for (i, chunk) in chunks.iter().enumerate() {
        decode_into(&mut decoder, chunk.as_ref(), &mut out, i == last);
    }
    if chunks.is_empty() {
        decode_into(&mut decoder, &[], &mut out, true);
    }
    out
}

/// A decode session spanning chunks that arrive one at a time, such as the
/// data callbacks of a readable handle.
pub struct ChunkDecoder {
    decoder: Decoder,
    charset: Charset,
    out: String,
}

impl ChunkDecoder {
    pub fn new(charset: Charset) -> Self {
        Self::with_capacity(charset, 0)
    }

    fn with_capacity(charset: Charset, capacity: usize) -> Self {
        Self {
            decoder: new_decoder(charset),
            charset,
            out: String::with_capacity(capacity),
        }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Decodes `chunk`. Bytes of an incomplete trailing character are held
    /// back until the next push.
    pub fn push(&mut self, chunk: &[u8]) {
        let wanted = estimate(chunk.len(), self.charset.average_chars_per_byte());
        self.out.reserve(wanted);
        decode_into(&mut self.decoder, chunk, &mut self.out, false);
    }

    /// Takes the text decoded so far without ending the session.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    /// Ends the session, flushing held-back bytes, and returns remaining text.
    pub fn finish(mut self) -> String {
        decode_into(&mut self.decoder, &[], &mut self.out, true);
        self.out
    }
}

/// Reads `reader` to the end and decodes everything it produced.
pub fn read_to_string<R: Read>(mut reader: R, charset: Charset) -> Result<String> {
    let mut decoder = ChunkDecoder::new(charset);
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => decoder.push(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::from(e)),
        }
    }
    Ok(decoder.finish())
}

/// Reads and decodes a whole file.
pub fn read_file<P: AsRef<Path>>(path: P, charset: Charset) -> Result<String> {
    let file = File::open(path)?;
    read_to_string(file, charset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    #[test]
    fn test_round_trip() {
        for text in ["plain ascii", "caf\u{e9}", "\u{20AC}100", "\u{1F980} crab", ""] {
            let buf = encode(text, Charset::utf8()).unwrap();
            assert_eq!(decode(buf.as_slice(), Charset::utf8()), text);
        }

        let sjis = Charset::for_label("shift_jis").unwrap();
        let text = "\u{65E5}\u{672C}\u{8A9E}\u{30C6}\u{30AD}\u{30B9}\u{30C8}";
        let buf = encode(text, sjis).unwrap();
        assert_eq!(decode(buf.as_slice(), sjis), text);
    }

    #[test]
    fn test_split_character_across_chunks() {
        let bytes = "a\u{1F980}b".as_bytes();
        let whole = decode(bytes, Charset::utf8());

        // Cut inside the four-byte crab.
        for cut in 2..5 {
            let split = decode_chunks(&[&bytes[..cut], &bytes[cut..]], Charset::utf8());
            assert_eq!(split, whole);
        }
    }

    #[test]
    fn test_chunk_decoder_holds_partial_sequence() {
        let bytes = "\u{e9}t\u{e9}".as_bytes();
        let mut decoder = ChunkDecoder::new(Charset::utf8());

        decoder.push(&bytes[..1]);
        assert_eq!(decoder.take(), "");

        decoder.push(&bytes[1..4]);
        assert_eq!(decoder.take(), "\u{e9}t");

        decoder.push(&bytes[4..]);
        assert_eq!(decoder.finish(), "\u{e9}");
    }

    #[test]
    fn test_truncated_input_flushes_replacement() {
        let bytes = "\u{20AC}".as_bytes();
        assert_eq!(decode(&bytes[..2], Charset::utf8()), "\u{FFFD}");
    }

    #[test]
    fn test_decode_buf_consumes() {
        let mut buf = crate::buffer::Buffer::copy_from_slice(b"consumed");
        assert_eq!(decode_buf(&mut buf, Charset::utf8()), "consumed");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_utf16() {
        let utf16 = Charset::for_label("utf-16le").unwrap();
        assert_eq!(decode(&[0x68, 0x00, 0x69, 0x00], utf16), "hi");
        assert_eq!(decode_chunks(&[&[0x68][..], &[0x00, 0x69, 0x00][..]], utf16), "hi");
    }

    #[test]
    fn test_no_chunks() {
        let chunks: [&[u8]; 0] = [];
        assert_eq!(decode_chunks(&chunks, Charset::utf8()), "");
    }

    #[test]
    fn test_read_to_string() {
        let reader = std::io::Cursor::new("line one\nline two \u{2713}\n".as_bytes().to_vec());
        let text = read_to_string(reader, Charset::utf8()).unwrap();
        assert_eq!(text, "line one\nline two \u{2713}\n");
    }
}
