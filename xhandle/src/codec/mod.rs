//! Charset transcoding between raw bytes and text.
//!
//! Both directions size their output from an average ratio for the charset and
//! double the output whenever the codec reports it is full, so the result is
//! built in a handful of allocations even for long multi-byte input.
//!
//! ```rust,ignore
//! use xhandle::codec::{self, Charset};
//!
//! let charset: Charset = "shift_jis".parse()?;
//! let buf = codec::encode("こんにちは", charset)?;
//! assert_eq!(codec::decode(buf.as_slice(), charset), "こんにちは");
//! ```

mod decode;
mod encode;

pub use decode::{decode, decode_buf, decode_chunks, read_file, read_to_string, ChunkDecoder};
pub use encode::encode;

use core::fmt;
use core::str::FromStr;

use encoding_rs::Encoding;

use crate::error::{Error, ErrorKind, Result};

/// A named character set.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Charset(&'static Encoding);

impl Charset {
    pub fn utf8() -> Self {
        Charset(encoding_rs::UTF_8)
    }

    /// Looks up a charset by one of its registered labels ("utf-8", "latin1",
    /// "shift_jis", ...). Labels are matched case-insensitively.
    pub fn for_label(label: &str) -> Result<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Charset)
            .ok_or_else(|| {
                Error::with_message(
                    ErrorKind::UnsupportedCharset,
                    format!("unknown charset '{}'", label),
                )
            })
    }

    /// Canonical name of the charset.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// UTF-16 and the replacement charset decode only.
    pub fn can_encode(&self) -> bool {
        self.0.output_encoding() == self.0
    }

    pub(crate) fn encoding(&self) -> &'static Encoding {
        self.0
    }

    /// Typical encoded bytes per character, used to size encode output.
    pub fn average_bytes_per_char(&self) -> f32 {
        if self.0 == encoding_rs::UTF_8 {
            1.1
        } else if self.0.is_single_byte() {
            1.0
        } else {
            2.0
        }
    }

    /// Typical decoded text bytes per input byte, used to size decode output.
    pub fn average_chars_per_byte(&self) -> f32 {
        if self.0 == encoding_rs::UTF_8 || self.0.is_single_byte() {
            1.0
        } else {
            1.5
        }
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        Self::for_label(label)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Charset({})", self.name())
    }
}

/// Initial output capacity for `len` input units at `ratio` output units each.
pub(crate) fn estimate(len: usize, ratio: f32) -> usize {
    (len as f32 * ratio) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_label() {
        assert_eq!(Charset::for_label("UTF-8").unwrap(), Charset::utf8());
        assert_eq!(Charset::for_label(" utf8 ").unwrap().name(), "UTF-8");
        assert_eq!("Shift_JIS".parse::<Charset>().unwrap().name(), "Shift_JIS");

        let err = Charset::for_label("klingon").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedCharset);
    }

    #[test]
    fn test_encode_capability() {
        assert!(Charset::utf8().can_encode());
        assert!(Charset::for_label("latin1").unwrap().can_encode());
        assert!(!Charset::for_label("utf-16le").unwrap().can_encode());
    }
}
