//! Buffer management for the handle layer.
//!
//! This module provides:
//! - Buffer: growable byte buffer with a read cursor
//! - capacity doubling helpers shared by the charset codecs

mod growable;

pub use growable::{concat, Buffer};

/// Grows `vec` so its capacity is at least double the previous one (minimum 1).
///
/// Elements already written stay where they are.
pub fn double_capacity<T>(vec: &mut Vec<T>) {
    let target = core::cmp::max(vec.capacity() * 2, 1);
    vec.reserve_exact(target - vec.len());
}

/// String counterpart of [`double_capacity`].
pub fn double_string_capacity(s: &mut String) {
    let target = core::cmp::max(s.capacity() * 2, 1);
    s.reserve_exact(target - s.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_from_empty() {
        let mut vec: Vec<u8> = Vec::new();
        double_capacity(&mut vec);
        assert!(vec.capacity() >= 1);
    }

    #[test]
    fn test_double_preserves_content() {
        let mut vec = Vec::with_capacity(4);
        vec.extend_from_slice(b"abcd");
        let before = vec.capacity();

        double_capacity(&mut vec);
        assert!(vec.capacity() >= before * 2);
        assert_eq!(&vec[..], b"abcd");

        let mut s = String::with_capacity(3);
        s.push_str("h\u{e9}");
        double_string_capacity(&mut s);
        assert!(s.capacity() >= 6);
        assert_eq!(s, "h\u{e9}");
    }
}
