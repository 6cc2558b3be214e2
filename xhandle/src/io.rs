use std::io::{self, Read, Write};
use std::sync::Arc;

use bytes::Buf;

use crate::error::{Error, ErrorKind};

/// Result of one blocking read, already classified.
#[derive(Debug)]
pub enum ReadOutcome {
    /// This many bytes were placed at the start of the chunk.
    Data(usize),
    /// End of input, including a stream that reports itself closed.
    Eof,
    /// The read was interrupted.
    Cancelled,
    /// Any other failure.
    Failed(Error),
}

/// Performs one blocking read into `chunk`.
pub fn read_chunk<R: Read + ?Sized>(reader: &mut R, chunk: &mut [u8]) -> ReadOutcome {
    match reader.read(chunk) {
        Ok(0) => ReadOutcome::Eof,
        Ok(n) => ReadOutcome::Data(n),
        Err(e) => {
            let err = Error::from_read_error(e);
            match err.kind() {
                ErrorKind::Eof => ReadOutcome::Eof,
                ErrorKind::Cancelled => ReadOutcome::Cancelled,
                _ => ReadOutcome::Failed(err),
            }
        }
    }
}

/// Writes every unread byte of `buf` and advances it past them.
///
/// A contiguous buffer is written straight from its storage; a fragmented
/// one is gathered into a temporary copy first, which consumes it up front.
pub fn write_buf<W: Write + ?Sized>(writer: &mut W, buf: &mut dyn Buf) -> io::Result<usize> {
    let len = buf.remaining();
    if buf.chunk().len() == len {
        writer.write_all(buf.chunk())?;
        buf.advance(len);
    } else {
        let tmp = buf.copy_to_bytes(len);
        writer.write_all(&tmp)?;
    }
    Ok(len)
}

/// Unblocks a read that is parked inside the OS.
///
/// There is no portable way to interrupt a blocking read, so the opener of
/// a stream supplies one when it knows how (shutting down a socket, closing
/// the write end of a pipe, ...).
#[derive(Clone)]
pub struct Interrupter(Arc<dyn Fn() + Send + Sync>);

impl Interrupter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Interrupter(Arc::new(f))
    }

    /// Shuts down the read half of a TCP socket. Pass a `try_clone` of the
    /// stream being read.
    pub fn tcp(stream: std::net::TcpStream) -> Self {
        Self::new(move || {
            if let Err(e) = stream.shutdown(std::net::Shutdown::Read) {
                log::debug!("tcp read shutdown failed: {}", e);
            }
        })
    }

    /// Shuts down the read half of a Unix socket. Pass a `try_clone` of the
    /// stream being read.
    #[cfg(unix)]
    pub fn unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self::new(move || {
            if let Err(e) = stream.shutdown(std::net::Shutdown::Read) {
                log::debug!("unix read shutdown failed: {}", e);
            }
        })
    }

    pub fn interrupt(&self) {
        (self.0)()
    }
}

impl core::fmt::Debug for Interrupter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Interrupter")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingReader(io::ErrorKind, &'static str);

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(self.0, self.1))
        }
    }

    #[test]
    fn test_read_chunk_outcomes() {
        let mut chunk = [0u8; 8];

        let mut reader = Cursor::new(b"abc".to_vec());
        assert!(matches!(read_chunk(&mut reader, &mut chunk), ReadOutcome::Data(3)));
        assert!(matches!(read_chunk(&mut reader, &mut chunk), ReadOutcome::Eof));

        let mut closed = FailingReader(io::ErrorKind::Other, "stream closed");
        assert!(matches!(read_chunk(&mut closed, &mut chunk), ReadOutcome::Eof));

        let mut interrupted = FailingReader(io::ErrorKind::Interrupted, "stop");
        assert!(matches!(read_chunk(&mut interrupted, &mut chunk), ReadOutcome::Cancelled));

        let mut broken = FailingReader(io::ErrorKind::ConnectionReset, "reset");
        match read_chunk(&mut broken, &mut chunk) {
            ReadOutcome::Failed(e) => assert_eq!(e.kind(), ErrorKind::Io),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_write_buf_contiguous() {
        let mut out = Vec::new();
        let mut buf = crate::buffer::Buffer::copy_from_slice(b"direct");
        assert_eq!(write_buf(&mut out, &mut buf).unwrap(), 6);
        assert_eq!(out, b"direct");
        assert!(!buf.has_remaining());
    }

    #[test]
    fn test_write_buf_fragmented() {
        let mut out = Vec::new();
        let mut buf = bytes::Bytes::from_static(b"frag").chain(&b"mented"[..]);
        assert_eq!(write_buf(&mut out, &mut buf).unwrap(), 10);
        assert_eq!(out, b"fragmented");
        assert!(!buf.has_remaining());
    }

    #[test]
    fn test_interrupter_calls_closure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let interrupter = Interrupter::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        interrupter.clone().interrupt();
        interrupter.interrupt();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
