//! Writable handle over a blocking byte stream.

use std::io::Write;

use bytes::Buf;

use super::{Capabilities, Context, Handle, HandleState, WriteCallback, WriteEvent};
use crate::error::{Error, ErrorKind, Result};
use crate::io::write_buf;

/// Writes synchronously and reports completion inline, before `write`
/// returns. Nothing is ever queued, so `writes_outstanding` is always 0.
///
/// On failure the callback gets an `Io` error and `write` returns 0. Part of
/// the buffer may still have reached the stream by then; that is not
/// reconciled.
pub struct WritableStreamHandle<W: Write + Send> {
    stream: Option<W>,
}

impl<W: Write + Send> WritableStreamHandle<W> {
    pub fn new(stream: W) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.stream.as_ref()
    }

    /// Closes the handle and hands back the stream, flushed.
    pub fn into_inner(mut self) -> Option<W> {
        let mut stream = self.stream.take()?;
        if let Err(e) = stream.flush() {
            log::debug!("flush on into_inner failed: {}", e);
        }
        Some(stream)
    }
}

impl<W: Write + Send> Handle for WritableStreamHandle<W> {
    fn capabilities(&self) -> Capabilities {
        Capabilities::WRITE
    }

    fn state(&self) -> HandleState {
        if self.is_closed() {
            HandleState::Closed
        } else {
            HandleState::Idle
        }
    }

    fn write(&mut self, buf: &mut dyn Buf, context: Context, callback: WriteCallback) -> Result<usize> {
        let result = match self.stream.as_mut() {
            Some(stream) => write_buf(stream, buf).map_err(Error::from),
            None => Err(Error::with_message(ErrorKind::Io, "stream closed")),
        };

        match result {
            Ok(len) => {
                log::trace!("wrote {} bytes", len);
                callback(WriteEvent {
                    context,
                    error: None,
                    completed: true,
                });
                Ok(len)
            }
            Err(e) => {
                log::debug!("write failed: {}", e);
                callback(WriteEvent {
                    context,
                    error: Some(e),
                    completed: true,
                });
                Ok(0)
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.flush() {
                log::debug!("flush on close failed: {}", e);
            }
            drop(stream);
            log::debug!("writable stream released");
        }
    }
}

impl<W: Write + Send> Drop for WritableStreamHandle<W> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use crate::codec::Charset;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<WriteEvent>>>, impl Fn() -> WriteCallback) {
        let events: Arc<Mutex<Vec<WriteEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let make = move || -> WriteCallback {
            let sink = Arc::clone(&sink);
            Box::new(move |event: WriteEvent| sink.lock().push(event))
        };
        (events, make)
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
        }
    }

    #[test]
    fn test_write_completes_inline() {
        let mut handle = WritableStreamHandle::new(Vec::new());
        let (events, callback) = recorder();
        let mut buf = Buffer::copy_from_slice(b"hello");

        let written = handle.write(&mut buf, Context::new(7u8), callback()).unwrap();
        assert_eq!(written, 5);
        assert!(buf.is_empty());
        assert_eq!(handle.get_ref().unwrap(), b"hello");

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert!(events[0].completed);
        assert!(events[0].error.is_none());
        assert_eq!(events[0].context.downcast_ref::<u8>(), Some(&7));
        assert_eq!(handle.writes_outstanding(), 0);
    }

    #[test]
    fn test_write_fragmented_buf() {
        let mut handle = WritableStreamHandle::new(Vec::new());
        let (_events, callback) = recorder();
        let mut buf = Bytes::from_static(b"head-").chain(Bytes::from_static(b"tail"));

        assert_eq!(handle.write(&mut buf, Context::none(), callback()).unwrap(), 9);
        assert!(!buf.has_remaining());
        assert_eq!(handle.into_inner().unwrap(), b"head-tail");
    }

    #[test]
    fn test_write_failure_reports_io() {
        let mut handle = WritableStreamHandle::new(BrokenPipe);
        let (events, callback) = recorder();
        let mut buf = Buffer::copy_from_slice(b"lost");

        assert_eq!(handle.write(&mut buf, Context::none(), callback()).unwrap(), 0);
        assert_eq!(buf.len(), 4);

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].error.as_ref().map(Error::kind), Some(ErrorKind::Io));
        assert!(events[0].completed);
        drop(events);

        // flush failure is swallowed
        handle.close();
        assert_eq!(handle.state(), HandleState::Closed);
    }

    #[test]
    fn test_write_after_close() {
        let mut handle = WritableStreamHandle::new(Vec::new());
        let (events, callback) = recorder();
        handle.close();
        handle.close();

        let mut buf = Bytes::from_static(b"x");
        assert_eq!(handle.write(&mut buf, Context::none(), callback()).unwrap(), 0);
        assert_eq!(events.lock()[0].error.as_ref().map(Error::code), Some("EIO"));
    }

    #[test]
    fn test_write_text_encodes() {
        let mut handle = WritableStreamHandle::new(Vec::new());
        let (_events, callback) = recorder();

        let latin1 = Charset::for_label("latin1").unwrap();
        assert_eq!(handle.write_text("caf\u{e9}", latin1, Context::none(), callback()).unwrap(), 4);
        assert_eq!(handle.write_text("\u{e9}", Charset::utf8(), Context::none(), callback()).unwrap(), 2);
        assert_eq!(handle.get_ref().unwrap(), b"caf\xe9\xc3\xa9");
    }

    #[test]
    fn test_read_ops_not_capable() {
        let mut handle = WritableStreamHandle::new(io::sink());
        assert!(handle.capabilities().can_write());
        assert!(!handle.capabilities().can_read());

        let err = handle.start_reading(Context::none(), Arc::new(|_: crate::handle::ReadEvent| {})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotCapable);
        assert_eq!(handle.stop_reading().unwrap_err().kind(), ErrorKind::NotCapable);
    }
}
