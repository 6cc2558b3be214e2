//! Handles: asynchronous-style operations over open I/O resources.
//!
//! Every handle implements [`Handle`]. Operations a handle kind does not
//! support fail synchronously with [`ErrorKind::NotCapable`]; check
//! [`Handle::capabilities`] first to avoid that. Per-operation outcomes are
//! delivered through callbacks:
//! - read callbacks always run on the host's task queue, never on a worker
//!   thread ([`submit_read_callback`]),
//! - write callbacks of the synchronous handles here run inline, before
//!   `write` returns.
//!
//! [`ErrorKind::NotCapable`]: crate::error::ErrorKind::NotCapable

mod readable;
mod writable;

pub use readable::ReadableStreamHandle;
pub use writable::WritableStreamHandle;

use core::any::Any;
use core::fmt;
use core::ops::BitOr;
use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::codec::{self, Charset};
use crate::error::{Error, Result};
use crate::runtime::Host;

/// Opaque caller token handed back unchanged in every callback.
#[derive(Clone, Default)]
pub struct Context(Option<Arc<dyn Any + Send + Sync>>);

impl Context {
    pub fn none() -> Self {
        Context(None)
    }

    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Context(Some(Arc::new(value)))
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|value| value.downcast_ref::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Context(..)"),
            None => f.write_str("Context(None)"),
        }
    }
}

/// One read callback invocation.
///
/// Data chunks carry `data` and no error. The terminal event of a read
/// session carries either an `Eof` error with `eof` set, or an `Io` error.
#[derive(Debug, Clone)]
pub struct ReadEvent {
    pub context: Context,
    pub error: Option<Error>,
    pub data: Option<Bytes>,
    pub eof: bool,
}

impl ReadEvent {
    pub fn data(context: Context, data: Bytes) -> Self {
        Self {
            context,
            error: None,
            data: Some(data),
            eof: false,
        }
    }

    pub fn error(context: Context, error: Error) -> Self {
        let eof = error.is_eof();
        Self {
            context,
            error: Some(error),
            data: None,
            eof,
        }
    }

    /// True for the last event of a read session.
    pub fn is_terminal(&self) -> bool {
        self.error.is_some()
    }
}

/// One write callback invocation.
#[derive(Debug, Clone)]
pub struct WriteEvent {
    pub context: Context,
    pub error: Option<Error>,
    pub completed: bool,
}

pub type ReadCallback = Arc<dyn Fn(ReadEvent) + Send + Sync>;
pub type WriteCallback = Box<dyn FnOnce(WriteEvent) + Send>;

/// Operations a handle supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const READ: Capabilities = Capabilities(1);
    pub const WRITE: Capabilities = Capabilities(1 << 1);

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn can_read(self) -> bool {
        self.contains(Self::READ)
    }

    pub fn can_write(self) -> bool {
        self.contains(Self::WRITE)
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Idle,
    Reading,
    Closed,
}

/// An open I/O resource.
///
/// Only [`close`](Handle::close) is mandatory. The remaining operations
/// default to "not capable", except `write_text`, which encodes and then
/// goes through `write`, and `writes_outstanding`, which defaults to 0.
pub trait Handle: Send {
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    fn state(&self) -> HandleState;

    /// Writes the unread bytes of `buf`, returning how many were written.
    fn write(&mut self, buf: &mut dyn Buf, context: Context, callback: WriteCallback) -> Result<usize> {
        let _ = (buf, context, callback);
        Err(Error::not_capable("write"))
    }

    /// Encodes `text` in `charset` and writes the result.
    fn write_text(
        &mut self,
        text: &str,
        charset: Charset,
        context: Context,
        callback: WriteCallback,
    ) -> Result<usize> {
        let mut buf = codec::encode(text, charset)?;
        self.write(&mut buf, context, callback)
    }

    /// Writes accepted but not yet finished.
    fn writes_outstanding(&self) -> usize {
        0
    }

    /// Starts delivering data to `callback` until end of input, an error or
    /// [`stop_reading`](Handle::stop_reading).
    fn start_reading(&mut self, context: Context, callback: ReadCallback) -> Result<()> {
        let _ = (context, callback);
        Err(Error::not_capable("start_reading"))
    }

    fn stop_reading(&mut self) -> Result<()> {
        Err(Error::not_capable("stop_reading"))
    }

    /// Releases the resource. Never fails; release errors are swallowed.
    fn close(&mut self);
}

/// Hands a read result to the host's task queue, which runs `callback`
/// exactly once on its own thread.
///
/// Fails only when the queue no longer accepts tasks, in which case the
/// callback never runs.
pub fn submit_read_callback(
    host: &Host,
    context: Context,
    error: Option<Error>,
    data: Option<Bytes>,
    callback: &ReadCallback,
) -> Result<()> {
    let event = match error {
        Some(error) => ReadEvent::error(context, error),
        None => ReadEvent {
            context,
            error: None,
            data,
            eof: false,
        },
    };
    let callback = Arc::clone(callback);
    host.tasks().enqueue(Box::new(move || callback(event)))
}
