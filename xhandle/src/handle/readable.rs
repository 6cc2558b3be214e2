//! Readable handle over a blocking byte stream.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use super::{submit_read_callback, Capabilities, Context, Handle, HandleState, ReadCallback, ReadEvent};
use crate::config::HandleConfig;
use crate::error::{Error, Result};
use crate::io::{read_chunk, Interrupter, ReadOutcome};
use crate::runtime::{Host, JobHandle, PinGuard};

/// One `start_reading` .. `stop_reading`/EOF/error span.
struct ReadSession {
    reading: AtomicBool,
    pin: Mutex<Option<PinGuard>>,
}

impl ReadSession {
    fn new(pin: PinGuard) -> Self {
        Self {
            reading: AtomicBool::new(true),
            pin: Mutex::new(Some(pin)),
        }
    }

    fn is_reading(&self) -> bool {
        self.reading.load(Ordering::Acquire)
    }

    /// Ends the session and unpins. Returns false if it had already ended.
    fn finish(&self) -> bool {
        let was_reading = self.reading.swap(false, Ordering::AcqRel);
        drop(self.pin.lock().take());
        was_reading
    }
}

/// Delivers a blocking stream's bytes to a callback on the host task queue.
///
/// Reads happen on a worker thread in chunks of `read_chunk_size`. While a
/// session is active the host is pinned. Data read after `stop_reading` is
/// discarded, even if it was already queued.
///
/// A read blocked inside the OS is only unblocked if the handle was built
/// with an [`Interrupter`]; without one the worker stays parked until the
/// stream produces data or ends, and no callback follows either way.
pub struct ReadableStreamHandle<R: Read + Send + 'static> {
    host: Host,
    config: HandleConfig,
    stream: Arc<Mutex<Option<R>>>,
    interrupter: Option<Interrupter>,
    session: Option<Arc<ReadSession>>,
    job: Option<JobHandle>,
    closed: Arc<AtomicBool>,
}

impl<R: Read + Send + 'static> ReadableStreamHandle<R> {
    pub fn new(host: Host, stream: R) -> Self {
        Self::with_config(host, stream, HandleConfig::default())
    }

    pub fn with_config(host: Host, stream: R, config: HandleConfig) -> Self {
        Self {
            host,
            config,
            stream: Arc::new(Mutex::new(Some(stream))),
            interrupter: None,
            session: None,
            job: None,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Installs the hook `stop_reading` uses to unblock a parked read.
    pub fn with_interrupter(mut self, interrupter: Interrupter) -> Self {
        self.interrupter = Some(interrupter);
        self
    }

    pub fn is_reading(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_reading())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl<R: Read + Send + 'static> Handle for ReadableStreamHandle<R> {
    fn capabilities(&self) -> Capabilities {
        Capabilities::READ
    }

    fn state(&self) -> HandleState {
        if self.is_closed() {
            HandleState::Closed
        } else if self.is_reading() {
            HandleState::Reading
        } else {
            HandleState::Idle
        }
    }

    fn start_reading(&mut self, context: Context, callback: ReadCallback) -> Result<()> {
        if self.is_reading() {
            log::trace!("start_reading: already reading");
            return Ok(());
        }

        let session = Arc::new(ReadSession::new(self.host.pins().pin()));
        let reader = ReadLoop {
            host: self.host.clone(),
            stream: Arc::clone(&self.stream),
            closed: Arc::clone(&self.closed),
            session: Arc::clone(&session),
            context,
            callback,
            chunk_size: self.config.read_chunk_size,
        };

        self.session = Some(session);
        self.job = Some(self.host.pool().submit(Box::new(move || reader.run())));
        Ok(())
    }

    fn stop_reading(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        if !session.finish() {
            return Ok(());
        }

        log::debug!("stop_reading: interrupting read loop");
        if let Some(interrupter) = &self.interrupter {
            interrupter.interrupt();
        }
        if let Some(job) = self.job.take() {
            job.cancel();
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.stop_reading();

        // A running loop holds the lock and releases the stream itself once it
        // sees `closed`.
        if let Some(mut guard) = self.stream.try_lock() {
            drop(guard.take());
            log::debug!("readable stream released");
        }
    }
}

impl<R: Read + Send + 'static> Drop for ReadableStreamHandle<R> {
    fn drop(&mut self) {
        self.close();
    }
}

/// The worker side of one read session.
struct ReadLoop<R> {
    host: Host,
    stream: Arc<Mutex<Option<R>>>,
    closed: Arc<AtomicBool>,
    session: Arc<ReadSession>,
    context: Context,
    callback: ReadCallback,
    chunk_size: usize,
}

impl<R: Read> ReadLoop<R> {
    fn run(self) {
        // Holding the lock for the whole loop keeps a restarted session from
        // reading until the previous loop has exited.
        let mut guard = self.stream.lock();
        match guard.as_mut() {
            Some(stream) => self.read_until_done(stream),
            None => {
                log::debug!("read loop: stream already released");
                self.finish_with(Error::eof());
            }
        }
        drop(guard);

        if self.closed.load(Ordering::SeqCst) {
            drop(self.stream.lock().take());
            log::debug!("readable stream released by read loop");
        }
    }

    fn read_until_done(&self, stream: &mut R) {
        log::debug!("read loop started, chunk size {}", self.chunk_size);
        let mut chunk = vec![0u8; self.chunk_size];

        while self.session.is_reading() {
            match read_chunk(stream, &mut chunk) {
                ReadOutcome::Data(n) => {
                    log::trace!("read {} bytes", n);
                    self.deliver(Bytes::copy_from_slice(&chunk[..n]));
                }
                ReadOutcome::Eof => {
                    log::debug!("read loop reached end of stream");
                    self.finish_with(Error::eof());
                    return;
                }
                ReadOutcome::Cancelled => {
                    if self.session.is_reading() {
                        log::trace!("read interrupted while still reading, retrying");
                        continue;
                    }
                    break;
                }
                ReadOutcome::Failed(e) => {
                    log::debug!("read loop failed: {}", e);
                    self.finish_with(e);
                    return;
                }
            }
        }
        log::debug!("read loop stopped");
    }

    fn deliver(&self, data: Bytes) {
        let session = Arc::clone(&self.session);
        let user = Arc::clone(&self.callback);
        let callback: ReadCallback = Arc::new(move |event: ReadEvent| {
            if session.is_reading() {
                user(event);
            } else {
                log::trace!("discarding chunk read before stop");
            }
        });
        if let Err(e) = submit_read_callback(&self.host, self.context.clone(), None, Some(data), &callback) {
            log::warn!("dropping read chunk: {}", e);
        }
    }

    /// Queues the terminal callback. The session ends and unpins on the
    /// task queue, right before the callback runs.
    fn finish_with(&self, error: Error) {
        let session = Arc::clone(&self.session);
        let user = Arc::clone(&self.callback);
        let callback: ReadCallback = Arc::new(move |event: ReadEvent| {
            if session.finish() {
                user(event);
            }
        });
        if let Err(e) = submit_read_callback(&self.host, self.context.clone(), Some(error), None, &callback) {
            log::warn!("dropping terminal read callback: {}", e);
            self.session.finish();
        }
    }
}
