//! # XHandle - Callback Handles over Blocking Streams
//!
//! XHandle lets a single-threaded, callback-driven host use ordinary blocking
//! byte streams (files, pipes, sockets, stdio):
//!
//! - **Readable handles**: a worker thread reads in chunks and hands every chunk
//!   back to the host's task queue
//! - **Writable handles**: synchronous writes with inline completion callbacks
//! - **Liveness pinning**: the host event loop stays alive while reads are pending
//! - **Charset codecs**: text to bytes and back, across chunk boundaries
//! - **Growable buffers**: a cursor-carrying byte buffer that doubles on demand
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Host (single-threaded callbacks)            │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────┐   │
//! │  │  EventLoop  │ │ PinCounter  │ │   WorkerPool    │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────┘   │
//! ├─────────────────────────────────────────────────────────┤
//! │                      Handle Layer                        │
//! │  ┌───────────────────────┐ ┌───────────────────────┐   │
//! │  │ ReadableStreamHandle  │ │ WritableStreamHandle  │   │
//! │  └───────────────────────┘ └───────────────────────┘   │
//! ├─────────────────────────────────────────────────────────┤
//! │                  Buffer / Codec Layer                    │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────┐   │
//! │  │   Buffer    │ │   Charset   │ │  ChunkDecoder   │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────┘   │
//! ├─────────────────────────────────────────────────────────┤
//! │               Blocking stream (Read/Write)               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xhandle::{Context, EventLoop, Handle, Host, ReadableStreamHandle};
//!
//! let mut event_loop = EventLoop::new();
//! let host = Host::for_loop(&event_loop)?;
//!
//! let mut handle = ReadableStreamHandle::new(host, std::io::stdin());
//! handle.start_reading(Context::none(), Arc::new(|event| {
//!     if let Some(data) = &event.data {
//!         println!("{} bytes", data.len());
//!     }
//! }))?;
//!
//! // Returns once stdin has ended and every callback has run.
//! event_loop.run().await;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod handle;
pub mod io;
pub mod runtime;
pub mod text;

// Re-export commonly used types
pub use buffer::Buffer;
pub use codec::{Charset, ChunkDecoder};
pub use config::{HandleConfig, RuntimeConfig};
pub use error::{Error, ErrorKind, Result};
pub use handle::{
    submit_read_callback, Capabilities, Context, Handle, HandleState, ReadCallback, ReadEvent,
    ReadableStreamHandle, WritableStreamHandle, WriteCallback, WriteEvent,
};
pub use io::Interrupter;
pub use runtime::{BlockingPool, EventLoop, Host, LoopHandle, PinCounter, PinGuard, WorkerPool};

/// Default number of bytes a readable handle asks for per blocking read
pub const DEFAULT_READ_CHUNK_SIZE: usize = 16 * 1024;
