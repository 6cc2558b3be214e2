use std::io;
use std::time::Duration;

use crate::DEFAULT_READ_CHUNK_SIZE;

/// Per-handle settings.
#[derive(Debug, Clone)]
pub struct HandleConfig {
    pub read_chunk_size: usize,
}

impl HandleConfig {
    pub fn new() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings for the runtime that carries the event loop and the blocking pool.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub max_blocking_threads: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self {
            max_blocking_threads: 512,
            thread_name: "xhandle-io".to_string(),
            thread_keep_alive: Duration::from_secs(10),
        }
    }

    pub fn with_max_blocking_threads(mut self, threads: usize) -> Self {
        self.max_blocking_threads = threads.max(1);
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_thread_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.thread_keep_alive = keep_alive;
        self
    }

    /// Builds a current-thread runtime. The thread that calls `block_on` on it
    /// becomes the event loop thread; blocking reads go to its blocking pool.
    pub fn build(&self) -> io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .max_blocking_threads(self.max_blocking_threads)
            .thread_name(self.thread_name.clone())
            .thread_keep_alive(self.thread_keep_alive)
            .build()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
