//! Worker pool for blocking jobs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use super::Job;
use crate::error::{Error, ErrorKind, Result};

/// Runs blocking jobs off the event loop thread.
///
/// Implementations must not bound the number of concurrently running jobs
/// so tightly that one blocked job starves another handle's read loop.
pub trait WorkerPool: Send + Sync {
    fn submit(&self, job: Job) -> JobHandle;
}

/// Handle to a submitted job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl JobHandle {
    /// A handle with nothing to abort beyond the cancellation flag.
    pub fn detached() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            abort: None,
        }
    }

    /// Best-effort cancellation: a job that has not started yet never runs;
    /// a running job is left to notice on its own.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.abort.as_ref().is_some_and(AbortHandle::is_finished)
    }
}

/// A [`WorkerPool`] on top of the tokio blocking thread pool.
#[derive(Debug, Clone)]
pub struct BlockingPool {
    handle: Handle,
}

impl BlockingPool {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the tokio runtime the caller is running in.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| Error::with_message(ErrorKind::Unavailable, e.to_string()))
    }
}

impl WorkerPool for BlockingPool {
    fn submit(&self, job: Job) -> JobHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let task = self.handle.spawn_blocking(move || {
            if flag.load(Ordering::Acquire) {
                log::trace!("blocking job cancelled before start");
                return;
            }
            job();
        });
        JobHandle {
            cancelled,
            abort: Some(task.abort_handle()),
        }
    }
}
