//! Host collaborators the handles are built on.
//!
//! A handle needs three things from its host:
//! - a [`TaskQueue`] that runs callbacks one at a time, in order, on the
//!   script thread ([`EventLoop`] / [`LoopHandle`]),
//! - a [`WorkerPool`] for blocking reads ([`BlockingPool`]),
//! - a [`PinCounter`] that keeps the event loop alive while reads are pending.
//!
//! [`Host`] bundles them and is cloned into every handle.

mod event_loop;
mod pin;
mod pool;

pub use event_loop::{EventLoop, LoopHandle};
pub use pin::{PinCounter, PinGuard};
pub use pool::{BlockingPool, JobHandle, WorkerPool};

use std::sync::Arc;

use crate::error::Result;

/// A unit of work for the event loop thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A unit of blocking work for the worker pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Accepts tasks for later, in-order, single-threaded execution.
pub trait TaskQueue: Send + Sync {
    /// Fails only when the executing side is gone; the task is dropped.
    fn enqueue(&self, task: Task) -> Result<()>;
}

#[derive(Clone)]
pub struct Host {
    tasks: Arc<dyn TaskQueue>,
    pins: PinCounter,
    pool: Arc<dyn WorkerPool>,
}

impl Host {
    pub fn new(tasks: Arc<dyn TaskQueue>, pins: PinCounter, pool: Arc<dyn WorkerPool>) -> Self {
        Self { tasks, pins, pool }
    }

    /// Host whose callbacks run on `event_loop` and whose blocking work runs
    /// on `pool`.
    pub fn with_pool(event_loop: &EventLoop, pool: Arc<dyn WorkerPool>) -> Self {
        let handle = event_loop.handle();
        let pins = handle.pins().clone();
        Self::new(Arc::new(handle), pins, pool)
    }

    /// Host for `event_loop` using the current tokio runtime's blocking pool.
    pub fn for_loop(event_loop: &EventLoop) -> Result<Self> {
        let pool = BlockingPool::current()?;
        Ok(Self::with_pool(event_loop, Arc::new(pool)))
    }

    pub fn tasks(&self) -> &Arc<dyn TaskQueue> {
        &self.tasks
    }

    pub fn pins(&self) -> &PinCounter {
        &self.pins
    }

    pub fn pool(&self) -> &Arc<dyn WorkerPool> {
        &self.pool
    }

    /// Queues `task`, logging instead of failing when the loop is gone.
    pub fn enqueue_task(&self, task: Task) {
        if let Err(e) = self.tasks.enqueue(task) {
            log::warn!("dropping task: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_host_shares_loop_pins() {
        let mut event_loop = EventLoop::new();
        let host = Host::for_loop(&event_loop).unwrap();

        let guard = host.pins().pin();
        assert_eq!(event_loop.pins().count(), 1);
        drop(guard);

        host.enqueue_task(Box::new(|| {}));
        assert_eq!(event_loop.run().await, 1);
    }
}
