//! The single-threaded execution context callbacks run on.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::pin::PinCounter;
use super::{Task, TaskQueue};
use crate::error::{Error, ErrorKind, Result};

/// Cloneable sending side of an [`EventLoop`].
///
/// Tasks sent through one handle run in the order they were sent.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    tx: UnboundedSender<Task>,
    pins: PinCounter,
}

impl LoopHandle {
    /// The pin counter that keeps the owning loop alive.
    pub fn pins(&self) -> &PinCounter {
        &self.pins
    }
}

impl TaskQueue for LoopHandle {
    fn enqueue(&self, task: Task) -> Result<()> {
        self.tx
            .send(task)
            .map_err(|_| Error::with_message(ErrorKind::Unavailable, "event loop has shut down"))
    }
}

/// FIFO task queue drained on the thread that calls [`EventLoop::run`].
pub struct EventLoop {
    rx: UnboundedReceiver<Task>,
    handle: LoopHandle,
}

impl EventLoop {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            handle: LoopHandle {
                tx,
                pins: PinCounter::new(),
            },
        }
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn pins(&self) -> &PinCounter {
        &self.handle.pins
    }

    /// Runs every task that is queued right now, without waiting.
    pub fn run_pending(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            executed += 1;
        }
        executed
    }

    /// Runs tasks until the queue is empty and nothing is pinned.
    ///
    /// Returns the number of tasks executed.
    pub async fn run(&mut self) -> usize {
        let mut executed = 0;
        loop {
            executed += self.run_pending();

            if !self.handle.pins.is_pinned() {
                // A task may have been queued just before the last unpin.
                if self.run_pending() == 0 {
                    break;
                }
                continue;
            }

            tokio::select! {
                Some(task) = self.rx.recv() => {
                    task();
                    executed += 1;
                }
                _ = self.handle.pins.idle() => {}
            }
        }
        log::debug!("event loop idle after {} tasks", executed);
        executed
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let mut event_loop = EventLoop::new();
        let handle = event_loop.handle();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let seen = Arc::clone(&seen);
            handle.enqueue(Box::new(move || seen.lock().push(i))).unwrap();
        }

        assert_eq!(event_loop.run().await, 5);
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_stays_alive_while_pinned() {
        let mut event_loop = EventLoop::new();
        let handle = event_loop.handle();
        let guard = handle.pins().pin();
        let ran = Arc::new(Mutex::new(false));

        let flag = Arc::clone(&ran);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            handle
                .enqueue(Box::new(move || *flag.lock() = true))
                .unwrap();
            drop(guard);
        });

        let executed = tokio::time::timeout(Duration::from_secs(5), event_loop.run())
            .await
            .expect("loop should finish once unpinned");
        assert_eq!(executed, 1);
        assert!(*ran.lock());
    }

    #[test]
    fn test_enqueue_after_shutdown() {
        let handle = EventLoop::new().handle();
        let err = handle.enqueue(Box::new(|| {})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }
}
