//! Liveness accounting for the event loop.
//!
//! Work that will eventually post tasks (a read loop, for instance) holds a
//! [`PinGuard`]. The event loop keeps running while any guard is alive.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct PinState {
    count: AtomicUsize,
    idle: Notify,
}

/// Shared pin counter. Clones refer to the same count.
#[derive(Debug, Clone, Default)]
pub struct PinCounter {
    state: Arc<PinState>,
}

impl PinCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count. The returned guard decrements it exactly once,
    /// when dropped.
    pub fn pin(&self) -> PinGuard {
        let previous = self.state.count.fetch_add(1, Ordering::AcqRel);
        log::trace!("pin: {} -> {}", previous, previous + 1);
        PinGuard {
            state: Arc::clone(&self.state),
        }
    }

    pub fn count(&self) -> usize {
        self.state.count.load(Ordering::Acquire)
    }

    pub fn is_pinned(&self) -> bool {
        self.count() > 0
    }

    /// Resolves after the count has dropped to zero at least once since the
    /// last wake-up. Callers re-check `is_pinned`.
    pub(crate) async fn idle(&self) {
        self.state.idle.notified().await;
    }
}

/// One unit of liveness. Dropping it unpins.
#[derive(Debug)]
#[must_use = "dropping a PinGuard unpins immediately"]
pub struct PinGuard {
    state: Arc<PinState>,
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        let previous = self.state.count.fetch_sub(1, Ordering::AcqRel);
        log::trace!("unpin: {} -> {}", previous, previous - 1);
        if previous == 1 {
            self.state.idle.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_balance() {
        let pins = PinCounter::new();
        assert!(!pins.is_pinned());

        let first = pins.pin();
        let second = pins.clone().pin();
        assert_eq!(pins.count(), 2);

        drop(first);
        assert_eq!(pins.count(), 1);
        drop(second);
        assert_eq!(pins.count(), 0);
    }

    #[tokio::test]
    async fn test_idle_wakes_on_last_unpin() {
        let pins = PinCounter::new();
        let guard = pins.pin();

        let waiter = pins.clone();
        let handle = tokio::spawn(async move { waiter.idle().await });

        tokio::task::yield_now().await;
        drop(guard);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("idle notification")
            .unwrap();
    }
}
