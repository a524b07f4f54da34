//! Session-wide interrupt signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cloneable abort signal shared by everything that can block a session: the
/// planner call, a running command, the reply prompt, and the confirmation
/// gate. One long-lived watcher (the binary's Ctrl-C task) triggers it; every
/// blocking point races against it.
///
/// Triggering is sticky: once fired, every current and future wait completes
/// immediately.
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<InterruptInner>,
}

#[derive(Default)]
struct InterruptInner {
    fired: AtomicBool,
    notify: Notify,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.inner.fired.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Resolve once the signal fires.
    pub async fn triggered(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register interest before reading the flag so a trigger landing in
        // between cannot be lost.
        notified.as_mut().enable();
        if self.is_triggered() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_before_wait_completes_immediately() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        interrupt.triggered().await;
        assert!(interrupt.is_triggered());
    }

    #[tokio::test]
    async fn test_trigger_wakes_a_pending_waiter() {
        let interrupt = Interrupt::new();
        let waiter = {
            let interrupt = interrupt.clone();
            tokio::spawn(async move { interrupt.triggered().await })
        };
        interrupt.trigger();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_one_signal() {
        let interrupt = Interrupt::new();
        let sibling = interrupt.clone();
        sibling.trigger();
        assert!(interrupt.is_triggered());
        // Sticky: later waits still complete.
        interrupt.triggered().await;
        sibling.triggered().await;
    }
}
