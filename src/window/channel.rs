//! Bounded hand-off between eviction and the extraction workers.

use crate::error::EngineError;
use crate::window::bucket::WindowSnapshot;
use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

/// Lock-free bounded queue of evicted windows. Producers fail fast when it
/// is saturated; consumers await quietly when it is empty.
pub struct OutputChannel {
    queue: ArrayQueue<WindowSnapshot>,
    notify: Notify,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl OutputChannel {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "output channel capacity must be > 0");
        Self {
            queue: ArrayQueue::new(capacity),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue one window without waiting. A saturated queue returns
    /// `QueueFull` carrying the dropped window's coordinates and bumps the
    /// drop counter; the window itself is lost.
    pub fn try_put(&self, snapshot: WindowSnapshot) -> Result<(), EngineError> {
        match self.queue.push(snapshot) {
            Ok(()) => {
                self.notify.notify_one();
                Ok(())
            }
            Err(rejected) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                let records = rejected.record_count();
                Err(EngineError::QueueFull {
                    identity: rejected.identity,
                    window_start_ms: rejected.window_start_ms,
                    records,
                })
            }
        }
    }

    /// Await the next window. Returns `None` once the channel is closed and
    /// every queued window has been taken, which is the consumer's signal to
    /// exit.
    pub async fn take(&self) -> Option<WindowSnapshot> {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        loop {
            // register before the emptiness and closed checks: notify_waiters
            // stores no permit, so a close landing between a check and the
            // await must find this task already in the waiter list
            notified.as_mut().enable();
            if let Some(snapshot) = self.queue.pop() {
                return Some(snapshot);
            }
            if self.closed.load(Ordering::Acquire) {
                return self.queue.pop();
            }
            notified.as_mut().await;
            notified.set(self.notify.notified());
        }
    }

    /// Remove everything currently queued without waiting.
    pub fn drain(&self) -> Vec<WindowSnapshot> {
        let mut out = Vec::new();
        while let Some(snapshot) = self.queue.pop() {
            out.push(snapshot);
        }
        out
    }

    /// Mark the channel closed and wake every waiting consumer.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn depth(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Windows dropped because the queue was full.
    pub fn dropped_windows(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
