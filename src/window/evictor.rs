//! Periodic eviction: moves closed windows from the store to the output
//! channel on a fixed cadence, and drains everything on shutdown.

use crate::window::channel::OutputChannel;
use crate::window::store::WindowStore;
use crate::window::WindowSnapshot;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct Evictor {
    store: Arc<WindowStore>,
    channel: Arc<OutputChannel>,
    flush_interval: Duration,
}

impl Evictor {
    pub fn new(store: Arc<WindowStore>, channel: Arc<OutputChannel>, flush_interval: Duration) -> Self {
        Self {
            store,
            channel,
            flush_interval,
        }
    }

    /// Tick until `shutdown` flips, evicting windows closed one grace
    /// window before now. On shutdown, run one unconditional drain and
    /// close the channel so the workers can finish and exit.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.flush_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let cutoff_ms = now_ms().saturating_sub(self.store.window_ms());
                    let evicted = self.store.evict_closed(cutoff_ms);
                    if !evicted.is_empty() {
                        debug!(windows = evicted.len(), cutoff_ms, "eviction sweep");
                        self.forward(evicted);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let remaining = self.store.drain_all();
        let windows = remaining.len();
        self.forward(remaining);
        self.channel.close();
        info!(windows, "final drain complete, channel closed");
    }

    /// Hand evicted windows to the channel. A full queue drops the window;
    /// the sweep never stalls.
    fn forward(&self, snapshots: Vec<WindowSnapshot>) {
        for snapshot in snapshots {
            if let Err(e) = self.channel.try_put(snapshot) {
                warn!(error = %e, "window dropped");
            }
        }
    }
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
