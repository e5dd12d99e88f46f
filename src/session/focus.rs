use std::sync::atomic::{AtomicU32, Ordering};

/// Counts focus-loss events reported during a call. The count travels with
/// the durable end-of-call record as a signal of participant attention.
#[derive(Debug, Default)]
pub struct TabFocusMonitor {
    count: AtomicU32,
}

impl TabFocusMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one focus loss; returns the updated total.
    pub fn record_focus_loss(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}
