//! Per-client request history.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Ordered record of admitted-request instants for a single client.
///
/// Entries are appended in arrival order and dropped lazily once they fall
/// out of the trailing window. Only admitted requests are recorded.
#[derive(Debug, Default)]
pub struct ClientWindow {
    timestamps: VecDeque<Instant>,
}

impl ClientWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self {
            timestamps: VecDeque::new(),
        }
    }

    /// Drop every entry at least `window` old relative to `now`.
    pub fn purge(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.duration_since(oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record an admitted request at `now`.
    pub fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
    }

    /// Oldest surviving entry, if any.
    pub fn oldest(&self) -> Option<Instant> {
        self.timestamps.front().copied()
    }

    /// Number of surviving entries.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the window holds no entries.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
