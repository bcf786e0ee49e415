//! Core sliding-window admission controller.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::window::ClientWindow;

/// Outcome of an admission check, with quota telemetry for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    /// Whether the request may proceed
    pub admitted: bool,
    /// Configured capacity for the window
    pub limit: u32,
    /// Requests left in the current window after this decision
    pub remaining: u32,
    /// Seconds until quota becomes available again
    pub reset_seconds: u64,
}

/// Aggregate view of the admission registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Clients with at least one tracked request
    pub active_clients: usize,
    /// Total timestamps currently tracked across all clients
    pub tracked_requests: usize,
}

/// Sliding-window admission controller keyed by client identity.
///
/// Recomputes the active count from exact timestamps within a trailing
/// window rather than resetting at fixed boundaries. The whole
/// purge-count-decide-append sequence for a check runs under one lock, so
/// two concurrent checks for the same client can never both admit when
/// only one slot remains.
pub struct SlidingWindowLimiter {
    /// Maximum admitted requests per client per window
    capacity: u32,
    /// Trailing window duration
    window: Duration,
    /// Request history indexed by client identity
    windows: Mutex<HashMap<String, ClientWindow>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter with the given capacity and window duration.
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether a request from `client_id` at `now` may proceed.
    ///
    /// Stale entries are purged first. On admission `now` is appended to the
    /// client's history; rejections record nothing, so a rejected client can
    /// retry as soon as the window advances.
    pub fn check(&self, client_id: &str, now: Instant) -> AdmissionDecision {
        trace!(client_id = %client_id, "Checking admission");

        let mut windows = self.windows.lock();

        if !windows.contains_key(client_id) {
            debug!(client_id = %client_id, "Tracking new client");
        }

        let history = windows
            .entry(client_id.to_string())
            .or_insert_with(ClientWindow::new);

        history.purge(now, self.window);
        let count = history.len() as u32;

        if count >= self.capacity {
            let reset_seconds = history
                .oldest()
                .map(|oldest| {
                    let until = (oldest + self.window).saturating_duration_since(now);
                    let mut secs = until.as_secs();
                    if until.subsec_nanos() > 0 {
                        secs += 1;
                    }
                    secs.max(1)
                })
                .unwrap_or(1);

            debug!(
                client_id = %client_id,
                reset_seconds = reset_seconds,
                "Admission rejected"
            );

            return AdmissionDecision {
                admitted: false,
                limit: self.capacity,
                remaining: 0,
                reset_seconds,
            };
        }

        history.record(now);

        AdmissionDecision {
            admitted: true,
            limit: self.capacity,
            remaining: self.capacity - count - 1,
            reset_seconds: self.window.as_secs(),
        }
    }

    /// Remove clients whose history is empty after purging at `now`.
    ///
    /// Bounds registry growth for clients that stopped sending requests.
    /// Returns the number of clients removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();

        windows.retain(|_, history| {
            history.purge(now, self.window);
            !history.is_empty()
        });

        let removed = before - windows.len();
        if removed > 0 {
            debug!(removed = removed, "Swept idle clients from registry");
        }
        removed
    }

    /// Snapshot of registry occupancy.
    pub fn stats(&self) -> RegistryStats {
        let windows = self.windows.lock();
        RegistryStats {
            active_clients: windows.len(),
            tracked_requests: windows.values().map(|h| h.len()).sum(),
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Configured window duration.
    pub fn window(&self) -> Duration {
        self.window
    }
}
