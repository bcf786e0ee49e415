//! Sliding-window admission control and state management.

mod clock;
mod limiter;
mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{AdmissionDecision, RegistryStats, SlidingWindowLimiter};
pub use window::ClientWindow;
