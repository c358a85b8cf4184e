use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Per-process execution context threaded through every client operation:
/// one cancellation token covering everything in flight, plus the polling
/// cadence. Construct it once at startup and clone it into whatever needs
/// to observe cancellation.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub cancellation: CancellationToken,
    pub poll_interval: Duration,
}

impl RunContext {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
