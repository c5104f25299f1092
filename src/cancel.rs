//! Cooperative cancellation.
//!
//! A `CancellationToken` is checked by the parsers at every line boundary
//! and by the engine between pipeline stages. Clones share the same flag,
//! so cancelling any clone cancels them all. An optional deadline turns a
//! caller-supplied time budget into the same signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared, cloneable cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token sharing this flag that also expires at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns a token sharing this flag that expires `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns true once `cancel` was called or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_expired_deadline_cancels() {
        let token = CancellationToken::new().with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());

        let later = CancellationToken::new().with_timeout(Duration::from_secs(3600));
        assert!(!later.is_cancelled());
    }
}
