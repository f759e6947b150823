use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cooperative cancellation signal polled by the matcher between classes and
/// between passes. Clones share one flag. A token trips when [`cancel`] is
/// called on any clone, or once its deadline has passed.
///
/// [`cancel`]: CancellationToken::cancel
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that trips once `limit` has elapsed from now.
    pub fn with_time_limit(limit: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(limit),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// A passed deadline latches the shared flag, so every clone agrees from
    /// then on.
    pub fn is_cancelled(&self) -> bool {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.cancel();
        }
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_deadline_never_trips() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn test_time_limit() {
        assert!(CancellationToken::with_time_limit(Duration::ZERO).is_cancelled());
        assert!(!CancellationToken::with_time_limit(Duration::from_secs(3600)).is_cancelled());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::with_time_limit(Duration::from_secs(3600));
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_expired_deadline_trips_clones_without_deadline() {
        let expired = CancellationToken::with_time_limit(Duration::ZERO);
        let watcher = CancellationToken {
            deadline: None,
            ..expired.clone()
        };
        assert!(!watcher.is_cancelled());

        assert!(expired.is_cancelled());
        assert!(watcher.is_cancelled());
    }
}
