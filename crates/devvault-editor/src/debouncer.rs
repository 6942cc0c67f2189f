// ABOUTME: Debouncing for autosave so storage is written once the user stops typing
// ABOUTME: Each input restarts a cancellable tokio timer; fired work runs detached

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Configuration for debouncing behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceConfig {
    /// How long to wait after the last input before triggering
    pub delay: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::with_delay(Duration::from_millis(500))
    }
}

impl DebounceConfig {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

/// Cancellable idle timer.
///
/// Must be driven from inside a tokio runtime.
#[derive(Debug, Default)]
pub struct Debouncer {
    config: DebounceConfig,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DebounceConfig) -> Self {
        Self {
            config,
            pending: None,
        }
    }

    /// Run `work` once no further input arrived for the configured delay.
    ///
    /// Any earlier timer that has not fired yet is aborted. Once a timer fires,
    /// `work` is spawned as its own task and can no longer be cancelled here.
    pub fn debounce<F, Fut>(&mut self, work: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.abort_timer();

        let deadline = Instant::now() + self.config.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            tokio::spawn(work());
        }));
    }

    /// Cancel any pending debounced operation
    pub fn cancel(&mut self) {
        self.abort_timer();
    }

    /// A timer is armed and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn abort_timer(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.abort_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_debounce_config_defaults() {
        let config = DebounceConfig::default();
        assert_eq!(config.delay, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once_after_last_input() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::with_config(DebounceConfig::with_delay(
            Duration::from_millis(500),
        ));

        for _ in 0..5 {
            debouncer.debounce(counting(&counter));
            tokio::time::advance(Duration::from_millis(200)).await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_work() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new();

        debouncer.debounce(counting(&counter));
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let mut debouncer = Debouncer::new();
            debouncer.debounce(counting(&counter));
        }

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
