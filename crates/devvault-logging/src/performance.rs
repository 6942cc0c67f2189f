// ABOUTME: Timing helpers built on tracing spans
// ABOUTME: Repository round-trips record their elapsed time and warn when they run slow

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Instrument, Level, Span, field, span, warn};

/// Threshold used by `time_async` callers that have no better figure
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(750);

/// Guard that records its elapsed time on the `perf_timer` span when dropped
pub struct PerfTimer {
    span: Span,
    start: Instant,
    operation: &'static str,
    warn_threshold: Option<Duration>,
}

impl PerfTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            span: span!(Level::DEBUG, "perf_timer", operation, elapsed_ms = field::Empty),
            start: Instant::now(),
            operation,
            warn_threshold: None,
        }
    }

    /// Operations taking longer than `threshold` log a warning
    pub fn with_warn_threshold(mut self, threshold: Duration) -> Self {
        self.warn_threshold = Some(threshold);
        self
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.span.record("elapsed_ms", elapsed_ms);

        let Some(threshold) = self.warn_threshold else {
            return;
        };
        if elapsed > threshold {
            warn!(
                operation = self.operation,
                elapsed_ms,
                threshold_ms = threshold.as_secs_f64() * 1000.0,
                "Slow operation detected"
            );
        }
    }
}

/// Await `future` inside a `perf_timer` span, warning when it outlives `threshold`
pub async fn time_async<F>(operation: &'static str, threshold: Duration, future: F) -> F::Output
where
    F: Future,
{
    let timer = PerfTimer::new(operation).with_warn_threshold(threshold);
    let span = timer.span().clone();
    future.instrument(span).await
}
