//! Periodic, clock-aligned source updates.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

use crate::error::SampleError;
use crate::source::Source;

/// Produces the markup for one source.
///
/// Implementations own whatever state they need between ticks (the previous
/// snapshot for rate metrics, a compiled template). `Ok(None)` means nothing
/// visible changed and the source is left alone.
pub trait Sampler: Send + 'static {
    fn sample(&mut self) -> impl Future<Output = Result<Option<String>, SampleError>> + Send;

    /// React to a click on the driven source. An update follows every click.
    fn click(&mut self, _button: u8) {}
}

/// Time from `now_ms` to the next wall-clock multiple of `delay`.
///
/// Always in `(0, delay]`, so a tick that lands exactly on a boundary waits
/// a full period.
pub fn align_delay(now_ms: i64, delay: Duration) -> Duration {
    let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX).max(1);
    let wait = delay_ms - now_ms.rem_euclid(delay_ms);
    Duration::from_millis(wait.unsigned_abs())
}

/// Re-runs a [`Repeat`] immediately, replacing its pending timer.
#[derive(Clone, Debug)]
pub struct RepeatHandle {
    trigger: Arc<Notify>,
}

impl RepeatHandle {
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }
}

/// Drives a [`Sampler`] into a [`Source`] on a clock-aligned schedule.
///
/// Each cycle samples, applies the result (or the error) to the source, then
/// sleeps until the next multiple of `delay`. Cycles never overlap. A manual
/// trigger or a click cuts the sleep short; an in-flight sample is never
/// cancelled.
pub struct Repeat<S> {
    source: Arc<Source>,
    sampler: S,
    delay: Duration,
    trigger: Arc<Notify>,
    clicks: mpsc::UnboundedReceiver<u8>,
}

impl<S: Sampler> Repeat<S> {
    pub fn new(source: Arc<Source>, sampler: S, delay: Duration) -> Self {
        let (tx, clicks) = mpsc::unbounded_channel();
        source.on_click(move |button| {
            let _ = tx.send(button);
        });

        Self {
            source,
            sampler,
            delay: delay.max(Duration::from_millis(1)),
            trigger: Arc::new(Notify::new()),
            clicks,
        }
    }

    pub fn handle(&self) -> RepeatHandle {
        RepeatHandle {
            trigger: self.trigger.clone(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Loop forever. The first update runs immediately.
    pub async fn run(mut self) {
        tracing::debug!(source = %self.source.name(), delay = ?self.delay, "Starting updates");
        loop {
            self.update().await;

            let wait = align_delay(chrono::Utc::now().timestamp_millis(), self.delay);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.trigger.notified() => {
                    tracing::trace!(source = %self.source.name(), "Update triggered");
                }
                Some(button) = self.clicks.recv() => {
                    self.sampler.click(button);
                }
            }
        }
    }

    async fn update(&mut self) {
        match self.sampler.sample().await {
            Ok(Some(markup)) => {
                if let Err(e) = self.source.set_text(&markup) {
                    tracing::warn!(source = %self.source.name(), error = %e, "Invalid markup");
                    self.source.set_error(&e);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(source = %self.source.name(), error = %e, "Update failed");
                self.source.set_error(&e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstatus_common::Color;

    struct Script {
        results: Vec<Result<Option<String>, SampleError>>,
        clicks: Vec<u8>,
    }

    impl Sampler for Script {
        async fn sample(&mut self) -> Result<Option<String>, SampleError> {
            if self.results.is_empty() {
                return Ok(None);
            }
            self.results.remove(0)
        }

        fn click(&mut self, button: u8) {
            self.clicks.push(button);
        }
    }

    fn script(results: Vec<Result<Option<String>, SampleError>>) -> Script {
        Script {
            results,
            clicks: Vec::new(),
        }
    }

    #[test]
    fn test_align_delay() {
        let second = Duration::from_secs(1);
        assert_eq!(align_delay(1_250, second), Duration::from_millis(750));
        assert_eq!(align_delay(2_000, second), second);
        assert_eq!(align_delay(2_999, second), Duration::from_millis(1));
        assert_eq!(
            align_delay(1_700_000_012_345, Duration::from_millis(500)),
            Duration::from_millis(155)
        );
    }

    #[test]
    fn test_align_delay_lands_on_multiples() {
        let delay = Duration::from_millis(1000);
        for now in [0_i64, 1, 999, 1000, 123_456_789] {
            let deadline = now + align_delay(now, delay).as_millis() as i64;
            assert_eq!(deadline % 1000, 0);
            assert!(deadline > now);
        }
    }

    #[tokio::test]
    async fn test_update_sets_text() {
        let source = Arc::new(Source::new("test"));
        let mut repeat = Repeat::new(
            source.clone(),
            script(vec![Ok(Some("{0f0}up".to_string())), Ok(None)]),
            Duration::from_secs(1),
        );

        repeat.update().await;
        assert_eq!(source.view().runs[0].text, "up");

        repeat.update().await;
        assert_eq!(source.view().runs[0].text, "up");
    }

    #[tokio::test]
    async fn test_update_error_then_recovers() {
        let source = Arc::new(Source::new("test"));
        let mut repeat = Repeat::new(
            source.clone(),
            script(vec![
                Err(SampleError::command("df", "exit status: 1")),
                Ok(Some("ok".to_string())),
            ]),
            Duration::from_secs(1),
        );

        repeat.update().await;
        let view = source.view();
        assert_eq!(view.runs[0].text, "df: exit status: 1");
        assert_eq!(view.runs[0].color, Some(Color::alert()));

        repeat.update().await;
        assert_eq!(source.view().runs[0].text, "ok");
        assert_eq!(source.view().runs[0].color, None);
    }

    #[tokio::test]
    async fn test_click_reaches_sampler() {
        let source = Arc::new(Source::new("test"));
        let mut repeat = Repeat::new(source.clone(), script(Vec::new()), Duration::from_secs(1));

        source.click(2);
        let button = repeat.clicks.recv().await.unwrap();
        repeat.sampler.click(button);
        assert_eq!(repeat.sampler.clicks, vec![2]);
    }

    #[test]
    fn test_zero_delay_is_clamped() {
        let source = Arc::new(Source::new("test"));
        let repeat = Repeat::new(source, script(Vec::new()), Duration::ZERO);
        assert_eq!(repeat.delay(), Duration::from_millis(1));
    }
}
