use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

use super::prober::{Dimensions, ImageProber};

/// Default upper bound on a single probe, including connect and header read.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// One finished probe. Travels from a probe task to the selector.
#[derive(Debug)]
struct ProbeOutcome {
    url: Url,
    dims: Dimensions,
}

/// Picks a preview image from a list of candidates by probing them
/// concurrently.
///
/// Cloning is cheap; clones share the prober.
#[derive(Clone)]
pub struct ImageSelector {
    prober: Arc<dyn ImageProber>,
    probe_timeout: Duration,
}

impl std::fmt::Debug for ImageSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSelector")
            .field("probe_timeout", &self.probe_timeout)
            .finish_non_exhaustive()
    }
}

impl ImageSelector {
    pub fn new(prober: Arc<dyn ImageProber>) -> Self {
        Self {
            prober,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Bounds every probe; a probe that overruns counts as [`Dimensions::ZERO`].
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    /// Returns the first candidate, by probe completion, whose dimensions are
    /// at least `min_width` x `min_height`.
    ///
    /// One task is spawned per candidate. The selector returns as soon as a
    /// winner arrives, or `None` once every probe has reported without one.
    /// An empty candidate list returns `None` without spawning anything.
    ///
    /// # Cleanup
    ///
    /// Results flow through a channel with one slot per candidate, so no
    /// task ever blocks on send. Returning early drops the receiver: tasks
    /// still probing see the channel close and stop, and a task that already
    /// finished gets a send error it discards. The channel is never closed
    /// while a writer could still use it, so late results are harmless.
    pub async fn select(
        &self,
        min_width: u32,
        min_height: u32,
        candidates: Vec<Url>,
    ) -> Option<Url> {
        if candidates.is_empty() {
            return None;
        }

        let total = candidates.len();
        let (tx, mut rx) = mpsc::channel::<ProbeOutcome>(total);

        for url in candidates {
            let tx = tx.clone();
            let prober = Arc::clone(&self.prober);
            let probe_timeout = self.probe_timeout;

            tokio::spawn(async move {
                let dims = tokio::select! {
                    // Selector already has its answer
                    _ = tx.closed() => return,
                    dims = tokio::time::timeout(probe_timeout, prober.probe(&url)) => {
                        dims.unwrap_or_else(|_| {
                            tracing::debug!(
                                url = %url,
                                timeout = ?probe_timeout,
                                "Image probe timed out"
                            );
                            Dimensions::ZERO
                        })
                    }
                };
                let _ = tx.send(ProbeOutcome { url, dims }).await;
            });
        }

        // Only the tasks hold senders now; recv() yields None once all are done.
        drop(tx);

        let mut received = 0usize;
        while let Some(outcome) = rx.recv().await {
            received += 1;
            if outcome.dims.satisfies(min_width, min_height) {
                tracing::debug!(
                    url = %outcome.url,
                    width = outcome.dims.width,
                    height = outcome.dims.height,
                    received = received,
                    total = total,
                    "Selected preview image"
                );
                return Some(outcome.url);
            }
        }

        tracing::debug!(
            candidates = total,
            min_width = min_width,
            min_height = min_height,
            "No candidate image met the size threshold"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stand-in prober: fixed size and delay per URL, counts every call.
    #[derive(Default)]
    struct ScriptedProber {
        script: HashMap<String, (Dimensions, Duration)>,
        calls: AtomicUsize,
        finished: Arc<AtomicUsize>,
        dropped: Arc<AtomicUsize>,
    }

    impl ScriptedProber {
        fn with(mut self, url: &str, width: u32, height: u32, delay_ms: u64) -> Self {
            self.script.insert(
                url.to_string(),
                (Dimensions::new(width, height), Duration::from_millis(delay_ms)),
            );
            self
        }
    }

    /// Counts probe futures that were dropped before finishing.
    struct DropGuard {
        done: bool,
        dropped: Arc<AtomicUsize>,
    }

    impl Drop for DropGuard {
        fn drop(&mut self) {
            if !self.done {
                self.dropped.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[async_trait]
    impl ImageProber for ScriptedProber {
        async fn probe(&self, url: &Url) -> Dimensions {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut guard = DropGuard {
                done: false,
                dropped: Arc::clone(&self.dropped),
            };
            let (dims, delay) = self
                .script
                .get(url.as_str())
                .copied()
                .unwrap_or((Dimensions::ZERO, Duration::ZERO));
            tokio::time::sleep(delay).await;
            guard.done = true;
            self.finished.fetch_add(1, Ordering::SeqCst);
            dims
        }
    }

    fn urls(list: &[&str]) -> Vec<Url> {
        list.iter().map(|u| Url::parse(u).unwrap()).collect()
    }

    const A: &str = "http://img.example.com/a.jpg";
    const B: &str = "http://img.example.com/b.jpg";
    const C: &str = "http://img.example.com/c.jpg";

    #[tokio::test(start_paused = true)]
    async fn test_empty_candidates_probe_nothing() {
        let prober = Arc::new(ScriptedProber::default());
        let selector = ImageSelector::new(prober.clone());

        assert_eq!(selector.select(0, 0, Vec::new()).await, None);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_qualifier_wins_in_any_position() {
        // The qualifying image is the slowest, the fastest and in between
        for (winner, delays) in [(A, [300, 100, 200]), (B, [100, 10, 200]), (C, [5, 50, 120])] {
            let mut prober = ScriptedProber::default();
            for (url, delay) in [A, B, C].into_iter().zip(delays) {
                let size = if url == winner { 400 } else { 50 };
                prober = prober.with(url, size, size, delay);
            }
            let selector = ImageSelector::new(Arc::new(prober));

            let chosen = selector.select(200, 200, urls(&[A, B, C])).await;
            assert_eq!(chosen.as_ref().map(Url::as_str), Some(winner));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_order_decides_between_qualifiers() {
        let prober = ScriptedProber::default()
            .with(A, 500, 500, 300)
            .with(B, 500, 500, 20)
            .with(C, 10, 10, 1);
        let selector = ImageSelector::new(Arc::new(prober));

        let chosen = selector.select(200, 200, urls(&[A, B, C])).await;
        assert_eq!(chosen.as_ref().map(Url::as_str), Some(B));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_qualifier_waits_for_all_probes() {
        let prober = Arc::new(
            ScriptedProber::default()
                .with(A, 100, 100, 10)
                .with(B, 199, 500, 40)
                .with(C, 500, 199, 80),
        );
        let selector = ImageSelector::new(prober.clone());

        assert_eq!(selector.select(200, 200, urls(&[A, B, C])).await, None);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
        assert_eq!(prober.finished.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_thresholds_are_inclusive() {
        let prober = ScriptedProber::default().with(A, 200, 150, 5);
        let selector = ImageSelector::new(Arc::new(prober));

        let chosen = selector.select(200, 150, urls(&[A])).await;
        assert_eq!(chosen.as_ref().map(Url::as_str), Some(A));
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_winner_stops_slow_probes() {
        let prober = Arc::new(
            ScriptedProber::default()
                .with(A, 800, 800, 5)
                .with(B, 10, 10, 10_000)
                .with(C, 900, 900, 20_000),
        );
        let selector =
            ImageSelector::new(prober.clone()).with_probe_timeout(Duration::from_secs(60));

        let chosen = selector.select(200, 200, urls(&[A, B, C])).await;
        assert_eq!(chosen.as_ref().map(Url::as_str), Some(A));

        // Let the abandoned tasks notice the closed channel
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
        assert_eq!(prober.finished.load(Ordering::SeqCst), 1);
        assert_eq!(prober.dropped.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_results_after_winner_are_discarded() {
        // Every probe finishes at the same instant; only one can be read
        let prober = Arc::new(
            ScriptedProber::default()
                .with(A, 300, 300, 10)
                .with(B, 300, 300, 10)
                .with(C, 300, 300, 10),
        );
        let selector = ImageSelector::new(prober.clone());

        let chosen = selector.select(200, 200, urls(&[A, B, C])).await;
        assert!(chosen.is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let settled =
            prober.finished.load(Ordering::SeqCst) + prober.dropped.load(Ordering::SeqCst);
        assert_eq!(settled, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_probe_counts_as_unusable() {
        let prober = ScriptedProber::default().with(A, 1000, 1000, 5_000);
        let selector =
            ImageSelector::new(Arc::new(prober)).with_probe_timeout(Duration::from_secs(1));

        let started = tokio::time::Instant::now();
        assert_eq!(selector.select(200, 200, urls(&[A])).await, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_candidates_are_each_probed() {
        let prober = Arc::new(ScriptedProber::default().with(A, 10, 10, 1));
        let selector = ImageSelector::new(prober.clone());

        assert_eq!(selector.select(200, 200, urls(&[A, A, A])).await, None);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
    }

    struct PanickingProber;

    #[async_trait]
    impl ImageProber for PanickingProber {
        async fn probe(&self, url: &Url) -> Dimensions {
            if url.as_str() == A {
                panic!("probe blew up");
            }
            Dimensions::new(10, 10)
        }
    }

    #[tokio::test]
    async fn test_panicking_probe_does_not_hang_selector() {
        let selector = ImageSelector::new(Arc::new(PanickingProber));
        let chosen = selector.select(5, 5, urls(&[A, B])).await;
        assert_eq!(chosen.as_ref().map(Url::as_str), Some(B));
        assert_eq!(selector.select(50, 50, urls(&[A, B])).await, None);
    }
}
