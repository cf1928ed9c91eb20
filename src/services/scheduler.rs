// src/services/scheduler.rs

//! Bounded concurrent link checking.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::models::CheckOutcome;
use crate::services::LinkVerifier;

/// Anything that can resolve a link to an outcome.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn check(&self, url: &str) -> CheckOutcome;
}

#[async_trait]
impl LinkProbe for LinkVerifier {
    async fn check(&self, url: &str) -> CheckOutcome {
        LinkVerifier::check(self, url).await
    }
}

/// Dispatches link checks onto tokio tasks under one shared permit pool.
///
/// The pool is created once per run, so the bound holds across every page
/// and target that feeds the scheduler.
#[derive(Clone)]
pub struct CheckScheduler {
    probe: Arc<dyn LinkProbe>,
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl CheckScheduler {
    pub fn new(probe: Arc<dyn LinkProbe>, max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            probe,
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Check every URL, returning one outcome per URL in input order.
    ///
    /// A task that panics yields a transport-error outcome for its URL and
    /// leaves the others untouched.
    pub async fn check_all(&self, urls: Vec<String>) -> Vec<CheckOutcome> {
        let handles: Vec<_> = urls
            .iter()
            .cloned()
            .map(|url| {
                let probe = Arc::clone(&self.probe);
                let permits = Arc::clone(&self.permits);
                tokio::spawn(async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return CheckOutcome::task_failed(url, "worker pool closed");
                    };
                    probe.check(&url).await
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(urls)
            .map(|(joined, url)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("Link check task for {url} failed: {e}");
                    CheckOutcome::task_failed(url, e)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ok(url: &str) -> CheckOutcome {
        CheckOutcome::new(
            url,
            OutcomeKind::Success {
                status: 200,
                final_url: url.to_string(),
                keyword_hit: None,
            },
        )
    }

    #[derive(Default)]
    struct CountingProbe {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl LinkProbe for CountingProbe {
        async fn check(&self, url: &str) -> CheckOutcome {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            ok(url)
        }
    }

    struct PanickingProbe;

    #[async_trait]
    impl LinkProbe for PanickingProbe {
        async fn check(&self, url: &str) -> CheckOutcome {
            if url.contains("boom") {
                panic!("probe exploded on {url}");
            }
            ok(url)
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let probe = Arc::new(CountingProbe::default());
        let scheduler = CheckScheduler::new(probe.clone(), 3);
        let urls: Vec<String> = (0..12).map(|i| format!("https://a.example/{i}")).collect();

        let outcomes = scheduler.check_all(urls.clone()).await;

        assert_eq!(outcomes.len(), 12);
        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
        let requested: Vec<_> = outcomes.iter().map(|o| o.requested_url.clone()).collect();
        assert_eq!(requested, urls);
    }

    #[tokio::test]
    async fn test_panicking_task_is_isolated() {
        let scheduler = CheckScheduler::new(Arc::new(PanickingProbe), 2);
        let urls = vec![
            "https://a.example/1".to_string(),
            "https://a.example/boom".to_string(),
            "https://a.example/3".to_string(),
        ];

        let outcomes = scheduler.check_all(urls).await;

        assert_eq!(outcomes[0].label(), "success");
        assert_eq!(outcomes[2].label(), "success");
        assert_eq!(outcomes[1].label(), "transport_error");
        assert_eq!(outcomes[1].requested_url, "https://a.example/boom");
        assert!(
            outcomes[1]
                .error_message()
                .unwrap()
                .starts_with("link check task failed:")
        );
    }

    #[tokio::test]
    async fn test_zero_workers_still_runs() {
        let scheduler = CheckScheduler::new(Arc::new(PanickingProbe), 0);
        assert_eq!(scheduler.max_workers(), 1);
        let outcomes = scheduler.check_all(vec!["https://a.example/".into()]).await;
        assert_eq!(outcomes.len(), 1);
    }
}
