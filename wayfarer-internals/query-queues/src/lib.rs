//! Wayfarer Query Queues
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! wayfarer-internals/query-queues
//! An outbound call gate for external services: QPS limiting, a concurrency cap,
//! and opt-in retries with exponential backoff and jitter.
//!
//! Retries are disabled unless requested with [`QueryQueue::with_max_retries`],
//! so by default every call reaches the remote service exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tokio::sync::{Mutex, Notify, Semaphore};
use tokio::time;

/// Errors that a caller can classify as worth another attempt.
///
/// Only transient errors are retried, and only when the queue was configured
/// with a non-zero retry budget.
pub trait Transient {
    fn is_transient(&self) -> bool {
        false
    }
}

#[derive(Debug, Error)]
pub enum QueryQueueError<E>
where
    E: std::error::Error + 'static,
{
    #[error("call failed after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },
    #[error("queue is closed")]
    QueueClosed,
}

impl<E> QueryQueueError<E>
where
    E: std::error::Error + 'static,
{
    /// The error returned by the last attempt, if any attempt ran.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Exhausted { source, .. } => Some(source),
            Self::QueueClosed => None,
        }
    }
}

/// Token bucket refilled once per interval.
#[derive(Debug)]
struct TokenBucket {
    limit: u64,
    tokens: AtomicU64,
    last_refill: Mutex<Instant>,
    refill_interval: Duration,
    notify: Notify,
}

impl TokenBucket {
    fn new(limit: u64) -> Self {
        Self {
            limit,
            tokens: AtomicU64::new(limit),
            last_refill: Mutex::new(Instant::now()),
            refill_interval: Duration::from_secs(1),
            notify: Notify::new(),
        }
    }

    async fn refill(&self) {
        let mut last = self.last_refill.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.refill_interval {
            return;
        }
        let new_tokens = (elapsed.as_secs_f64() * self.limit as f64) as u64;
        if new_tokens > 0 {
            let _ = self
                .tokens
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                    Some(cur.saturating_add(new_tokens).min(self.limit))
                });
            self.notify.notify_waiters();
        }
        *last = Instant::now();
    }

    async fn acquire(&self) {
        loop {
            self.refill().await;
            let available = self.tokens.load(Ordering::SeqCst);
            if available > 0 {
                if self
                    .tokens
                    .compare_exchange(
                        available,
                        available - 1,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    )
                    .is_ok()
                {
                    return;
                }
            } else {
                let _ = time::timeout(Duration::from_millis(100), self.notify.notified()).await;
            }
        }
    }
}

/// Backoff schedule applied between attempts.
#[derive(Clone, Debug)]
struct Backoff {
    initial_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    max_retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            jitter_factor: 0.5,
            max_retries: 0,
        }
    }
}

impl Backoff {
    fn delay_for(&self, retry: u32) -> Duration {
        let exp = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)));
        let base = exp.min(self.max_delay);
        if self.jitter_factor == 0.0 {
            return base;
        }
        let jitter_ms = (base.as_millis() as f64 * self.jitter_factor) as u64;
        let rand_jitter = rand::thread_rng().gen_range(0..=jitter_ms);
        base + Duration::from_millis(rand_jitter)
    }
}

/// A gate in front of one external service.
///
/// ```ignore
/// let queue = QueryQueue::with_qps_limit(2);
/// let body = queue.run(|_attempt| async { fetch().await }).await?;
/// ```
#[derive(Clone, Debug)]
pub struct QueryQueue {
    semaphore: Arc<Semaphore>,
    bucket: Option<Arc<TokenBucket>>,
    backoff: Backoff,
}

impl Default for QueryQueue {
    fn default() -> Self {
        Self::with_concurrency_limit(4)
    }
}

impl QueryQueue {
    /// Cap the number of in-flight calls, without a rate limit.
    pub fn with_concurrency_limit(max_concurrent: u64) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
            bucket: None,
            backoff: Backoff::default(),
        }
    }

    /// Allow at most `qps_limit` calls to start per second.
    pub fn with_qps_limit(qps_limit: u64) -> Self {
        let qps_limit = qps_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(qps_limit as usize)),
            bucket: Some(Arc::new(TokenBucket::new(qps_limit))),
            backoff: Backoff::default(),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.backoff.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.backoff.initial_delay = initial_delay;
        self.backoff.max_delay = max_delay.max(initial_delay);
        self
    }

    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.backoff.jitter_factor = jitter_factor.clamp(0.0, 1.0);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.backoff.max_retries
    }

    /// Run `f` behind the gate.
    ///
    /// `f` receives the 1-based attempt number. A failed attempt is retried
    /// only when the error is [`Transient`] and the retry budget is not spent.
    pub async fn run<T, E, F, Fut>(&self, mut f: F) -> Result<T, QueryQueueError<E>>
    where
        E: std::error::Error + Transient + 'static,
        F: FnMut(u32) -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, E>> + Send,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| QueryQueueError::QueueClosed)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            if let Some(bucket) = &self.bucket {
                bucket.acquire().await;
            }

            match f(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let retries_used = attempt - 1;
                    if !e.is_transient() || retries_used >= self.backoff.max_retries {
                        return Err(QueryQueueError::Exhausted {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    time::sleep(self.backoff.delay_for(attempt)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[derive(Debug, Error)]
    #[error("flaky: transient={0}")]
    struct Flaky(bool);

    impl Transient for Flaky {
        fn is_transient(&self) -> bool {
            self.0
        }
    }

    fn fast(queue: QueryQueue) -> QueryQueue {
        queue
            .with_backoff(Duration::from_millis(1), Duration::from_millis(2))
            .with_jitter(0.0)
    }

    #[tokio::test]
    async fn test_default_queue_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let queue = fast(QueryQueue::default());
        let c = calls.clone();
        let res: Result<(), _> = queue
            .run(move |_| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(Flaky(true))
                }
            })
            .await;
        assert!(matches!(res, Err(QueryQueueError::Exhausted { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_use_retry_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let queue = fast(QueryQueue::with_concurrency_limit(1).with_max_retries(2));
        let c = calls.clone();
        let res: Result<u32, QueryQueueError<Flaky>> = queue
            .run(move |attempt| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    if attempt < 3 {
                        Err(Flaky(true))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(res.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let queue = fast(QueryQueue::with_qps_limit(10).with_max_retries(5));
        let c = calls.clone();
        let res: Result<(), _> = queue
            .run(move |_| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(Flaky(false))
                }
            })
            .await;
        let err = res.unwrap_err();
        assert!(err.to_string().contains("1 attempt"));
        assert!(err.into_inner().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let backoff = Backoff {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            jitter_factor: 0.0,
            max_retries: 10,
        };
        assert_eq!(backoff.delay_for(1), Duration::from_millis(100));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(5), Duration::from_millis(300));
    }
}
