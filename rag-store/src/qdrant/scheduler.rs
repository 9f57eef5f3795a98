//! Upsert pacing for the self-hosted backend: batch sizing, a concurrency and
//! spacing limiter, and per-batch retry.

use std::{future::Future, time::Duration};

use tokio::{
    sync::{Mutex, Semaphore, SemaphorePermit},
    time::Instant,
};
use tracing::warn;

use crate::{config::UpsertSchedule, errors::RagError};

/// Batch size as `ceil(total * percent / 100)`, at least 1.
///
/// `percent` is clamped to `1..=100`.
pub fn batch_size_for(total: usize, percent: u8) -> usize {
    let pct = usize::from(percent.clamp(1, 100));
    (total * pct).div_ceil(100).max(1)
}

/// Caps in-flight requests and enforces a minimum gap between request starts.
#[derive(Debug)]
pub struct RequestLimiter {
    permits: Semaphore,
    min_spacing: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestLimiter {
    pub fn new(max_concurrent: usize, min_spacing: Duration) -> Self {
        Self {
            permits: Semaphore::new(max_concurrent.max(1)),
            min_spacing,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits for a free slot; the returned permit is held for the request's duration.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, RagError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| RagError::Config("request limiter closed".into()))?;

        let wait = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let start = next.map_or(now, |n| n.max(now));
            *next = Some(start + self.min_spacing);
            start - now
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        Ok(permit)
    }
}

/// Runs `op` up to `schedule.attempts` times, backing off between attempts.
///
/// The last error is returned once attempts are exhausted.
pub async fn with_retry<T, F, Fut>(
    schedule: &UpsertSchedule,
    label: &str,
    mut op: F,
) -> Result<T, RagError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RagError>>,
{
    let attempts = schedule.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < attempts => {
                let backoff = schedule.backoff_after(attempt);
                warn!(
                    target: "rag_store::qdrant",
                    label,
                    attempt,
                    backoff_ms = backoff.as_millis(),
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn batch_size_is_percentage_of_total() {
        assert_eq!(batch_size_for(1000, 20), 200);
        assert_eq!(batch_size_for(7, 20), 2);
        assert_eq!(batch_size_for(3, 1), 1);
        assert_eq!(batch_size_for(50, 100), 50);
        assert_eq!(batch_size_for(50, 0), 1);
    }

    #[tokio::test]
    async fn retry_succeeds_on_last_attempt() {
        let schedule = UpsertSchedule {
            base_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        let calls = AtomicU32::new(0);
        let out = with_retry(&schedule, "t", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(RagError::Config("boom".into()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_attempts() {
        let schedule = UpsertSchedule {
            attempts: 2,
            base_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        let res: Result<(), _> =
            with_retry(&schedule, "t", |_| async { Err(RagError::Config("nope".into())) }).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn limiter_spaces_request_starts() {
        let limiter = RequestLimiter::new(3, Duration::from_millis(20));
        let started = Instant::now();
        for _ in 0..3 {
            let _p = limiter.acquire().await.unwrap();
        }
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
