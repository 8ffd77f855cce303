//! Bounded, retried fetching of a single image reference.

use crate::payload::{decode_data_uri, is_data_uri, sniff, AssetFormat, PayloadError};
use crate::source::ImageSource;
use loom_core::{EngineConfig, SourceError};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Timeout and retry schedule for fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_retries: config.max_fetch_retries,
            timeout: Duration::from_millis(config.fetch_timeout_ms),
            backoff_base: Duration::from_millis(config.fetch.backoff_base_ms),
            backoff_max: Duration::from_millis(config.fetch.backoff_max_ms),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `n` (0-based): `base × 2^n`, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }
}

/// Why a single attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// A validated image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub format: AssetFormat,
}

/// Every attempt failed.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub last: AttemptError,
}

/// Fetch and validate one reference.
///
/// `data:` URIs are decoded locally and never retried. Other references are
/// fetched through `source` with a per-attempt timeout; a transport failure,
/// a timeout and an unreadable payload all count as failed attempts.
pub async fn fetch_payload<S: ImageSource>(
    source: &S,
    reference: &str,
    policy: &RetryPolicy,
) -> Result<Payload, Exhausted> {
    if is_data_uri(reference) {
        return decode_inline(reference).map_err(|last| Exhausted { attempts: 1, last });
    }

    let mut attempt = 0;
    loop {
        let error = match tokio::time::timeout(policy.timeout, source.fetch_image_bytes(reference)).await {
            Ok(Ok(bytes)) => match sniff(&bytes) {
                Ok(format) => return Ok(Payload { bytes, format }),
                Err(err) => AttemptError::Payload(err),
            },
            Ok(Err(err)) => AttemptError::Source(err),
            Err(_) => AttemptError::Timeout(policy.timeout),
        };

        attempt += 1;
        warn!(reference, attempt, error = %error, "asset fetch attempt failed");

        if attempt >= policy.attempts() {
            return Err(Exhausted { attempts: attempt, last: error });
        }
        tokio::time::sleep(policy.backoff(attempt - 1)).await;
    }
}

fn decode_inline(reference: &str) -> Result<Payload, AttemptError> {
    let bytes = decode_data_uri(reference)?;
    let format = sniff(&bytes)?;
    Ok(Payload { bytes, format })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::tests::png;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        bytes: Vec<u8>,
    }

    impl ImageSource for Flaky {
        async fn fetch_image_bytes(&self, _reference: &str) -> Result<Vec<u8>, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(SourceError::Transport("connection reset".into()))
            } else {
                Ok(self.bytes.clone())
            }
        }
    }

    struct Hanging;

    impl ImageSource for Hanging {
        async fn fetch_image_bytes(&self, _reference: &str) -> Result<Vec<u8>, SourceError> {
            std::future::pending().await
        }
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            timeout: Duration::from_millis(1_000),
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_millis(250),
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = policy(5);
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(250));
        assert_eq!(policy.backoff(40), Duration::from_millis(250));
        assert_eq!(policy.attempts(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let source = Flaky { failures: 2, calls: AtomicU32::new(0), bytes: png(1, 1, 3) };
        let started = tokio::time::Instant::now();

        let payload = fetch_payload(&source, "https://cdn/a.png", &policy(2)).await.unwrap();
        assert_eq!(payload.format, AssetFormat::Png);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_counts_attempts() {
        let source = Flaky { failures: u32::MAX, calls: AtomicU32::new(0), bytes: Vec::new() };
        let exhausted = fetch_payload(&source, "https://cdn/a.png", &policy(1)).await.unwrap_err();
        assert_eq!(exhausted.attempts, 2);
        assert!(matches!(exhausted.last, AttemptError::Source(SourceError::Transport(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_attempt() {
        let exhausted = fetch_payload(&Hanging, "https://cdn/slow.png", &policy(0)).await.unwrap_err();
        assert_eq!(exhausted.attempts, 1);
        assert!(matches!(exhausted.last, AttemptError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_payload_is_retried() {
        let source = Flaky { failures: 0, calls: AtomicU32::new(0), bytes: b"not an image".to_vec() };
        let exhausted = fetch_payload(&source, "https://cdn/a.png", &policy(2)).await.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert!(matches!(exhausted.last, AttemptError::Payload(_)));
    }

    #[tokio::test]
    async fn test_data_uri_is_not_fetched() {
        let source = Flaky { failures: u32::MAX, calls: AtomicU32::new(0), bytes: Vec::new() };
        let payload = fetch_payload(&source, "data:image/svg+xml,<svg/>", &policy(3)).await.unwrap();
        assert_eq!(payload.format, AssetFormat::Svg);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
