//! Generic retry wrapper for upstream HTTP calls.
//!
//! Three attempts, linear backoff (`base * attempt_index`), retrying only on
//! connection errors, timeouts, HTTP 5xx and HTTP 429 — never on other 4xx.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub const MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Classifies a `reqwest::Error` (or a status code observed on an `Ok` response)
/// as retriable per the upstream client's connection & retry policy.
pub fn is_retriable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status.as_u16() == 429
}

pub fn is_retriable_transport_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Executes `f` up to [`MAX_ATTEMPTS`] times, sleeping `BACKOFF_BASE * attempt_index`
/// between attempts whenever `should_retry` says the error is transient.
///
/// `f` is re-invoked fresh on each attempt (it must be idempotent, which every
/// upstream GET in this crate is).
pub async fn execute_with_retry<F, Fut, T, E>(
    endpoint: &str,
    mut f: F,
    should_retry: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS && should_retry(&err) => {
                let delay = BACKOFF_BASE * attempt;
                warn!(
                    "retriable error calling '{}' (attempt {}/{}): {}; retrying in {:?}",
                    endpoint, attempt, MAX_ATTEMPTS, err, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = execute_with_retry(
            "test",
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok(42)
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = execute_with_retry(
            "test",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err("always fails") }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Err("always fails"));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn non_retriable_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = execute_with_retry(
            "test",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err("bad request") }
            },
            |_| false,
        )
        .await;

        assert_eq!(result, Err("bad request"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retriable_statuses() {
        assert!(is_retriable_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retriable_status(
            reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
        assert!(!is_retriable_status(reqwest::StatusCode::NOT_FOUND));
        assert!(!is_retriable_status(reqwest::StatusCode::BAD_REQUEST));
    }
}
