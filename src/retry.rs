// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use crate::errors::OrchestratorError;

/// Status codes that classify a response as anti-bot interference rather
/// than a genuine transport failure.
pub const ANTI_BOT_STATUSES: [u16; 3] = [403, 429, 503];

pub fn is_anti_bot_status(status: u16) -> bool {
    ANTI_BOT_STATUSES.contains(&status)
}

/// Outcome of a single fetch attempt, replacing exception-for-control-flow
/// retry loops with an explicit result.
pub enum Outcome<T> {
    /// The attempt succeeded; stop retrying.
    Ok(T),
    /// The attempt failed in a retryable way; try again if budget remains.
    Retry(String),
    /// The attempt failed in a way no retry can fix; stop immediately.
    Fatal(OrchestratorError),
}

/// Backoff before attempt `n` (1-indexed): `2^n + uniform(0, 1)` seconds.
/// Never called after the final attempt — there is no sleep after exhaustion.
pub fn backoff_delay(attempt: u32) -> Duration {
    let base = 2f64.powi(attempt as i32);
    let jitter = rand::random::<f64>();
    Duration::from_secs_f64(base + jitter)
}

/// Runs `attempt_fn` up to `retries` times total, sleeping
/// `backoff_delay(n)` between attempts (never after the last one).
///
/// `attempt_fn` receives the 1-indexed attempt number and returns an
/// `Outcome`. On exhaustion, wraps the last `Retry` reason into
/// `UpstreamFetchFailed`.
pub async fn run_with_backoff<T, F, Fut>(
    client_name: &str,
    url: &str,
    retries: u32,
    mut attempt_fn: F,
) -> Result<T, OrchestratorError>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Outcome<T>>,
{
    let mut last_reason = String::from("no attempts made");

    for attempt in 1..=retries {
        match attempt_fn(attempt).await {
            Outcome::Ok(value) => return Ok(value),
            Outcome::Fatal(err) => return Err(err),
            Outcome::Retry(reason) => {
                last_reason = reason;
                if attempt < retries {
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
            }
        }
    }

    Err(OrchestratorError::UpstreamFetchFailed {
        client_name: client_name.to_string(),
        url: url.to_string(),
        last_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_monotonically_non_decreasing_in_its_deterministic_component() {
        for n in 1..6 {
            let lower_bound = 2f64.powi(n);
            let delay = backoff_delay(n as u32).as_secs_f64();
            assert!(delay >= lower_bound);
            assert!(delay < lower_bound + 1.0);
        }
    }

    #[tokio::test]
    async fn exhausts_retries_and_wraps_last_reason() {
        let result: Result<(), OrchestratorError> =
            run_with_backoff("test-client", "https://example.invalid", 2, |attempt| async move {
                Outcome::Retry(format!("attempt {attempt} failed"))
            })
            .await;

        match result {
            Err(OrchestratorError::UpstreamFetchFailed { last_reason, .. }) => {
                assert_eq!(last_reason, "attempt 2 failed");
            }
            _ => panic!("expected UpstreamFetchFailed"),
        }
    }

    #[tokio::test]
    async fn succeeds_without_exhausting_budget() {
        let mut calls = 0;
        let result = run_with_backoff("test-client", "https://example.invalid", 3, |attempt| {
            calls += 1;
            async move {
                if attempt < 2 {
                    Outcome::Retry("not yet".into())
                } else {
                    Outcome::Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 2);
    }
}
