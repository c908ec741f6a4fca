use std::time::Duration;

use rand::Rng;
use reqwest::{header, StatusCode};
use serde::Serialize;
use tokio::time::sleep;

use crate::{
    error::{self, Sec4DevError},
    rate_limit::{self, RateLimitCallback, RateLimitInfo},
    Result, USER_AGENT,
};

const API_KEY_HEADER: &str = "x-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Cooldown applied to a 429 response that carries no `Retry-After` header.
const DEFAULT_COOLDOWN_SECS: u32 = 60;
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Outcome of a single request attempt.
enum AttemptOutcome {
    /// Status < 400; carries the raw response body.
    Success(Vec<u8>),
    /// 429; the server dictates the wait before the next attempt.
    RateLimited {
        error: Sec4DevError,
        cooldown: Duration,
    },
    /// Network failure or retryable status; eligible for backoff and retry.
    Transient(Sec4DevError),
    /// Non-retryable failure, surfaced to the caller unchanged.
    Fatal(Sec4DevError),
}

/// Shared HTTP layer under the domain services.
///
/// Owns the connection pool; one instance is built per client and reused
/// for every request.
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    max_retries: usize,
    retry_base_delay: Duration,
}

impl Transport {
    pub(crate) fn new(
        base_url: String,
        api_key: String,
        timeout: Duration,
        max_retries: usize,
        retry_base_delay: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|err| Sec4DevError::generic(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url,
            api_key,
            timeout,
            max_retries,
            retry_base_delay,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a JSON POST and returns the raw success body.
    ///
    /// Runs up to `max_retries + 1` attempts. A 429 response waits out the
    /// server's `Retry-After` without advancing the backoff schedule; other
    /// retryable failures sleep `retry_base_delay * 2^n + jitter` between
    /// attempts. The observer receives a rate-limit snapshot for every
    /// response, success or error.
    pub(crate) async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        observer: Option<&RateLimitCallback>,
    ) -> Result<Vec<u8>> {
        // The payload cannot change between attempts, so a body that does
        // not serialize fails the call before the first send.
        let payload = serde_json::to_vec(body)
            .map_err(|err| Sec4DevError::generic(format!("Failed to serialize request: {err}")))?;
        let url = format!("{}{}", self.base_url, path);

        let mut backoff_exponent = 0u32;
        for attempt in 0..=self.max_retries {
            match self.run_attempt(&url, &payload, observer).await {
                AttemptOutcome::Success(body) => return Ok(body),
                AttemptOutcome::Fatal(error) => return Err(error),
                AttemptOutcome::RateLimited { error, cooldown } => {
                    if attempt == self.max_retries {
                        return Err(error);
                    }

                    #[cfg(feature = "tracing")]
                    tracing::debug!("rate limited, retrying after {} s", cooldown.as_secs());

                    sleep(cooldown).await;
                }
                AttemptOutcome::Transient(error) => {
                    if attempt == self.max_retries {
                        return Err(error);
                    }
                    let delay = backoff_delay(
                        self.retry_base_delay,
                        backoff_exponent,
                        rand::thread_rng().gen_range(0..=100),
                    );
                    backoff_exponent += 1;

                    #[cfg(feature = "tracing")]
                    tracing::debug!("retrying request after {} ms", delay.as_millis());

                    sleep(delay).await;
                }
            }
        }

        Err(Sec4DevError::generic("Request failed after retries"))
    }

    async fn run_attempt(
        &self,
        url: &str,
        payload: &[u8],
        observer: Option<&RateLimitCallback>,
    ) -> AttemptOutcome {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .body(payload.to_vec())
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => return AttemptOutcome::Transient(Sec4DevError::generic(err.to_string())),
        };

        let status = response.status();
        let headers = response.headers().clone();

        if let Some(observer) = observer {
            observer(RateLimitInfo::from_headers(&headers));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => return AttemptOutcome::Transient(Sec4DevError::generic(err.to_string())),
        };

        if status == StatusCode::TOO_MANY_REQUESTS {
            let wait = rate_limit::retry_after_seconds(&headers, DEFAULT_COOLDOWN_SECS);
            return AttemptOutcome::RateLimited {
                error: Sec4DevError::classify(status.as_u16(), &body, &headers),
                cooldown: Duration::from_secs(u64::from(wait)),
            };
        }

        if status.as_u16() >= 400 {
            let error = Sec4DevError::classify(status.as_u16(), &body, &headers);
            return if error::is_retryable(status.as_u16(), false) {
                AttemptOutcome::Transient(error)
            } else {
                AttemptOutcome::Fatal(error)
            };
        }

        AttemptOutcome::Success(body.to_vec())
    }
}

/// Delay before the next general-path retry: `base * 2^exponent + jitter`,
/// with the exponent capped and every step saturating.
fn backoff_delay(base: Duration, exponent: u32, jitter_ms: u64) -> Duration {
    let multiplier = 1u32 << exponent.min(MAX_BACKOFF_EXPONENT);
    base.saturating_mul(multiplier)
        .saturating_add(Duration::from_millis(jitter_ms))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{backoff_delay, Transport};
    use crate::Sec4DevError;

    struct Unserializable;

    impl serde::Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(
            &self,
            _serializer: S,
        ) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn backoff_doubles_per_exponent_step() {
        assert_eq!(
            backoff_delay(Duration::from_secs(1), 0, 0),
            Duration::from_secs(1)
        );
        assert_eq!(
            backoff_delay(Duration::from_secs(1), 1, 0),
            Duration::from_secs(2)
        );
        assert_eq!(
            backoff_delay(Duration::from_secs(1), 3, 0),
            Duration::from_secs(8)
        );
    }

    #[test]
    fn backoff_adds_jitter_on_top() {
        assert_eq!(
            backoff_delay(Duration::from_secs(1), 1, 57),
            Duration::from_millis(2057)
        );
    }

    #[test]
    fn backoff_exponent_is_capped() {
        assert_eq!(
            backoff_delay(Duration::from_millis(1), 40, 0),
            Duration::from_millis(65_536)
        );
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        assert_eq!(backoff_delay(Duration::MAX, 4, 100), Duration::MAX);
    }

    #[tokio::test]
    async fn unserializable_body_fails_before_any_send() {
        let transport = Transport::new(
            "http://127.0.0.1:9".to_owned(),
            "sec4_test_key".to_owned(),
            Duration::from_secs(1),
            3,
            Duration::from_millis(1),
        )
        .expect("transport must build");

        let error = transport
            .post("/email/check", &Unserializable, None)
            .await
            .expect_err("serialization must fail");

        assert!(matches!(error, Sec4DevError::Generic { .. }));
        assert_eq!(error.status(), 0);
        assert!(error.message().starts_with("Failed to serialize request"));
    }
}
