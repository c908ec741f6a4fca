use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::rate_limit::{self, RateLimitInfo};

/// Error type returned by this crate.
///
/// Every variant carries the human-readable message (taken from the response
/// body's `detail` field when present), the HTTP status code (`0` for
/// failures that never produced a response), and the decoded response body
/// when it was a JSON object.
#[derive(Debug, thiserror::Error)]
pub enum Sec4DevError {
    /// 401 — missing or invalid API key.
    #[error("authentication error {status}: {message}")]
    Authentication {
        message: String,
        status: u16,
        body: Option<Value>,
    },
    /// 402 — account out of credits.
    #[error("payment required {status}: {message}")]
    PaymentRequired {
        message: String,
        status: u16,
        body: Option<Value>,
    },
    /// 403 — key lacks access to the endpoint.
    #[error("forbidden {status}: {message}")]
    Forbidden {
        message: String,
        status: u16,
        body: Option<Value>,
    },
    /// 404 — unknown resource or path.
    #[error("not found {status}: {message}")]
    NotFound {
        message: String,
        status: u16,
        body: Option<Value>,
    },
    /// 422 — request rejected by validation, server- or client-side.
    #[error("validation error {status}: {message}")]
    Validation {
        message: String,
        status: u16,
        body: Option<Value>,
    },
    /// 429 — rate limit exhausted after all attempts.
    #[error("rate limit exceeded {status}: {message} (retry after {retry_after}s)")]
    RateLimit {
        message: String,
        status: u16,
        body: Option<Value>,
        /// Seconds from the `Retry-After` header, `0` when absent.
        retry_after: u32,
        /// Window size from `x-ratelimit-limit`.
        limit: u32,
        /// Requests left from `x-ratelimit-remaining`.
        remaining: u32,
    },
    /// Any 5xx status.
    #[error("server error {status}: {message}")]
    Server {
        message: String,
        status: u16,
        body: Option<Value>,
    },
    /// Everything else: unmapped statuses, transport failures, bad payloads.
    #[error("api error {status}: {message}")]
    Generic {
        message: String,
        status: u16,
        body: Option<Value>,
    },
}

impl Sec4DevError {
    /// Maps a response to the matching error kind.
    ///
    /// The body is decoded as JSON on a best-effort basis: a body that is
    /// not a JSON object is dropped, and the message falls back to
    /// `"Unknown error"` when no `detail` field is available.
    pub(crate) fn classify(status: u16, body: &[u8], headers: &HeaderMap) -> Self {
        let body = decode_object(body);
        let message = detail_message(body.as_ref());
        match status {
            401 => Self::Authentication {
                message,
                status,
                body,
            },
            402 => Self::PaymentRequired {
                message,
                status,
                body,
            },
            403 => Self::Forbidden {
                message,
                status,
                body,
            },
            404 => Self::NotFound {
                message,
                status,
                body,
            },
            422 => Self::Validation {
                message,
                status,
                body,
            },
            429 => {
                let snapshot = RateLimitInfo::from_headers(headers);
                Self::RateLimit {
                    message,
                    status,
                    body,
                    retry_after: rate_limit::retry_after_seconds(headers, 0),
                    limit: snapshot.limit,
                    remaining: snapshot.remaining,
                }
            }
            _ if status >= 500 => Self::Server {
                message,
                status,
                body,
            },
            _ => Self::Generic {
                message,
                status,
                body,
            },
        }
    }

    /// Client-side validation failure, aligned with the server's 422 shape.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            status: 422,
            body: None,
        }
    }

    /// Failure with no usable HTTP response (transport, payload, decode).
    pub(crate) fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
            status: 0,
            body: None,
        }
    }

    /// HTTP status code of the failing response, `0` when the failure
    /// happened before a response was received.
    pub fn status(&self) -> u16 {
        match self {
            Self::Authentication { status, .. }
            | Self::PaymentRequired { status, .. }
            | Self::Forbidden { status, .. }
            | Self::NotFound { status, .. }
            | Self::Validation { status, .. }
            | Self::RateLimit { status, .. }
            | Self::Server { status, .. }
            | Self::Generic { status, .. } => *status,
        }
    }

    /// Human-readable message, from the response `detail` field when present.
    pub fn message(&self) -> &str {
        match self {
            Self::Authentication { message, .. }
            | Self::PaymentRequired { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::Validation { message, .. }
            | Self::RateLimit { message, .. }
            | Self::Server { message, .. }
            | Self::Generic { message, .. } => message,
        }
    }

    /// Decoded response body, present only when the response carried a
    /// JSON object.
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            Self::Authentication { body, .. }
            | Self::PaymentRequired { body, .. }
            | Self::Forbidden { body, .. }
            | Self::NotFound { body, .. }
            | Self::Validation { body, .. }
            | Self::RateLimit { body, .. }
            | Self::Server { body, .. }
            | Self::Generic { body, .. } => body.as_ref(),
        }
    }
}

/// Decides whether a failed attempt may be retried.
///
/// Transport-level failures always qualify; otherwise only 429 and the
/// transient 5xx statuses do. All other 4xx codes describe a request the
/// server will keep rejecting.
pub(crate) fn is_retryable(status: u16, network_error: bool) -> bool {
    network_error || matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn decode_object(body: &[u8]) -> Option<Value> {
    serde_json::from_slice::<Value>(body)
        .ok()
        .filter(Value::is_object)
}

fn detail_message(body: Option<&Value>) -> String {
    match body.and_then(|value| value.get("detail")) {
        Some(Value::String(detail)) => detail.clone(),
        Some(Value::Null) | None => "Unknown error".to_owned(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue};

    use super::{is_retryable, Sec4DevError};

    fn classify(status: u16, body: &str) -> Sec4DevError {
        Sec4DevError::classify(status, body.as_bytes(), &HeaderMap::new())
    }

    #[test]
    fn maps_each_status_to_its_kind() {
        assert!(matches!(
            classify(401, "{}"),
            Sec4DevError::Authentication { .. }
        ));
        assert!(matches!(
            classify(402, "{}"),
            Sec4DevError::PaymentRequired { .. }
        ));
        assert!(matches!(classify(403, "{}"), Sec4DevError::Forbidden { .. }));
        assert!(matches!(classify(404, "{}"), Sec4DevError::NotFound { .. }));
        assert!(matches!(
            classify(422, "{}"),
            Sec4DevError::Validation { .. }
        ));
        assert!(matches!(classify(429, "{}"), Sec4DevError::RateLimit { .. }));
        assert!(matches!(classify(500, "{}"), Sec4DevError::Server { .. }));
        assert!(matches!(classify(503, "{}"), Sec4DevError::Server { .. }));
        assert!(matches!(classify(418, "{}"), Sec4DevError::Generic { .. }));
    }

    #[test]
    fn detail_field_becomes_the_message() {
        let error = classify(402, r#"{"detail": "Insufficient credits"}"#);
        assert_eq!(error.message(), "Insufficient credits");
        assert_eq!(error.status(), 402);
    }

    #[test]
    fn non_string_detail_is_stringified() {
        let error = classify(422, r#"{"detail": {"field": "email"}}"#);
        assert_eq!(error.message(), r#"{"field":"email"}"#);
    }

    #[test]
    fn missing_detail_falls_back_to_unknown_error() {
        assert_eq!(classify(404, r#"{"other": 1}"#).message(), "Unknown error");
        assert_eq!(classify(404, r#"{"detail": null}"#).message(), "Unknown error");
    }

    #[test]
    fn undecodable_body_falls_back_without_raw_body() {
        let error = classify(500, "<html>oops</html>");
        assert_eq!(error.message(), "Unknown error");
        assert!(error.response_body().is_none());
    }

    #[test]
    fn non_object_json_body_is_dropped() {
        let error = classify(500, r#""oops""#);
        assert_eq!(error.message(), "Unknown error");
        assert!(error.response_body().is_none());
    }

    #[test]
    fn object_body_is_kept_verbatim() {
        let error = classify(404, r#"{"detail": "No such endpoint", "code": 9}"#);
        let body = error.response_body().expect("body must be kept");
        assert_eq!(body["code"], 9);
    }

    #[test]
    fn rate_limit_carries_header_fields() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("100"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));

        let error = Sec4DevError::classify(429, b"{}", &headers);
        match error {
            Sec4DevError::RateLimit {
                retry_after,
                limit,
                remaining,
                ..
            } => {
                assert_eq!(retry_after, 30);
                assert_eq!(limit, 100);
                assert_eq!(remaining, 0);
            }
            other => panic!("expected rate limit error, got {other:?}"),
        }
    }

    #[test]
    fn rate_limit_retry_after_defaults_to_zero() {
        match classify(429, "{}") {
            Sec4DevError::RateLimit { retry_after, .. } => assert_eq!(retry_after, 0),
            other => panic!("expected rate limit error, got {other:?}"),
        }
    }

    #[test]
    fn retryable_statuses_match_the_transient_set() {
        for status in [429, 500, 502, 503, 504] {
            assert!(is_retryable(status, false), "status {status} must retry");
        }
        for status in [400, 401, 402, 403, 404, 409, 418, 422, 501] {
            assert!(!is_retryable(status, false), "status {status} must not retry");
        }
        assert!(is_retryable(0, true));
    }

    #[test]
    fn client_side_validation_has_no_body() {
        let error = Sec4DevError::validation("Invalid email format");
        assert_eq!(error.status(), 422);
        assert_eq!(error.message(), "Invalid email format");
        assert!(error.response_body().is_none());
    }
}
