use reqwest::header::HeaderMap;

pub(crate) const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub(crate) const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub(crate) const RESET_HEADER: &str = "x-ratelimit-reset";
pub(crate) const RETRY_AFTER_HEADER: &str = "retry-after";

/// Callback invoked with the rate-limit snapshot of every API response.
pub type RateLimitCallback = dyn Fn(RateLimitInfo) + Send + Sync;

/// Rate-limit state reported by the API through response headers.
///
/// Produced fresh for every response; a missing or malformed header value
/// yields `0` for that field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests allowed in the current window.
    pub limit: u32,
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// Seconds until the window resets.
    pub reset_seconds: u32,
}

impl RateLimitInfo {
    /// Parses the `x-ratelimit-*` headers of a response. Never fails.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: header_u32(headers, LIMIT_HEADER).unwrap_or(0),
            remaining: header_u32(headers, REMAINING_HEADER).unwrap_or(0),
            reset_seconds: header_u32(headers, RESET_HEADER).unwrap_or(0),
        }
    }
}

/// Seconds the server asked us to wait, or `default_seconds` when the
/// `Retry-After` header is absent or not a non-negative integer.
pub(crate) fn retry_after_seconds(headers: &HeaderMap, default_seconds: u32) -> u32 {
    header_u32(headers, RETRY_AFTER_HEADER).unwrap_or(default_seconds)
}

fn header_u32(headers: &HeaderMap, key: &str) -> Option<u32> {
    headers.get(key)?.to_str().ok()?.parse().ok()
}
