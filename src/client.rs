use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::{
    email::EmailService,
    error::Sec4DevError,
    ip::IpService,
    rate_limit::{RateLimitCallback, RateLimitInfo},
    transport::Transport,
    Result,
};

const DEFAULT_BASE_URL: &str = "https://api.sec4.dev/api/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const API_KEY_PREFIX: &str = "sec4_";

#[derive(Clone)]
/// Client for the Sec4Dev Security Checks API.
pub struct Sec4DevClient {
    transport: Arc<Transport>,
    email: EmailService,
    ip: IpService,
    rate_limit: Arc<ArcSwap<RateLimitInfo>>,
}

impl fmt::Debug for Sec4DevClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sec4DevClient")
            .field("base_url", &self.transport.base_url())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Sec4DevClient {
    /// Creates a client with default settings for the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `SEC4DEV_API_KEY` — the account API key (required)
    /// - `SEC4DEV_BASE_URL` — alternative endpoint (optional)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sec4dev_http::Sec4DevClient;
    ///
    /// let client = Sec4DevClient::from_env().expect("missing SEC4DEV_API_KEY");
    /// ```
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SEC4DEV_API_KEY").map_err(|_| {
            Sec4DevError::validation("missing SEC4DEV_API_KEY environment variable")
        })?;
        let mut builder = Self::builder().api_key(api_key);
        if let Ok(base_url) = std::env::var("SEC4DEV_BASE_URL") {
            builder = builder.base_url(base_url);
        }
        builder.build()
    }

    /// Starts configuring a client.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    ///
    /// use sec4dev_http::Sec4DevClient;
    ///
    /// let client = Sec4DevClient::builder()
    ///     .api_key("sec4_live_abc123")
    ///     .timeout(Duration::from_secs(10))
    ///     .max_retries(2)
    ///     .build()
    ///     .expect("API key must be valid");
    /// ```
    pub fn builder() -> Sec4DevClientBuilder {
        Sec4DevClientBuilder::default()
    }

    /// Email disposability checks.
    pub fn email(&self) -> &EmailService {
        &self.email
    }

    /// IP reputation checks.
    pub fn ip(&self) -> &IpService {
        &self.ip
    }

    /// Rate-limit snapshot from the most recent API response, across all
    /// clones of this client. All zeroes until the first response arrives.
    pub fn rate_limit(&self) -> RateLimitInfo {
        **self.rate_limit.load()
    }
}

/// Configures and builds a [`Sec4DevClient`].
pub struct Sec4DevClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
    max_retries: usize,
    retry_delay: Duration,
    on_rate_limit: Option<Arc<RateLimitCallback>>,
}

impl Default for Sec4DevClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            on_rate_limit: None,
        }
    }
}

impl Sec4DevClientBuilder {
    /// Account API key. Must start with `sec4_`.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Endpoint to call instead of the production API. A trailing slash
    /// is stripped.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Per-attempt request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retries after the initial attempt. Defaults to 3.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base delay of the exponential backoff between retries. Defaults to
    /// 1 second.
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Callback invoked with the rate-limit snapshot of every response.
    ///
    /// Called from whichever task performed the request, once per received
    /// response, before the outcome of the call is decided.
    pub fn on_rate_limit(
        mut self,
        callback: impl Fn(RateLimitInfo) + Send + Sync + 'static,
    ) -> Self {
        self.on_rate_limit = Some(Arc::new(callback));
        self
    }

    /// Validates the configuration and builds the client.
    pub fn build(self) -> Result<Sec4DevClient> {
        let api_key = self
            .api_key
            .map(|key| key.trim().to_owned())
            .unwrap_or_default();
        if !api_key.starts_with(API_KEY_PREFIX) {
            return Err(Sec4DevError::validation("API key must start with sec4_"));
        }

        let base_url = match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_owned(),
            _ => DEFAULT_BASE_URL.to_owned(),
        };
        let timeout = if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        };

        let transport = Arc::new(Transport::new(
            base_url,
            api_key,
            timeout,
            self.max_retries,
            self.retry_delay,
        )?);

        // Every response updates the shared snapshot first, then reaches
        // the user callback.
        let rate_limit = Arc::new(ArcSwap::from_pointee(RateLimitInfo::default()));
        let cell = Arc::clone(&rate_limit);
        let user_callback = self.on_rate_limit;
        let observer: Arc<RateLimitCallback> = Arc::new(move |info: RateLimitInfo| {
            cell.store(Arc::new(info));
            if let Some(callback) = &user_callback {
                callback(info);
            }
        });

        Ok(Sec4DevClient {
            email: EmailService::new(Arc::clone(&transport), Arc::clone(&observer)),
            ip: IpService::new(Arc::clone(&transport), observer),
            transport,
            rate_limit,
        })
    }
}
