use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::Sec4DevError, rate_limit::RateLimitCallback, transport::Transport, validate,
    EmailCheckResult, Result,
};

#[derive(Serialize)]
struct EmailCheckRequest<'a> {
    email: &'a str,
}

/// Email disposability checks.
///
/// Obtained from [`Sec4DevClient::email`](crate::Sec4DevClient::email).
#[derive(Clone)]
pub struct EmailService {
    transport: Arc<Transport>,
    observer: Arc<RateLimitCallback>,
}

impl EmailService {
    pub(crate) fn new(transport: Arc<Transport>, observer: Arc<RateLimitCallback>) -> Self {
        Self {
            transport,
            observer,
        }
    }

    /// Checks whether an email address uses a disposable domain.
    ///
    /// The address is validated and trimmed before anything is sent; a
    /// malformed address fails with a 422 validation error and no request.
    pub async fn check(&self, email: &str) -> Result<EmailCheckResult> {
        let email = validate::email(email)?;
        let body = self
            .transport
            .post(
                "/email/check",
                &EmailCheckRequest { email },
                Some(self.observer.as_ref()),
            )
            .await?;
        serde_json::from_slice(&body)
            .map_err(|err| Sec4DevError::generic(format!("Failed to parse response: {err}")))
    }

    /// Returns true if the email domain is disposable.
    pub async fn is_disposable(&self, email: &str) -> Result<bool> {
        Ok(self.check(email).await?.is_disposable)
    }
}
