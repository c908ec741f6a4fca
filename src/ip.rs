use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::Sec4DevError, rate_limit::RateLimitCallback, transport::Transport, validate,
    IpCheckResult, Result,
};

#[derive(Serialize)]
struct IpCheckRequest<'a> {
    ip: &'a str,
}

/// IP reputation and classification checks.
///
/// Obtained from [`Sec4DevClient::ip`](crate::Sec4DevClient::ip).
#[derive(Clone)]
pub struct IpService {
    transport: Arc<Transport>,
    observer: Arc<RateLimitCallback>,
}

impl IpService {
    pub(crate) fn new(transport: Arc<Transport>, observer: Arc<RateLimitCallback>) -> Self {
        Self {
            transport,
            observer,
        }
    }

    /// Classifies an IPv4 or IPv6 address.
    ///
    /// The address is validated and trimmed before anything is sent; a
    /// string that does not parse as an address fails with a 422
    /// validation error and no request.
    pub async fn check(&self, ip: &str) -> Result<IpCheckResult> {
        let ip = validate::ip(ip)?;
        let body = self
            .transport
            .post("/ip/check", &IpCheckRequest { ip }, Some(self.observer.as_ref()))
            .await?;
        serde_json::from_slice(&body)
            .map_err(|err| Sec4DevError::generic(format!("Failed to parse response: {err}")))
    }

    /// Returns true if the address belongs to a hosting provider.
    pub async fn is_hosting(&self, ip: &str) -> Result<bool> {
        Ok(self.check(ip).await?.signals.is_hosting)
    }

    /// Returns true if the address is a known VPN egress.
    pub async fn is_vpn(&self, ip: &str) -> Result<bool> {
        Ok(self.check(ip).await?.signals.is_vpn)
    }

    /// Returns true if the address is a Tor exit node.
    pub async fn is_tor(&self, ip: &str) -> Result<bool> {
        Ok(self.check(ip).await?.signals.is_tor)
    }

    /// Returns true if the address looks residential.
    pub async fn is_residential(&self, ip: &str) -> Result<bool> {
        Ok(self.check(ip).await?.signals.is_residential)
    }

    /// Returns true if the address belongs to a mobile carrier.
    pub async fn is_mobile(&self, ip: &str) -> Result<bool> {
        Ok(self.check(ip).await?.signals.is_mobile)
    }
}
