//! `sec4dev-http` is an async client for the Sec4Dev Security Checks API.
//!
//! The crate wraps the `/email/check` and `/ip/check` endpoints with
//! ergonomic services:
//! - [`EmailService::check`] / [`EmailService::is_disposable`]
//! - [`IpService::check`] and its signal helpers
//!
//! Every request is authenticated with the account API key, retried with
//! exponential backoff on transient failures, and surfaces rate-limit
//! headers through [`Sec4DevClient::rate_limit`] and an optional callback.

mod client;
mod email;
mod error;
mod ip;
mod rate_limit;
mod transport;
mod types;
mod validate;

pub use client::{Sec4DevClient, Sec4DevClientBuilder};
pub use email::EmailService;
pub use error::Sec4DevError;
pub use ip::IpService;
pub use rate_limit::{RateLimitCallback, RateLimitInfo};
pub use types::{
    EmailCheckResult, IpCheckResult, IpClassification, IpGeo, IpNetwork, IpSignals,
};

/// User agent sent with every API request.
pub const USER_AGENT: &str = concat!("sec4dev-http/", env!("CARGO_PKG_VERSION"));

pub type Result<T> = std::result::Result<T, Sec4DevError>;
