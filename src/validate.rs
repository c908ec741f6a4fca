use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{error::Sec4DevError, Result};

/// Email shape check compiled once at first use. Cheap on purpose: one
/// `@`, no whitespace, a dot somewhere in the domain. The server performs
/// the authoritative validation.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("EMAIL_PATTERN is valid and well-formed")
});

/// Validates an email address before it is sent, returning the trimmed
/// form the API expects.
pub(crate) fn email(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Sec4DevError::validation("Email cannot be empty"));
    }
    if !EMAIL_PATTERN.is_match(trimmed) {
        return Err(Sec4DevError::validation("Invalid email format"));
    }
    Ok(trimmed)
}

/// Validates an IPv4 or IPv6 address literal, returning the trimmed form.
pub(crate) fn ip(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Sec4DevError::validation("IP address cannot be empty"));
    }
    if trimmed.parse::<IpAddr>().is_err() {
        return Err(Sec4DevError::validation("Invalid IP address format"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use crate::Sec4DevError;

    #[test]
    fn accepts_plain_email_and_trims_it() {
        let email = super::email("  user@example.com ").expect("email must validate");
        assert_eq!(email, "user@example.com");
    }

    #[test]
    fn rejects_empty_email() {
        let error = super::email("   ").expect_err("blank email must fail");
        assert!(matches!(error, Sec4DevError::Validation { .. }));
        assert_eq!(error.message(), "Email cannot be empty");
        assert_eq!(error.status(), 422);
    }

    #[test]
    fn rejects_malformed_emails() {
        for raw in ["plainaddress", "user@domain", "a b@example.com", "@example.com"] {
            let error = super::email(raw).expect_err("malformed email must fail");
            assert_eq!(error.message(), "Invalid email format", "input: {raw}");
        }
    }

    #[test]
    fn accepts_v4_and_v6_addresses() {
        let v4 = super::ip("203.0.113.42").expect("v4 must validate");
        assert_eq!(v4, "203.0.113.42");
        let v6 = super::ip(" 2001:db8::1 ").expect("v6 must validate");
        assert_eq!(v6, "2001:db8::1");
    }

    #[test]
    fn rejects_empty_ip() {
        let error = super::ip("").expect_err("blank ip must fail");
        assert_eq!(error.message(), "IP address cannot be empty");
    }

    #[test]
    fn rejects_non_address_strings() {
        for raw in ["999.1.1.1", "203.0.113", "example.com", "203.0.113.42/24"] {
            let error = super::ip(raw).expect_err("malformed ip must fail");
            assert_eq!(error.message(), "Invalid IP address format", "input: {raw}");
        }
    }
}
