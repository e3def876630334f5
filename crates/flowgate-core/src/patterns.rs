//! Shared detection patterns.
//!
//! These regexes are used by both the condition evaluator (`is_email`,
//! `is_phone` operators) and the constraint evaluator (`email`, `phone`,
//! `url` constraint kinds), so they live in one place.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Email address pattern (RFC 5322 simplified), anchored to the full value.
    pub static ref EMAIL_PATTERN: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();

    /// Permissive phone number pattern: optional leading +, then at least
    /// seven digits mixed with common punctuation.
    pub static ref PHONE_PATTERN: Regex = Regex::new(
        r"^\+?[0-9][0-9()\[\].\s/-]{5,}[0-9]$"
    ).unwrap();

    /// URL pattern: scheme, authority, optional path/query.
    pub static ref URL_PATTERN: Regex = Regex::new(
        r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/$.?#][^\s]*$"
    ).unwrap();
}

/// Check whether a value looks like an email address.
pub fn is_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value.trim())
}

/// Check whether a value looks like a phone number.
pub fn is_phone(value: &str) -> bool {
    PHONE_PATTERN.is_match(value.trim())
}

/// Check whether a value parses as a URL.
pub fn is_url(value: &str) -> bool {
    URL_PATTERN.is_match(value.trim())
}
