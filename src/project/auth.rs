//! Public key extraction.
//!
//! Browsers cannot set headers on security reports, so the key normally
//! arrives as the `sentry_key` query parameter. Non-browser senders may use
//! the `X-Sentry-Auth` header instead.

pub const X_SENTRY_AUTH: &str = "x-sentry-auth";

/// Pick the public key from the query, falling back to `X-Sentry-Auth`.
pub fn public_key(query_key: Option<&str>, auth_header: Option<&str>) -> Option<String> {
    query_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .or_else(|| auth_header.and_then(key_from_auth_header))
}

/// Parse `Sentry sentry_key=abc, sentry_version=7`.
fn key_from_auth_header(header: &str) -> Option<String> {
    let header = header.trim();
    let params = match header.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("sentry") => rest,
        _ => header,
    };

    params
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == "sentry_key")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
