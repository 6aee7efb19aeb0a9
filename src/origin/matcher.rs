//! Allowed-domain matching.
//!
//! # Responsibilities
//! - Compile `allowed_domains` entries into patterns once per config load
//! - Match a reporting origin against a pattern
//!
//! # Design Decisions
//! - Host matching is case-insensitive and ignores a trailing dot
//! - `example.com` covers the domain and all of its subdomains
//! - `*.example.com` covers subdomains only
//! - Scheme and port only constrain the match when the entry names them
//! - No regex, so matching is linear in the number of entries

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostPattern {
    /// `*` or `scheme://*`.
    Any,
    /// `example.com`: the domain itself or any subdomain.
    Domain(String),
    /// `*.example.com`: strict subdomains only.
    Subdomains(String),
}

/// One compiled `allowed_domains` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPattern {
    scheme: Option<String>,
    host: HostPattern,
    port: Option<u16>,
}

impl OriginPattern {
    /// Compile an entry. Returns `None` for entries that cannot match anything.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry == "*" {
            return Some(Self {
                scheme: None,
                host: HostPattern::Any,
                port: None,
            });
        }

        let (scheme, rest) = match entry.split_once("://") {
            Some((scheme, rest)) => (Some(scheme.to_ascii_lowercase()), rest),
            None => (None, entry),
        };
        let authority = rest.split('/').next().unwrap_or_default();
        let (host, port) = split_port(authority)?;
        let host = normalize_host(host);
        if host.is_empty() {
            return None;
        }

        let host = if host == "*" {
            HostPattern::Any
        } else if let Some(parent) = host.strip_prefix("*.") {
            HostPattern::Subdomains(parent.to_string())
        } else {
            HostPattern::Domain(host)
        };

        Some(Self { scheme, host, port })
    }

    /// Returns true if the origin satisfies this pattern.
    pub fn matches(&self, origin: &Url) -> bool {
        if let Some(scheme) = &self.scheme {
            if origin.scheme() != scheme {
                return false;
            }
        }
        if let Some(port) = self.port {
            if origin.port_or_known_default() != Some(port) {
                return false;
            }
        }

        let host = match origin.host_str() {
            Some(host) => normalize_host(host),
            None => return false,
        };
        match &self.host {
            HostPattern::Any => true,
            HostPattern::Domain(domain) => host == *domain || is_subdomain(&host, domain),
            HostPattern::Subdomains(parent) => is_subdomain(&host, parent),
        }
    }
}

fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_subdomain(host: &str, parent: &str) -> bool {
    host.len() > parent.len() + 1
        && host.ends_with(parent)
        && host.as_bytes()[host.len() - parent.len() - 1] == b'.'
}

/// Split `host[:port]`, keeping bracketed IPv6 hosts intact.
fn split_port(authority: &str) -> Option<(&str, Option<u16>)> {
    let port_start = if authority.starts_with('[') {
        authority.find(']').map(|end| end + 1)?
    } else {
        authority.rfind(':').unwrap_or(authority.len())
    };
    let (host, port) = authority.split_at(port_start);
    match port.strip_prefix(':') {
        Some(port) => Some((host, Some(port.parse().ok()?))),
        None if port.is_empty() => Some((host, None)),
        None => None,
    }
}
