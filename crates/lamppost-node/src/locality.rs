//! Locality slugs and request origin resolution.
//!
//! Everything here is network-free and runs on every request: slug
//! normalization, locality subdomain extraction from the request host, and
//! the per-request context the write gate consumes.

/// Canonical slug for a locality name.
///
/// Lowercase, with every run of characters outside `[a-z0-9]` collapsed to
/// a single hyphen and leading/trailing hyphens stripped. Applying it twice
/// yields the same slug as applying it once.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Locality subdomain from a request host, if the host has the expected
/// `<locality>.<root>.<tld>` shape: three or more labels with the
/// second-to-last equal to the configured root domain label. Ports are
/// ignored; the returned label is lowercased.
pub fn extract_subdomain(host: &str, root_label: &str) -> Option<String> {
    let hostname = strip_port(host);
    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() >= 3 && labels[labels.len() - 2].eq_ignore_ascii_case(root_label) {
        Some(labels[0].to_ascii_lowercase())
    } else {
        None
    }
}

/// True for hosts that mean local developer operation.
pub fn is_local_host(host: &str) -> bool {
    let hostname = strip_port(host);
    hostname == "localhost" || hostname == "127.0.0.1"
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((hostname, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            hostname
        }
        _ => host,
    }
}

/// Everything about the requester the write path needs, resolved once per
/// request and passed explicitly into each component.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request host as presented by the client
    pub host: String,

    /// Target locality slug taken from the host's subdomain
    pub subdomain: Option<String>,

    /// Client-held locality token (cookie value), slug-normalized. Purely
    /// advisory: the client asserted it, nothing proves it.
    pub claimed_locality: Option<String>,

    /// Local/developer operation: the write gate always allows
    pub dev_mode: bool,
}

impl RequestContext {
    /// Resolve a context from the request host and optional locality token.
    ///
    /// Localhost origins count as developer operation even when the
    /// configured flag is off.
    pub fn resolve(host: &str, token: Option<&str>, root_label: &str, dev_flag: bool) -> Self {
        let dev_mode = dev_flag || is_local_host(host);
        Self {
            host: host.to_string(),
            subdomain: if dev_mode {
                None
            } else {
                extract_subdomain(host, root_label)
            },
            claimed_locality: token.map(slugify).filter(|slug| !slug.is_empty()),
            dev_mode,
        }
    }
}
