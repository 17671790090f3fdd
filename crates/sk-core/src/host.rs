//! Hostname helpers for site-binding keys
//!
//! These work directly on string slices, allocating only for the final
//! lowercased key.

// =============================================================================
// Domain Keys
// =============================================================================

/// Normalise a hostname into a site-binding key.
///
/// Lowercases, drops a port and a trailing dot. Returns `None` for an empty
/// host (`file:` and `about:` pages), which are never bound.
pub fn domain_key(hostname: &str) -> Option<String> {
    let host = hostname.trim();
    let host = match host.rfind(':') {
        // Bracketed IPv6 literals keep their colons
        Some(idx) if !host.starts_with('[') || host[..idx].ends_with(']') => &host[..idx],
        _ => host,
    };
    let host = host.strip_suffix('.').unwrap_or(host);

    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}
