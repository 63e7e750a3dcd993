//! URL gate: validation plus an SSRF-preventing domain allowlist.
//!
//! Security model:
//! - Only well-formed absolute URLs with an authority pass validation
//! - The hostname must be an exact member of the allowlist
//! - An empty allowlist denies every request (fail-closed, never fail-open)
//! - The authorized URL is truncated at the first `?` / `%3F` so a caller
//!   cannot smuggle a second, unvalidated URL in after the query delimiter

use crate::error::RenderProxyError;
use std::collections::HashSet;
use url::Url;

/// The set of hostnames permitted as render targets.
///
/// Built once at startup and shared read-only with every request; there is no
/// runtime mutation path.
#[derive(Debug, Clone, Default)]
pub struct AllowedDomainSet {
    hostnames: HashSet<String>,
}

impl AllowedDomainSet {
    /// Parse a comma-separated hostname list (the `ALLOWED_DOMAINS` format).
    /// Whitespace around entries is trimmed; empty entries are skipped.
    pub fn from_csv(csv: &str) -> Self {
        Self {
            hostnames: csv
                .split(',')
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, hostname: &str) -> bool {
        self.hostnames.contains(&hostname.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.hostnames.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowedDomainSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            hostnames: iter
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }
}

/// A URL that passed the gate. The inner string is exactly what the rendering
/// engine will be asked to navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedUrl(String);

impl AuthorizedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthorizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate and authorize a raw URL against the allowlist.
///
/// Pure function of its input and the allowlist; performs no I/O. On success
/// the returned URL has everything from the first `?` (or its percent-encoded
/// form `%3F`) onward stripped. Legitimate query strings on the target are
/// therefore dropped as well; that is accepted, documented behavior of this
/// service, not something to quietly change.
pub fn authorize(
    raw_url: &str,
    allowlist: &AllowedDomainSet,
) -> Result<AuthorizedUrl, RenderProxyError> {
    let parsed =
        Url::parse(raw_url).map_err(|_| RenderProxyError::InvalidUrl(raw_url.to_string()))?;

    // Scheme-only URLs (mailto:, data:) have no authority and cannot name an
    // allowed host.
    let hostname = match parsed.host_str() {
        Some(h) if !h.is_empty() => h,
        _ => return Err(RenderProxyError::InvalidUrl(raw_url.to_string())),
    };

    if allowlist.is_empty() || !allowlist.contains(hostname) {
        return Err(RenderProxyError::DomainNotAllowed(hostname.to_string()));
    }

    Ok(AuthorizedUrl(truncate_at_query(raw_url).to_string()))
}

/// Cut the URL at the first literal `?`, then at the first `%3F`.
///
/// Mirrors the original split order; `%3f` lowercase is deliberately left
/// alone to keep the observable behavior exact.
fn truncate_at_query(raw: &str) -> &str {
    let head = raw.split('?').next().unwrap_or(raw);
    match head.find("%3F") {
        Some(idx) => &head[..idx],
        None => head,
    }
}
