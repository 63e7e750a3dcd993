//! Request-level error taxonomy.
//!
//! Every render request terminates in exactly one of four failure kinds (or
//! success). The first two are caller errors, the last two are server-side
//! rendering outcomes. None of them are retried.

use thiserror::Error;

/// Terminal failure kinds for a render request.
#[derive(Debug, Error)]
pub enum RenderProxyError {
    /// The supplied string is not a well-formed absolute URL with a host.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The URL's hostname is not in the allowed-domain set. Also covers the
    /// empty-allowlist case: no domains configured means every request denies.
    #[error("domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// The page did not settle within the configured max-wait ceiling.
    #[error("render timed out after {max_wait_ms}ms")]
    RenderTimeout { max_wait_ms: u64 },

    /// Navigation or engine-level failure (DNS, connection refused, engine
    /// crash). The cause is logged server-side and never sent to the caller.
    #[error("render failed: {0}")]
    RenderFailure(#[source] anyhow::Error),
}

impl RenderProxyError {
    /// True for caller errors (gate denials), false for rendering failures.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            RenderProxyError::InvalidUrl(_) | RenderProxyError::DomainNotAllowed(_)
        )
    }

    /// Stable machine-readable tag for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderProxyError::InvalidUrl(_) => "InvalidUrl",
            RenderProxyError::DomainNotAllowed(_) => "DomainNotAllowed",
            RenderProxyError::RenderTimeout { .. } => "RenderTimeout",
            RenderProxyError::RenderFailure(_) => "RenderFailure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_classification() {
        assert!(RenderProxyError::InvalidUrl("x".into()).is_denial());
        assert!(RenderProxyError::DomainNotAllowed("evil.com".into()).is_denial());
        assert!(!RenderProxyError::RenderTimeout { max_wait_ms: 20000 }.is_denial());
        assert!(!RenderProxyError::RenderFailure(anyhow::anyhow!("boom")).is_denial());
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(
            RenderProxyError::RenderTimeout { max_wait_ms: 1 }.kind(),
            "RenderTimeout"
        );
        assert_eq!(
            RenderProxyError::RenderFailure(anyhow::anyhow!("dns")).kind(),
            "RenderFailure"
        );
    }
}
