//! Synthetic responses for known third-party sub-resources.
//!
//! Rendering a page must neither depend on, nor leak data to, external
//! non-content services. Each rule substitutes a fabricated response for one
//! exact sub-resource URL; the engine never performs the real fetch.

use std::collections::BTreeMap;

/// One interception rule: an exact sub-resource URL mapped to the synthetic
/// response the engine will receive in place of a network fetch.
#[derive(Debug, Clone)]
pub struct InterceptRule {
    pub match_url: String,
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl InterceptRule {
    /// A 200 response with the given content type and an empty body. This is
    /// the shape every analytics/beacon neutralization takes.
    pub fn empty_ok(match_url: impl Into<String>, content_type: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            match_url: match_url.into(),
            status_code: 200,
            headers,
            body: String::new(),
        }
    }

    /// Exact-match test against the URL of an attempted sub-resource fetch.
    pub fn matches(&self, url: &str) -> bool {
        self.match_url == url
    }
}

/// Find the first rule matching an attempted fetch, in registration order.
pub fn find_rule<'a>(rules: &'a [InterceptRule], url: &str) -> Option<&'a InterceptRule> {
    rules.iter().find(|rule| rule.matches(url))
}

/// The static rule set installed on every render session.
///
/// Currently only Google Analytics: pages embedding analytics.js would
/// otherwise stall on (or beacon out to) a service that contributes nothing
/// to the rendered content.
pub fn default_rules() -> Vec<InterceptRule> {
    vec![InterceptRule::empty_ok(
        "http://www.google-analytics.com/analytics.js",
        "application/javascript",
    )]
}
