//! Strip `<script>` elements from rendered HTML before it crosses back out
//! of the trust boundary.
//!
//! The pages this proxy renders run arbitrary remote script during the visit;
//! the output must not carry that script downstream. Scope of the guarantee:
//! no complete `<script ...>...</script>` element survives, case-insensitive.
//! It does NOT cover other execution vectors (inline event-handler
//! attributes, `javascript:` URIs) - a documented limitation of this service,
//! not something to silently extend.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening `<script ...>` through the nearest closing `</script>`,
/// case-insensitive, with `.` spanning newlines. Non-greedy, so a body
/// containing stray `<` characters still ends at the first close tag.
static SCRIPT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>").expect("script-tag pattern must compile")
});

/// Final output of the pipeline: HTML with no `<script>` elements.
#[derive(Debug)]
pub struct SanitizedDocument(String);

impl SanitizedDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Remove every `<script>` element from an HTML string.
///
/// Applied to a fixpoint: removing an element can splice surrounding text
/// into a new `<script ...></script>` sequence (nested/overlapping markup),
/// so passes repeat until nothing matches. This also makes the function
/// idempotent by construction.
pub fn strip_script_tags(html: &str) -> SanitizedDocument {
    let mut current = html.to_string();
    loop {
        let stripped = SCRIPT_TAG.replace_all(&current, "");
        if stripped == current {
            return SanitizedDocument(current);
        }
        current = stripped.into_owned();
    }
}
