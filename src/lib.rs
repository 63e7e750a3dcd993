//! # Render Proxy
//!
//! A server-side rendering proxy: fetches a page, fully executes its
//! client-side script in an isolated headless browser, and returns the
//! resulting HTML with `<script>` elements stripped.
//!
//! ## Security Guarantees
//!
//! - **Domain allowlist**: only hostnames in `ALLOWED_DOMAINS` can be
//!   rendered; an empty allowlist denies every request (fail-closed)
//! - **No query smuggling**: the target URL is truncated at the first `?` or
//!   `%3F`, so a second URL cannot ride in behind the query delimiter
//! - **Per-request isolation**: every render gets its own browser process,
//!   torn down when the visit settles, times out, or fails - no shared
//!   cookies, cache, or JS state between requests
//! - **Bounded rendering**: a hard max-wait ceiling on every visit
//! - **Neutralized beacons**: known third-party analytics sub-resources
//!   receive synthetic responses instead of real network fetches
//! - **Sanitized output**: no `<script>` element leaves the trust boundary
//!   (other execution vectors are a documented non-goal)

pub mod chromium;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod intercept;
pub mod sanitize;
pub mod server;
pub mod session;

pub use chromium::ChromiumLauncher;
pub use config::Config;
pub use engine::{EngineLauncher, EngineSettings, RenderEngine};
pub use error::RenderProxyError;
pub use gate::{authorize, AllowedDomainSet, AuthorizedUrl};
pub use intercept::{default_rules, InterceptRule};
pub use sanitize::{strip_script_tags, SanitizedDocument};
pub use server::{app, AppState};
pub use session::{RenderSession, RenderedDocument, SessionState};
