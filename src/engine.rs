//! The rendering engine, seen through a narrow interface.
//!
//! The engine is an external capability: the session only ever asks it to
//! navigate, wait for the page to settle, serialize the DOM, and release.
//! The production backend is headless Chromium (see `chromium`); tests
//! substitute mock implementations.

use crate::intercept::InterceptRule;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Engine construction parameters, fixed at startup and shared by every
/// session. Script execution is always enabled - executing the page's client
/// side is the entire point of this proxy - so there is no knob for it.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Run the engine with extra diagnostics (and, for Chromium, a visible
    /// window) for local debugging.
    pub debug: bool,
    /// Hard ceiling on a whole visit, navigation through serialization.
    pub max_wait: Duration,
    /// Quiescence window after load before the page counts as settled.
    pub settle_delay: Duration,
    /// Whether stylesheet sub-resources are fetched at all.
    pub load_css: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debug: false,
            max_wait: Duration::from_millis(20_000),
            settle_delay: Duration::from_millis(3_000),
            load_css: false,
        }
    }
}

/// One live engine instance, exclusively owned by a single render session.
///
/// Implementations must not share cookie jars, caches, or JS global state
/// across instances.
#[async_trait]
pub trait RenderEngine: Send {
    /// Begin loading the target URL.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Resolve once load and script activity have been quiet for
    /// `settle_delay`. Callers bound the total wait separately.
    async fn await_settle(&mut self, settle_delay: Duration) -> Result<()>;

    /// Serialize the current DOM to an HTML string.
    async fn serialize(&mut self) -> Result<String>;

    /// Tear the instance down. Infallible from the caller's perspective;
    /// implementations log their own cleanup failures.
    async fn release(self: Box<Self>);
}

/// Launches one fresh engine instance per render session, with the intercept
/// rules installed before any fetch can occur.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(
        &self,
        settings: &EngineSettings,
        rules: &[InterceptRule],
    ) -> Result<Box<dyn RenderEngine>>;
}
