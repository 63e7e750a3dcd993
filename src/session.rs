//! Render session lifecycle: one engine instance, one visit, one outcome.
//!
//! State machine: `Created -> Visiting -> Settled | TimedOut | VisitFailed`.
//! The engine instance is released on every transition into a terminal
//! state - the single teardown point below runs whether the visit settled,
//! errored, or was cancelled by the max-wait ceiling.

use crate::engine::{EngineLauncher, EngineSettings, RenderEngine};
use crate::error::RenderProxyError;
use crate::gate::AuthorizedUrl;
use crate::intercept::InterceptRule;
use tracing::debug;

/// The serialized HTML of a settled page. Exists only between session
/// completion and sanitization.
#[derive(Debug)]
pub struct RenderedDocument(String);

impl RenderedDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Session states. The last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Visiting,
    Settled,
    TimedOut,
    VisitFailed,
}

/// Owns exactly one rendering-engine instance for the lifetime of a single
/// request. Never pooled, never reused: each request pays full engine startup
/// in exchange for strong cross-request isolation.
pub struct RenderSession {
    engine: Box<dyn RenderEngine>,
    settings: EngineSettings,
}

impl RenderSession {
    /// Launch a fresh engine with the intercept rules installed. Launch
    /// failure is a `RenderFailure`; there is no engine to release yet.
    pub async fn start(
        launcher: &dyn EngineLauncher,
        settings: EngineSettings,
        rules: &[InterceptRule],
    ) -> Result<Self, RenderProxyError> {
        let engine = launcher
            .launch(&settings, rules)
            .await
            .map_err(RenderProxyError::RenderFailure)?;
        debug!(state = ?SessionState::Created, "render session created");
        Ok(Self { engine, settings })
    }

    /// Drive the visit to a terminal state. Consumes the session; the engine
    /// is released before this returns, on every path.
    pub async fn visit(self, url: &AuthorizedUrl) -> Result<RenderedDocument, RenderProxyError> {
        let Self {
            mut engine,
            settings,
        } = self;

        debug!(state = ?SessionState::Visiting, %url, "visiting");
        let visit = async {
            engine.navigate(url.as_str()).await?;
            engine.await_settle(settings.settle_delay).await?;
            engine.serialize().await
        };
        let outcome = tokio::time::timeout(settings.max_wait, visit).await;

        // Single teardown point. On timeout the visit future has already been
        // dropped, cancelling any in-flight engine call, and the instance is
        // still released here.
        engine.release().await;

        match outcome {
            Ok(Ok(html)) => {
                debug!(state = ?SessionState::Settled, bytes = html.len(), "page settled");
                Ok(RenderedDocument(html))
            }
            Ok(Err(cause)) => {
                debug!(state = ?SessionState::VisitFailed, error = %cause, "visit failed");
                Err(RenderProxyError::RenderFailure(cause))
            }
            Err(_elapsed) => {
                debug!(state = ?SessionState::TimedOut, "max wait exceeded");
                Err(RenderProxyError::RenderTimeout {
                    max_wait_ms: settings.max_wait.as_millis() as u64,
                })
            }
        }
    }
}
