//! HTTP surface: composes gate, session, and sanitizer into `GET /render`.
//!
//! Responses:
//! - `200` sanitized HTML when the page settles
//! - `403` `{"status":0,"message":"Please supply a valid url."}` on any gate
//!   denial (missing parameter, malformed URL, disallowed domain)
//! - `504`/`502` with a machine-readable failure kind on timeout / render
//!   failure; engine diagnostics stay in the server log, never in the body

use crate::engine::{EngineLauncher, EngineSettings};
use crate::error::RenderProxyError;
use crate::gate::{self, AllowedDomainSet};
use crate::intercept::InterceptRule;
use crate::sanitize::{strip_script_tags, SanitizedDocument};
use crate::session::RenderSession;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Read-only state shared by every request. Built once at startup; nothing
/// here is mutated afterwards, so no synchronization is needed.
pub struct AppState {
    pub allowed_domains: AllowedDomainSet,
    pub rules: Vec<InterceptRule>,
    pub settings: EngineSettings,
    pub launcher: Box<dyn EngineLauncher>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/render", get(render))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct RenderQuery {
    url: Option<String>,
}

async fn render(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RenderQuery>,
) -> Response {
    let raw_url = match query.url {
        Some(url) => url,
        None => return denial_response(),
    };

    match render_page(&state, &raw_url).await {
        Ok(doc) => {
            info!(url = %raw_url, bytes = doc.as_str().len(), "render ok");
            (
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                doc.into_inner(),
            )
                .into_response()
        }
        Err(e) if e.is_denial() => {
            info!(url = %raw_url, kind = e.kind(), "request denied");
            denial_response()
        }
        Err(e) => {
            // Full cause in the log only; the caller gets the kind tag and a
            // generic message.
            warn!(url = %raw_url, kind = e.kind(), error = %e, "render failed");
            failure_response(&e)
        }
    }
}

/// The whole pipeline for one request: authorize, render in a fresh session,
/// sanitize. No retries on any failure.
async fn render_page(
    state: &AppState,
    raw_url: &str,
) -> Result<SanitizedDocument, RenderProxyError> {
    let authorized = gate::authorize(raw_url, &state.allowed_domains)?;
    let session =
        RenderSession::start(state.launcher.as_ref(), state.settings.clone(), &state.rules).await?;
    let rendered = session.visit(&authorized).await?;
    Ok(strip_script_tags(rendered.as_str()))
}

fn denial_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "status": 0, "message": "Please supply a valid url." })),
    )
        .into_response()
}

fn failure_response(error: &RenderProxyError) -> Response {
    let (status, message) = match error {
        RenderProxyError::RenderTimeout { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, "Render timed out.")
        }
        _ => (StatusCode::BAD_GATEWAY, "Render failed."),
    };
    (
        status,
        Json(json!({ "status": 0, "kind": error.kind(), "message": message })),
    )
        .into_response()
}
