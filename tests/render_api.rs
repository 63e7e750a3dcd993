//! End-to-end tests for the `/render` pipeline: gate -> session -> sanitizer,
//! driven through the axum router with a scripted engine standing in for
//! Chromium.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use render_proxy::{
    app, default_rules, AllowedDomainSet, AppState, EngineLauncher, EngineSettings, InterceptRule,
    RenderEngine,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// What the scripted engine should do when visited.
#[derive(Clone)]
enum Script {
    /// Settle after a short delay and serialize to this HTML.
    Settle(&'static str),
    /// Never settle; the session's max-wait must fire.
    Hang,
    /// Fail at navigation.
    FailNavigation,
}

/// Recorded observations shared between the test and the launcher.
#[derive(Default)]
struct Observed {
    navigated_urls: Vec<String>,
    launch_rules: Vec<Vec<InterceptRule>>,
    releases: usize,
}

struct MockLauncher {
    script: Script,
    observed: Arc<Mutex<Observed>>,
}

impl MockLauncher {
    fn new(script: Script) -> (Self, Arc<Mutex<Observed>>) {
        let observed = Arc::new(Mutex::new(Observed::default()));
        (
            Self {
                script,
                observed: observed.clone(),
            },
            observed,
        )
    }
}

#[async_trait]
impl EngineLauncher for MockLauncher {
    async fn launch(
        &self,
        _settings: &EngineSettings,
        rules: &[InterceptRule],
    ) -> Result<Box<dyn RenderEngine>> {
        self.observed
            .lock()
            .unwrap()
            .launch_rules
            .push(rules.to_vec());
        Ok(Box::new(MockEngine {
            script: self.script.clone(),
            observed: self.observed.clone(),
        }))
    }
}

struct MockEngine {
    script: Script,
    observed: Arc<Mutex<Observed>>,
}

#[async_trait]
impl RenderEngine for MockEngine {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.observed
            .lock()
            .unwrap()
            .navigated_urls
            .push(url.to_string());
        if matches!(self.script, Script::FailNavigation) {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }

    async fn await_settle(&mut self, _settle_delay: Duration) -> Result<()> {
        match self.script {
            Script::Settle(_) => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(())
            }
            Script::Hang => std::future::pending().await,
            Script::FailNavigation => Ok(()),
        }
    }

    async fn serialize(&mut self) -> Result<String> {
        match self.script {
            Script::Settle(html) => Ok(html.to_string()),
            _ => Err(anyhow!("nothing to serialize")),
        }
    }

    async fn release(self: Box<Self>) {
        self.observed.lock().unwrap().releases += 1;
    }
}

fn test_app(script: Script, max_wait: Duration) -> (axum::Router, Arc<Mutex<Observed>>) {
    let (launcher, observed) = MockLauncher::new(script);
    let state = Arc::new(AppState {
        allowed_domains: AllowedDomainSet::from_iter(["example.com"]),
        rules: default_rules(),
        settings: EngineSettings {
            max_wait,
            settle_delay: Duration::from_millis(1),
            ..EngineSettings::default()
        },
        launcher: Box::new(launcher),
    });
    (app(state), observed)
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

const DENIAL_BODY: &str = r#"{"status":0,"message":"Please supply a valid url."}"#;

fn assert_denied(status: StatusCode, body: &str) {
    assert_eq!(status, StatusCode::FORBIDDEN);
    let got: Value = serde_json::from_str(body).unwrap();
    let want: Value = serde_json::from_str(DENIAL_BODY).unwrap();
    assert_eq!(got, want);
}

#[tokio::test]
async fn test_settled_render_returns_sanitized_html() {
    let (router, observed) = test_app(
        Script::Settle("<p>Hi</p><script>evil()</script>"),
        Duration::from_secs(20),
    );
    let (status, body) = get(router, "/render?url=http%3A%2F%2Fexample.com%2Fpage").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<p>Hi</p>");

    let observed = observed.lock().unwrap();
    assert_eq!(observed.navigated_urls, ["http://example.com/page"]);
    assert_eq!(observed.releases, 1);
}

#[tokio::test]
async fn test_disallowed_domain_is_403_with_exact_body() {
    let (router, observed) = test_app(Script::Settle("<p>x</p>"), Duration::from_secs(20));
    let (status, body) = get(router, "/render?url=http%3A%2F%2Fevil.com%2Fpage").await;

    assert_denied(status, &body);
    // Denied before any engine activity.
    assert!(observed.lock().unwrap().launch_rules.is_empty());
}

#[tokio::test]
async fn test_missing_url_parameter_is_denied() {
    let (router, _) = test_app(Script::Settle("<p>x</p>"), Duration::from_secs(20));
    let (status, body) = get(router, "/render").await;
    assert_denied(status, &body);
}

#[tokio::test]
async fn test_malformed_url_is_denied_before_engine_activity() {
    let (router, observed) = test_app(Script::Settle("<p>x</p>"), Duration::from_secs(20));
    let (status, body) = get(router, "/render?url=not%20a%20url").await;

    assert_denied(status, &body);
    assert!(observed.lock().unwrap().launch_rules.is_empty());
}

#[tokio::test]
async fn test_timeout_is_504_tagged_render_timeout_with_no_html() {
    let (router, observed) = test_app(Script::Hang, Duration::from_millis(50));
    let (status, body) = get(router, "/render?url=http%3A%2F%2Fexample.com%2Fslow").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["kind"], json!("RenderTimeout"));
    assert_eq!(json["status"], json!(0));
    assert!(!body.contains('<'), "no markup may leak on timeout");

    // The hung engine was still torn down.
    assert_eq!(observed.lock().unwrap().releases, 1);
}

#[tokio::test]
async fn test_navigation_failure_is_502_tagged_render_failure() {
    let (router, observed) = test_app(Script::FailNavigation, Duration::from_secs(20));
    let (status, body) = get(router, "/render?url=http%3A%2F%2Fexample.com%2Fdown").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["kind"], json!("RenderFailure"));
    // Internal diagnostics must not reach the caller.
    assert!(!body.contains("connection refused"));

    assert_eq!(observed.lock().unwrap().releases, 1);
}

#[tokio::test]
async fn test_query_string_never_reaches_the_engine() {
    let (router, observed) = test_app(Script::Settle("<p>ok</p>"), Duration::from_secs(20));
    // Decodes to http://example.com/page?injected=http://evil.com
    let (status, _) = get(
        router,
        "/render?url=http%3A%2F%2Fexample.com%2Fpage%3Finjected%3Dhttp%3A%2F%2Fevil.com",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        observed.lock().unwrap().navigated_urls,
        ["http://example.com/page"]
    );
}

#[tokio::test]
async fn test_encoded_query_delimiter_is_stripped_too() {
    let (router, observed) = test_app(Script::Settle("<p>ok</p>"), Duration::from_secs(20));
    // Decodes to http://example.com/page%3Fhttp://evil.com
    let (status, _) = get(
        router,
        "/render?url=http%3A%2F%2Fexample.com%2Fpage%253Fhttp%3A%2F%2Fevil.com",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        observed.lock().unwrap().navigated_urls,
        ["http://example.com/page"]
    );
}

#[tokio::test]
async fn test_every_session_gets_the_intercept_rules() {
    let (router, observed) = test_app(Script::Settle("<p>ok</p>"), Duration::from_secs(20));
    let (status, _) = get(router, "/render?url=http%3A%2F%2Fexample.com%2F").await;
    assert_eq!(status, StatusCode::OK);

    let observed = observed.lock().unwrap();
    assert_eq!(observed.launch_rules.len(), 1);
    let rule = observed.launch_rules[0]
        .iter()
        .find(|r| r.matches("http://www.google-analytics.com/analytics.js"))
        .expect("analytics rule must be installed on the session");
    assert_eq!(rule.status_code, 200);
    assert!(rule.body.is_empty());
}

#[tokio::test]
async fn test_health_endpoint() {
    let (router, _) = test_app(Script::Settle(""), Duration::from_secs(20));
    let (status, _) = get(router, "/health").await;
    assert_eq!(status, StatusCode::OK);
}
