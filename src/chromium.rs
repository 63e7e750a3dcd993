//! Headless Chromium backend for the rendering engine, driven over CDP.
//!
//! Isolation model: every render session launches its own browser process
//! with its own profile, so sessions share no cookies, cache, or JS state.
//! That costs full engine startup per request and is a deliberate trade of
//! performance for isolation.
//!
//! Sub-resource interception uses the CDP Fetch domain: each paused request
//! is either fulfilled from an `InterceptRule`, aborted (stylesheets with CSS
//! loading disabled), or continued onto the network.

use crate::engine::{EngineLauncher, EngineSettings, RenderEngine};
use crate::intercept::{find_rule, InterceptRule};
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EventRequestPaused, FailRequestParams, FulfillRequestParams,
    HeaderEntry,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::Page;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Launches one throwaway Chromium process per session.
#[derive(Debug, Default)]
pub struct ChromiumLauncher;

#[async_trait]
impl EngineLauncher for ChromiumLauncher {
    async fn launch(
        &self,
        settings: &EngineSettings,
        rules: &[InterceptRule],
    ) -> Result<Box<dyn RenderEngine>> {
        let engine = ChromiumEngine::launch(settings, rules.to_vec()).await?;
        Ok(Box::new(engine))
    }
}

pub struct ChromiumEngine {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    intercept_task: JoinHandle<()>,
}

impl ChromiumEngine {
    async fn launch(settings: &EngineSettings, rules: Vec<InterceptRule>) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .enable_request_intercept()
            .disable_cache();
        if settings.debug {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // The handler pumps the CDP websocket; it must outlive the browser.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;

        // Interception must be listening before the real navigation starts,
        // or an early sub-resource fetch could slip through.
        let intercept_task =
            spawn_intercept_loop(page.clone(), rules, settings.load_css).await?;

        Ok(Self {
            browser,
            page,
            handler_task,
            intercept_task,
        })
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {} failed", url))?;
        Ok(())
    }

    async fn await_settle(&mut self, settle_delay: Duration) -> Result<()> {
        self.page
            .wait_for_navigation()
            .await
            .context("page never finished loading")?;
        // Quiescence window: let post-load script activity (XHR-driven DOM
        // updates, deferred rendering) finish before serialization.
        tokio::time::sleep(settle_delay).await;
        Ok(())
    }

    async fn serialize(&mut self) -> Result<String> {
        self.page
            .content()
            .await
            .context("failed to serialize document")
    }

    async fn release(mut self: Box<Self>) {
        self.intercept_task.abort();
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed, process will be reaped on drop");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

/// Listen for paused fetches and answer each one: synthetic fulfillment for
/// rule matches, abort for stylesheets when CSS is off, continue otherwise.
async fn spawn_intercept_loop(
    page: Page,
    rules: Vec<InterceptRule>,
    load_css: bool,
) -> Result<JoinHandle<()>> {
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("failed to attach fetch interceptor")?;

    Ok(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let url = event.request.url.as_str();

            if let Some(rule) = find_rule(&rules, url) {
                debug!(url, status = rule.status_code, "serving synthetic response");
                let headers: Vec<HeaderEntry> = rule
                    .headers
                    .iter()
                    .map(|(name, value)| HeaderEntry {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect();
                let fulfill = FulfillRequestParams::builder()
                    .request_id(event.request_id.clone())
                    .response_code(i64::from(rule.status_code))
                    .response_headers(headers)
                    .body(base64::engine::general_purpose::STANDARD.encode(rule.body.as_bytes()))
                    .build();
                match fulfill {
                    Ok(params) => {
                        if let Err(e) = page.execute(params).await {
                            debug!(url, error = %e, "fulfill failed");
                        }
                    }
                    Err(e) => debug!(url, error = %e, "bad fulfill params"),
                }
                continue;
            }

            if !load_css && event.resource_type == ResourceType::Stylesheet {
                debug!(url, "aborting stylesheet fetch (CSS loading disabled)");
                let fail = FailRequestParams::new(event.request_id.clone(), ErrorReason::Aborted);
                if let Err(e) = page.execute(fail).await {
                    debug!(url, error = %e, "abort failed");
                }
                continue;
            }

            let proceed = ContinueRequestParams::new(event.request_id.clone());
            if let Err(e) = page.execute(proceed).await {
                debug!(url, error = %e, "continue failed");
            }
        }
    }))
}
