//! Headless page rendering for JS-populated Letterboxd pages.
//!
//! The favourites grid is assembled client-side, so a plain HTTP fetch
//! returns an empty shell. Each render launches an isolated browser with
//! automation fingerprints suppressed, waits for the page to become ready,
//! and returns the fully rendered markup.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

use crate::config::ScraperConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

// Served to the page before any site script runs, so the site sees the same
// navigator as a regular browser.
const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

#[derive(Error, Debug)]
pub enum RenderError {
    /// The page never became ready within the wait budget.
    #[error("page never became ready: {0}")]
    Timeout(String),

    /// Browser launch, navigation, or protocol failure.
    #[error("browser error: {0}")]
    Browser(String),
}

/// Renders a URL to HTML, blocking until the given selector is present.
///
/// Capability interface so handlers and tests can substitute the rendering
/// engine behind the same contract.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(
        &self,
        url: &str,
        wait_selector: &str,
        timeout: Duration,
    ) -> Result<String, RenderError>;
}

/// [`PageRenderer`] backed by a headless Chromium instance per call.
///
/// One browser per render: the underlying session holds mutable page state,
/// so concurrent scrapes each get their own process rather than sharing one.
pub struct ChromeRenderer {
    config: ScraperConfig,
}

impl ChromeRenderer {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RenderError> {
        // Default args include --enable-automation, which Letterboxd's CDN
        // fingerprints; disable them and pass our own set.
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .disable_default_args()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .arg("--hide-scrollbars");

        if let Some(ref chrome_path) = self.config.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        builder.build().map_err(RenderError::Browser)
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(
        &self,
        url: &str,
        wait_selector: &str,
        timeout: Duration,
    ) -> Result<String, RenderError> {
        let browser_config = self.browser_config()?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Browser(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser handler error");
                }
            }
        });

        let quiescence = Duration::from_millis(self.config.quiescence_ms);
        let result = render_page(&browser, url, wait_selector, timeout, quiescence).await;

        // Tear the browser down on every exit path so no process leaks
        if let Err(e) = browser.close().await {
            tracing::debug!(error = %e, "Failed to close browser");
        }
        let _ = handler_task.await;

        result
    }
}

async fn render_page(
    browser: &Browser,
    url: &str,
    wait_selector: &str,
    timeout: Duration,
    quiescence: Duration,
) -> Result<String, RenderError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(browser_err)?;

    let hide_webdriver = AddScriptToEvaluateOnNewDocumentParams::builder()
        .source(HIDE_WEBDRIVER_SCRIPT)
        .build()
        .map_err(RenderError::Browser)?;
    page.execute(hide_webdriver).await.map_err(browser_err)?;

    tracing::debug!(url, "Rendering page");

    tokio::time::timeout(timeout, page.goto(url))
        .await
        .map_err(|_| RenderError::Timeout(format!("navigation to {url}")))?
        .map_err(browser_err)?;

    tokio::time::timeout(timeout, wait_for_ready_state(&page))
        .await
        .map_err(|_| RenderError::Timeout("document readyState never reached complete".into()))??;

    tokio::time::timeout(timeout, wait_for_element(&page, wait_selector))
        .await
        .map_err(|_| RenderError::Timeout(format!("element '{wait_selector}' never appeared")))??;

    // Grace period for late lazy-loaded assets
    tokio::time::sleep(quiescence).await;

    page.content().await.map_err(browser_err)
}

async fn wait_for_ready_state(page: &Page) -> Result<(), RenderError> {
    loop {
        let ready_state: String = page
            .evaluate("document.readyState")
            .await
            .map_err(browser_err)?
            .into_value()
            .unwrap_or_default();

        if ready_state == "complete" {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn wait_for_element(page: &Page, selector: &str) -> Result<(), RenderError> {
    loop {
        if page.find_element(selector).await.is_ok() {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn browser_err(e: chromiumoxide::error::CdpError) -> RenderError {
    RenderError::Browser(e.to_string())
}
